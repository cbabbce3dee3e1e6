//! Access token data and the rotation chain.

use serde_json::Value;
use time::{Duration, OffsetDateTime};

use super::authorize::AuthorizeData;
use super::client::Client;

/// An issued access token with its links into the grant lineage.
///
/// A token may be chained to the authorization code that produced it
/// (`authorize_data`), to the token it rotated away from (`previous`), and to
/// the refresh token that can mint a successor (`refresh_token`). All three
/// links are optional: a token minted via refresh has no authorization code,
/// and a first-issue token has no predecessor.
///
/// Rows are never updated in place. Rotation saves a new token whose
/// `previous` points at the old one; the old row is removed by its own
/// lifecycle event, and a dangling `previous` pointer simply loads as `None`.
#[derive(Debug, Clone)]
pub struct AccessData {
    /// The access token value. Globally unique.
    pub access_token: String,

    /// The client the token was issued to.
    pub client: Client,

    /// The authorization code this token was exchanged from, if any.
    pub authorize_data: Option<AuthorizeData>,

    /// The token this one rotated away from, if any.
    pub previous: Option<Box<AccessData>>,

    /// Refresh token authorized to mint a successor, if any.
    pub refresh_token: Option<String>,

    /// Lifetime in seconds, counted from `created_at`.
    pub expires_in: i32,

    /// Granted scope.
    pub scope: String,

    /// Redirect URI the token was bound to.
    pub redirect_uri: String,

    /// When the token was issued.
    pub created_at: OffsetDateTime,

    /// Opaque user context, a string-keyed mapping.
    pub user_data: Value,

    /// Reserved for future revocation marking.
    pub frozen: bool,
}

impl AccessData {
    /// The instant this token expires.
    #[must_use]
    pub fn expire_at(&self) -> OffsetDateTime {
        self.created_at + Duration::seconds(i64::from(self.expires_in))
    }

    /// Whether the computed expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expire_at() <= OffsetDateTime::now_utc()
    }

    /// The `previous` pointer value captured at save time, if any.
    #[must_use]
    pub fn previous_token(&self) -> Option<&str> {
        self.previous.as_deref().map(|prev| prev.access_token.as_str())
    }

    /// The authorization code this token was exchanged from, if any.
    #[must_use]
    pub fn authorize_code(&self) -> Option<&str> {
        self.authorize_data.as_ref().map(|auth| auth.code.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(token: &str) -> AccessData {
        AccessData {
            access_token: token.into(),
            client: Client::new("c1", "s", "http://localhost/"),
            authorize_data: None,
            previous: None,
            refresh_token: None,
            expires_in: 3600,
            scope: "basic".into(),
            redirect_uri: "http://localhost/".into(),
            created_at: OffsetDateTime::now_utc(),
            user_data: json!({}),
            frozen: false,
        }
    }

    #[test]
    fn test_link_accessors() {
        let mut access = sample("at2");
        assert_eq!(access.previous_token(), None);
        assert_eq!(access.authorize_code(), None);

        access.previous = Some(Box::new(sample("at1")));
        assert_eq!(access.previous_token(), Some("at1"));
    }

    #[test]
    fn test_expiry_window() {
        let mut access = sample("at1");
        assert!(!access.is_expired());

        access.created_at = OffsetDateTime::now_utc() - Duration::seconds(7200);
        assert!(access.is_expired());
    }
}
