//! Authorization-code grant data.

use serde_json::Value;
use time::{Duration, OffsetDateTime};

use super::client::Client;

/// A single-use authorization code and the context it was granted in.
///
/// Created at the authorization grant, deleted on exchange (or explicit
/// revocation). Expiry is computed from `created_at + expires_in`; storage
/// never persists an absolute expiry instant.
#[derive(Debug, Clone)]
pub struct AuthorizeData {
    /// The caller-assigned authorization code. Globally unique.
    pub code: String,

    /// The client the code was issued to.
    pub client: Client,

    /// Lifetime in seconds, counted from `created_at`.
    pub expires_in: i32,

    /// Requested scope.
    pub scope: String,

    /// Redirect URI the grant was bound to.
    pub redirect_uri: String,

    /// Opaque state value carried through the flow.
    pub state: String,

    /// When the code was created.
    pub created_at: OffsetDateTime,

    /// Opaque user context, a string-keyed mapping.
    pub user_data: Value,
}

impl AuthorizeData {
    /// The instant this code expires.
    #[must_use]
    pub fn expire_at(&self) -> OffsetDateTime {
        self.created_at + Duration::seconds(i64::from(self.expires_in))
    }

    /// Whether the computed expiry has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expire_at() <= OffsetDateTime::now_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample(created_at: OffsetDateTime, expires_in: i32) -> AuthorizeData {
        AuthorizeData {
            code: "ac1".into(),
            client: Client::new("c1", "s", "http://localhost/"),
            expires_in,
            scope: "basic".into(),
            redirect_uri: "http://localhost/".into(),
            state: "state".into(),
            created_at,
            user_data: json!({}),
        }
    }

    #[test]
    fn test_expire_at_is_computed() {
        let created = OffsetDateTime::now_utc();
        let data = sample(created, 600);
        assert_eq!(data.expire_at(), created + Duration::seconds(600));
        assert!(!data.is_expired());
    }

    #[test]
    fn test_expired_in_the_past() {
        let created = OffsetDateTime::now_utc() - Duration::seconds(120);
        let data = sample(created, 60);
        assert!(data.is_expired());
    }
}
