//! OAuth 2.0 client registration types.
//!
//! A `Client` is a registered application identity: a caller-assigned id, a
//! secret, a redirect URI and a metadata blob. The metadata travels as a
//! single JSONB column in storage, so it is kept in its own serializable
//! struct.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{StoreError, StoreResult};

// =============================================================================
// Client Meta
// =============================================================================

/// Client metadata blob: display name plus the grant/response types and
/// scopes the client is allowed to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientMeta {
    /// Human-readable display name.
    pub name: String,

    /// OAuth 2.0 grant types this client may use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grant_types: Vec<String>,

    /// OAuth 2.0 response types this client may use.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub response_types: Vec<String>,

    /// Scopes this client may request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scopes: Vec<String>,
}

impl Default for ClientMeta {
    /// Conventional defaults for a freshly registered client.
    fn default() -> Self {
        Self {
            name: String::new(),
            grant_types: vec![
                "authorization_code".into(),
                "password".into(),
                "refresh_token".into(),
            ],
            response_types: Vec::new(),
            scopes: vec!["basic".into()],
        }
    }
}

// =============================================================================
// Client
// =============================================================================

/// OAuth 2.0 client registration.
///
/// Identity is the caller-assigned `id`; `id` and `created_at` are immutable
/// after creation, everything else is updated by upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    /// Unique client identifier used in OAuth flows.
    pub id: String,

    /// Client secret.
    pub secret: String,

    /// Registered redirect URI.
    pub redirect_uri: String,

    /// Metadata blob (name, allowed grant/response types, scopes).
    #[serde(default)]
    pub meta: ClientMeta,

    /// When the client was registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl Client {
    /// Build a client with default metadata, created now.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        secret: impl Into<String>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            secret: secret.into(),
            redirect_uri: redirect_uri.into(),
            meta: ClientMeta::default(),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    /// Validates the registration before it is written.
    ///
    /// # Errors
    ///
    /// Returns an error if a required field is empty.
    pub fn validate(&self) -> Result<(), ClientValidationError> {
        if self.id.is_empty() {
            return Err(ClientValidationError::EmptyId);
        }
        if self.secret.is_empty() {
            return Err(ClientValidationError::EmptySecret);
        }
        if self.redirect_uri.is_empty() {
            return Err(ClientValidationError::EmptyRedirectUri);
        }
        Ok(())
    }
}

/// Reasons a client registration fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ClientValidationError {
    /// The client id is empty.
    #[error("client id is empty")]
    EmptyId,

    /// The client secret is empty.
    #[error("client secret is empty")]
    EmptySecret,

    /// The redirect URI is empty.
    #[error("client redirect URI is empty")]
    EmptyRedirectUri,
}

impl From<ClientValidationError> for StoreError {
    fn from(err: ClientValidationError) -> Self {
        StoreError::value(err.to_string())
    }
}

// =============================================================================
// Client Filter
// =============================================================================

/// Default page size for client listings.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Hard cap on the page size.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Hard cap on the computed row offset.
pub const MAX_LIST_OFFSET: u64 = 1_000_000;

/// Pagination filter for client listings.
///
/// A zero `limit` means "use the default page size"; a zero `page` means the
/// first page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientFilter {
    /// 1-based page number.
    #[serde(default)]
    pub page: u32,

    /// Page size.
    #[serde(default)]
    pub limit: u32,
}

impl ClientFilter {
    /// Resolve the filter into SQL `LIMIT`/`OFFSET` values.
    ///
    /// # Errors
    ///
    /// Returns a `Value` error if the limit exceeds [`MAX_LIST_LIMIT`] or the
    /// computed offset exceeds [`MAX_LIST_OFFSET`]; nothing has been queried
    /// at that point.
    pub fn limit_offset(&self) -> StoreResult<(i64, i64)> {
        let limit = if self.limit == 0 {
            DEFAULT_LIST_LIMIT
        } else if self.limit > MAX_LIST_LIMIT {
            return Err(StoreError::value(format!(
                "limit={} is bigger than {MAX_LIST_LIMIT}",
                self.limit
            )));
        } else {
            self.limit
        };

        let offset = u64::from(self.page.saturating_sub(1)) * u64::from(limit);
        if offset > MAX_LIST_OFFSET {
            return Err(StoreError::value(format!(
                "offset={offset} can't be bigger than {MAX_LIST_OFFSET}"
            )));
        }

        Ok((i64::from(limit), offset as i64))
    }
}

// =============================================================================
// Tests
// =============================================================================
