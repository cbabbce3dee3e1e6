//! Authorization code storage.
//!
//! Codes are written once at the authorization grant and deleted on
//! exchange. Loading a code re-attaches the owning client and rejects
//! expired codes with a distinct error so the caller can tell a consumed
//! code from a stale one.

use serde_json::Value;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use time::OffsetDateTime;
use tracing::debug;

use authstore::types::{AuthorizeData, user_data};
use authstore::{StoreError, StoreResult};

use crate::client::ClientStore;
use crate::{PgPool, db_error, token_prefix};

/// Authorize record as scanned from the database, minus the code itself.
type AuthorizeRow = (String, Value, String, i32, String, String, OffsetDateTime);

// =============================================================================
// Authorize Store
// =============================================================================

/// Authorization code operations over a shared pool.
pub struct AuthorizeStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AuthorizeStore<'a> {
    /// Create a new authorize store with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an authorization code.
    ///
    /// The insert fails on a duplicate code; codes are never updated in
    /// place.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserData` if the user data is neither null nor an
    /// object, or a database error.
    pub async fn save(&self, data: &AuthorizeData) -> StoreResult<()> {
        let extra = user_data::normalize(&data.user_data)?;

        query(
            r#"
            INSERT INTO oauth_authorize
                (client_id, code, expires_in, scopes, redirect_uri, state, created, extra)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&data.client.id)
        .bind(&data.code)
        .bind(data.expires_in)
        .bind(&data.scope)
        .bind(&data.redirect_uri)
        .bind(&data.state)
        .bind(data.created_at)
        .bind(&extra)
        .execute(self.pool)
        .await
        .map_err(|e| db_error("save authorize", token_prefix(&data.code), e))?;

        debug!(code = %token_prefix(&data.code), client_id = %data.client.id, "saved authorize data");
        Ok(())
    }

    /// Load an authorization code with its client attached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown code, `Expired` for a code past its
    /// computed expiry, or a database error. A missing client row surfaces
    /// as `NotFound` from the client lookup.
    pub async fn load(&self, code: &str) -> StoreResult<AuthorizeData> {
        let row: Option<AuthorizeRow> = query_as(
            r#"
            SELECT client_id, extra, redirect_uri, expires_in, scopes, state, created
            FROM oauth_authorize
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| db_error("load authorize", token_prefix(code), e))?;

        let Some((client_id, extra, redirect_uri, expires_in, scope, state, created_at)) = row
        else {
            return Err(StoreError::not_found(format!(
                "authorize code {}",
                token_prefix(code)
            )));
        };

        let client = ClientStore::new(self.pool).get(&client_id).await?;
        let data = AuthorizeData {
            code: code.to_owned(),
            client,
            expires_in,
            scope,
            redirect_uri,
            state,
            created_at,
            user_data: extra,
        };

        if data.is_expired() {
            debug!(code = %token_prefix(code), expire_at = %data.expire_at(), "authorize code expired");
            return Err(StoreError::expired(data.expire_at()));
        }
        Ok(data)
    }

    /// Delete an authorization code. Idempotent, and an empty code is a
    /// no-op rather than an error.
    pub async fn remove(&self, code: &str) -> StoreResult<()> {
        if code.is_empty() {
            return Ok(());
        }
        query("DELETE FROM oauth_authorize WHERE code = $1")
            .bind(code)
            .execute(self.pool)
            .await
            .map_err(|e| db_error("remove authorize", token_prefix(code), e))?;
        debug!(code = %token_prefix(code), "removed authorize data");
        Ok(())
    }
}
