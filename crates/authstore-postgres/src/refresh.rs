//! Refresh token index.
//!
//! A refresh token is a pointer from a long-lived secret to the access
//! token it can rotate. The index is written inside the access-save
//! transaction as a true upsert, so re-issuing a refresh token re-points it
//! atomically with the new access row.

use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use sqlx_postgres::PgTransaction;
use tracing::debug;

use authstore::types::AccessData;
use authstore::{StoreError, StoreResult};

use crate::access::AccessStore;
use crate::{PgPool, db_error, token_prefix};

// =============================================================================
// Refresh Store
// =============================================================================

/// Refresh token index operations over a shared pool.
pub struct RefreshStore<'a> {
    pool: &'a PgPool,
}

impl<'a> RefreshStore<'a> {
    /// Create a new refresh store with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Point `token` at `access_token`, inserting or re-pointing in place.
    ///
    /// Runs inside the caller's access-save transaction so the index entry
    /// and the access row commit together.
    pub(crate) async fn upsert(
        tx: &mut PgTransaction<'static>,
        token: &str,
        access_token: &str,
    ) -> StoreResult<()> {
        query(
            r#"
            INSERT INTO oauth_refresh (token, access)
            VALUES ($1, $2)
            ON CONFLICT (token) DO UPDATE SET access = EXCLUDED.access
            "#,
        )
        .bind(token)
        .bind(access_token)
        .execute(&mut **tx)
        .await
        .map_err(|e| db_error("save refresh", token_prefix(token), e))?;

        debug!(
            refresh = %token_prefix(token),
            access = %token_prefix(access_token),
            "saved refresh token"
        );
        Ok(())
    }

    /// Resolve a refresh token to the access token value it points at.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown refresh token, or a database error.
    pub async fn resolve(&self, token: &str) -> StoreResult<String> {
        let access: Option<String> =
            query_scalar::<_, String>("SELECT access FROM oauth_refresh WHERE token = $1")
                .bind(token)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| db_error("load refresh", token_prefix(token), e))?;

        access.ok_or_else(|| StoreError::not_found(format!("refresh token {}", token_prefix(token))))
    }

    /// Load the access token a refresh token points at, lineage and all.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if either the refresh token or the access token it
    /// points at is gone, or a database error.
    pub async fn load(&self, token: &str) -> StoreResult<AccessData> {
        let access_token = self.resolve(token).await?;
        AccessStore::new(self.pool).load(&access_token).await
    }

    /// Delete a refresh index entry. Idempotent; the access row it pointed
    /// at is untouched.
    pub async fn remove(&self, token: &str) -> StoreResult<()> {
        query("DELETE FROM oauth_refresh WHERE token = $1")
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| db_error("remove refresh", token_prefix(token), e))?;
        debug!(refresh = %token_prefix(token), "removed refresh token");
        Ok(())
    }
}
