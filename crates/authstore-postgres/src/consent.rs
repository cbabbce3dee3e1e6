//! Per-user per-client consent records.
//!
//! Tracks which users have approved which clients, so a returning user can
//! skip the consent screen. The lookup is advisory: on a query failure it
//! degrades to "not authorized" with a warning instead of failing the flow.

use sqlx_core::query::query;
use sqlx_core::query_scalar::query_scalar;
use tracing::{debug, warn};

use authstore::StoreResult;

use crate::{PgPool, db_error};

// =============================================================================
// Consent Store
// =============================================================================

/// Consent record operations over a shared pool.
pub struct ConsentStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ConsentStore<'a> {
    /// Create a new consent store with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Whether `username` has previously authorized `client_id`.
    ///
    /// Never fails the caller: a lookup error is logged and reported as
    /// `false`, which at worst re-prompts the user for consent.
    pub async fn is_authorized(&self, client_id: &str, username: &str) -> StoreResult<bool> {
        let found = query_scalar::<_, i32>(
            r#"
            SELECT 1 FROM oauth_client_user_authorized
            WHERE client_id = $1 AND username = $2
            "#,
        )
        .bind(client_id)
        .bind(username)
        .fetch_optional(self.pool)
        .await;

        match found {
            Ok(row) => Ok(row.is_some()),
            Err(err) => {
                warn!(client_id = %client_id, username = %username, error = %err,
                    "consent lookup failed, treating as not authorized");
                Ok(false)
            }
        }
    }

    /// Record that `username` authorized `client_id`. Idempotent; repeated
    /// grants keep the original timestamp.
    pub async fn save_authorized(&self, client_id: &str, username: &str) -> StoreResult<()> {
        query(
            r#"
            INSERT INTO oauth_client_user_authorized (client_id, username)
            VALUES ($1, $2)
            ON CONFLICT (client_id, username) DO NOTHING
            "#,
        )
        .bind(client_id)
        .bind(username)
        .execute(self.pool)
        .await
        .map_err(|e| db_error("save consent", client_id, e))?;

        debug!(client_id = %client_id, username = %username, "saved consent");
        Ok(())
    }
}
