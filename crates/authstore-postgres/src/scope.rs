//! Scope catalog.

use sqlx_core::query_as::query_as;

use authstore::StoreResult;
use authstore::types::Scope;

use crate::{PgPool, db_error};

/// Scope record as scanned from the database.
type ScopeRow = (String, String, String, bool);

/// Scope catalog operations over a shared pool.
pub struct ScopeStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ScopeStore<'a> {
    /// Create a new scope store with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all defined scopes, ordered by name.
    pub async fn list(&self) -> StoreResult<Vec<Scope>> {
        let rows: Vec<ScopeRow> = query_as(
            r#"
            SELECT name, label, description, is_default
            FROM oauth_scope
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.pool)
        .await
        .map_err(|e| db_error("list scopes", "*", e))?;

        Ok(rows
            .into_iter()
            .map(|(name, label, description, is_default)| Scope {
                name,
                label,
                description,
                is_default,
            })
            .collect())
    }
}
