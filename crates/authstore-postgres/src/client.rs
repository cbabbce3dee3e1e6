//! OAuth client registry.
//!
//! CRUD for client registrations keyed by the caller-assigned client id,
//! with upsert-by-identity semantics: `save` checks existence by id inside
//! one transaction and either updates the mutable fields (secret, redirect
//! URI, metadata) or inserts a new row. Two concurrent first inserts of the
//! same id can still race; the loser's duplicate-key failure surfaces as a
//! database error rather than being retried.

use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use tracing::debug;

use authstore::types::{Client, ClientFilter, ClientMeta};
use authstore::{StoreError, StoreResult};

use crate::tx::with_tx;
use crate::{PgPool, db_error};

/// Client record as scanned from the database.
type ClientRow = (String, String, String, serde_json::Value, OffsetDateTime);

fn row_to_client(row: ClientRow) -> StoreResult<Client> {
    let (id, secret, redirect_uri, meta, created_at) = row;
    let meta: ClientMeta = serde_json::from_value(meta)
        .map_err(|e| StoreError::database(format!("decode client meta {id}: {e}")))?;
    Ok(Client {
        id,
        secret,
        redirect_uri,
        meta,
        created_at,
    })
}

// =============================================================================
// Client Store
// =============================================================================

/// Client registry operations over a shared pool.
pub struct ClientStore<'a> {
    pool: &'a PgPool,
}

impl<'a> ClientStore<'a> {
    /// Create a new client store with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a client by id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no client matches, or a database error.
    pub async fn get(&self, id: &str) -> StoreResult<Client> {
        let row: Option<ClientRow> = query_as(
            r#"
            SELECT id, secret, redirect_uri, meta, created
            FROM oauth_client
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| db_error("get client", id, e))?;

        let Some(row) = row else {
            debug!(client_id = %id, "client not found");
            return Err(StoreError::not_found(format!("client {id}")));
        };
        row_to_client(row)
    }

    /// Upsert a client registration by id.
    ///
    /// Validation runs before the transaction opens; the existence check and
    /// the insert/update commit together.
    ///
    /// # Errors
    ///
    /// Returns a `Value` error for an empty id, secret or redirect URI, or a
    /// database error.
    pub async fn save(&self, client: &Client) -> StoreResult<()> {
        client.validate()?;
        let meta = serde_json::to_value(&client.meta)
            .map_err(|e| StoreError::database(format!("encode client meta {}: {e}", client.id)))?;

        // The step future may only borrow the transaction, so it captures an
        // owned copy of the record.
        let client = client.clone();
        with_tx(self.pool, "client.save", move |tx| {
            Box::pin(async move {
                let created: Option<OffsetDateTime> = query_scalar::<_, OffsetDateTime>(
                    "SELECT created FROM oauth_client WHERE id = $1",
                )
                .bind(&client.id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| db_error("query client", &client.id, e))?;

                if created.is_some() {
                    query(
                        r#"
                        UPDATE oauth_client
                        SET meta = $1, secret = $2, redirect_uri = $3
                        WHERE id = $4
                        "#,
                    )
                    .bind(&meta)
                    .bind(&client.secret)
                    .bind(&client.redirect_uri)
                    .bind(&client.id)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| db_error("update client", &client.id, e))?;
                    debug!(client_id = %client.id, "updated client");
                } else {
                    query(
                        r#"
                        INSERT INTO oauth_client (id, meta, secret, redirect_uri)
                        VALUES ($1, $2, $3, $4)
                        "#,
                    )
                    .bind(&client.id)
                    .bind(&meta)
                    .bind(&client.secret)
                    .bind(&client.redirect_uri)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| db_error("insert client", &client.id, e))?;
                    debug!(client_id = %client.id, "saved new client");
                }
                Ok(())
            })
        })
        .await
    }

    /// Delete a client registration. Idempotent; deleting a non-existent id
    /// is not an error.
    pub async fn remove(&self, id: &str) -> StoreResult<()> {
        query("DELETE FROM oauth_client WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await
            .map_err(|e| db_error("remove client", id, e))?;
        Ok(())
    }

    /// List clients with pagination, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns a `Value` error for an out-of-range filter before any query,
    /// or a database error.
    pub async fn list(&self, filter: &ClientFilter) -> StoreResult<(Vec<Client>, i64)> {
        let (limit, offset) = filter.limit_offset()?;

        let total: i64 = query_scalar::<_, i64>("SELECT COUNT(id) FROM oauth_client")
            .fetch_one(self.pool)
            .await
            .map_err(|e| db_error("count clients", "*", e))?;
        if total == 0 {
            return Ok((Vec::new(), 0));
        }

        let rows: Vec<ClientRow> = query_as(
            r#"
            SELECT id, secret, redirect_uri, meta, created
            FROM oauth_client
            ORDER BY created DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await
        .map_err(|e| db_error("list clients", "*", e))?;

        let clients = rows
            .into_iter()
            .map(row_to_client)
            .collect::<StoreResult<Vec<_>>>()?;
        Ok((clients, total))
    }
}
