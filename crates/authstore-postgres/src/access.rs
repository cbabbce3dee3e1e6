//! Access token storage and rotation-chain loading.
//!
//! Each access token row records its links into the grant lineage: the
//! authorization code it was exchanged from, the token it rotated away
//! from, and the refresh token that can mint a successor. Saving a token
//! and registering its refresh token commit in one transaction; loading a
//! token walks the `previous` chain best-effort, tolerating pruned links
//! but refusing cycles.

use std::collections::HashSet;

use futures_util::future::BoxFuture;
use serde_json::Value;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_core::query_scalar::query_scalar;
use time::OffsetDateTime;
use tracing::{debug, instrument};

use authstore::types::{AccessData, user_data};
use authstore::{StoreError, StoreResult};

use crate::authorize::AuthorizeStore;
use crate::client::ClientStore;
use crate::refresh::RefreshStore;
use crate::tx::with_tx;
use crate::{PgPool, db_error, token_prefix};

/// Access record as scanned from the database, minus the token itself.
type AccessRow = (
    String,
    Option<String>,
    Option<String>,
    Option<String>,
    i32,
    String,
    String,
    OffsetDateTime,
    Value,
    bool,
);

// =============================================================================
// Access Store
// =============================================================================

/// Access token operations over a shared pool.
pub struct AccessStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AccessStore<'a> {
    /// Create a new access store with a connection pool reference.
    #[must_use]
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Persist an access token and, when present, its refresh token.
    ///
    /// Idempotent on the token value: if a row for `data.access_token`
    /// already exists the call succeeds without touching it. Otherwise the
    /// token row and the refresh index entry commit together, so a refresh
    /// token can never point at an access token that was not saved.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserData` if the user data is neither null nor an
    /// object, or a database error.
    #[instrument(skip(self, data), fields(token = %token_prefix(&data.access_token)))]
    pub async fn save(&self, data: &AccessData) -> StoreResult<()> {
        let extra = user_data::normalize(&data.user_data)?;

        let exists: Option<i32> =
            query_scalar::<_, i32>("SELECT 1 FROM oauth_access WHERE access_token = $1")
                .bind(&data.access_token)
                .fetch_optional(self.pool)
                .await
                .map_err(|e| db_error("query access", token_prefix(&data.access_token), e))?;
        if exists.is_some() {
            debug!(token = %token_prefix(&data.access_token), "access token already saved");
            return Ok(());
        }

        // The step future may only borrow the transaction, so it captures an
        // owned copy of the record.
        let access = data.clone();
        with_tx(self.pool, "access.save", move |tx| {
            Box::pin(async move {
                query(
                    r#"
                    INSERT INTO oauth_access
                        (client_id, authorize_code, previous, access_token, refresh_token,
                         expires_in, scopes, redirect_uri, created, extra, is_frozen)
                    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                    "#,
                )
                .bind(&access.client.id)
                .bind(access.authorize_code())
                .bind(access.previous_token())
                .bind(&access.access_token)
                .bind(&access.refresh_token)
                .bind(access.expires_in)
                .bind(&access.scope)
                .bind(&access.redirect_uri)
                .bind(access.created_at)
                .bind(&extra)
                .bind(access.frozen)
                .execute(&mut **tx)
                .await
                .map_err(|e| db_error("save access", token_prefix(&access.access_token), e))?;

                if let Some(refresh) = &access.refresh_token {
                    RefreshStore::upsert(tx, refresh, &access.access_token).await?;
                }
                Ok(())
            })
        })
        .await?;

        debug!(
            token = %token_prefix(&data.access_token),
            client_id = %data.client.id,
            has_refresh = data.refresh_token.is_some(),
            "saved access data"
        );
        Ok(())
    }

    /// Load an access token and reconstruct its lineage.
    ///
    /// The client is mandatory: a token row whose client is gone makes the
    /// whole load fail. The authorization code and the `previous` token are
    /// best-effort: pruned or expired links load as `None`. A cycle in the
    /// `previous` chain is reported rather than followed.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown token, `ChainCycle` if the
    /// `previous` chain loops, or a database error (including a dangling
    /// client reference).
    #[instrument(skip(self, token), fields(token = %token_prefix(token)))]
    pub async fn load(&self, token: &str) -> StoreResult<AccessData> {
        let mut seen = HashSet::new();
        self.load_inner(token, &mut seen).await
    }

    fn load_inner<'s>(
        &'s self,
        token: &'s str,
        seen: &'s mut HashSet<String>,
    ) -> BoxFuture<'s, StoreResult<AccessData>> {
        Box::pin(async move {
            if !seen.insert(token.to_owned()) {
                return Err(StoreError::chain_cycle(token_prefix(token)));
            }

            let row: Option<AccessRow> = query_as(
                r#"
                SELECT client_id, authorize_code, previous, refresh_token,
                       expires_in, scopes, redirect_uri, created, extra, is_frozen
                FROM oauth_access
                WHERE access_token = $1
                "#,
            )
            .bind(token)
            .fetch_optional(self.pool)
            .await
            .map_err(|e| db_error("load access", token_prefix(token), e))?;

            let Some((
                client_id,
                authorize_code,
                previous,
                refresh_token,
                expires_in,
                scope,
                redirect_uri,
                created_at,
                extra,
                frozen,
            )) = row
            else {
                return Err(StoreError::not_found(format!(
                    "access token {}",
                    token_prefix(token)
                )));
            };

            // A token row without its client is corrupt, not merely stale.
            let client = ClientStore::new(self.pool)
                .get(&client_id)
                .await
                .map_err(|err| {
                    if err.is_not_found() {
                        StoreError::database(format!(
                            "access token {} references missing client {client_id}",
                            token_prefix(token)
                        ))
                    } else {
                        err
                    }
                })?;

            let authorize_data = match authorize_code {
                Some(code) => AuthorizeStore::new(self.pool).load(&code).await.ok(),
                None => None,
            };

            let previous = match previous {
                Some(prev) => match self.load_inner(&prev, seen).await {
                    Ok(data) => Some(Box::new(data)),
                    Err(err @ StoreError::ChainCycle { .. }) => return Err(err),
                    Err(_) => None,
                },
                None => None,
            };

            Ok(AccessData {
                access_token: token.to_owned(),
                client,
                authorize_data,
                previous,
                refresh_token,
                expires_in,
                scope,
                redirect_uri,
                created_at,
                user_data: extra,
                frozen,
            })
        })
    }

    /// Delete an access token row. Idempotent; the refresh index is left to
    /// its own lifecycle.
    pub async fn remove(&self, token: &str) -> StoreResult<()> {
        query("DELETE FROM oauth_access WHERE access_token = $1")
            .bind(token)
            .execute(self.pool)
            .await
            .map_err(|e| db_error("remove access", token_prefix(token), e))?;
        debug!(token = %token_prefix(token), "removed access data");
        Ok(())
    }
}
