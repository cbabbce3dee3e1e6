//! PostgreSQL storage backend for authstore.
//!
//! Provides persistent storage for:
//!
//! - OAuth clients (`oauth_client` table)
//! - Authorization codes (`oauth_authorize`)
//! - Access tokens with their rotation lineage (`oauth_access`)
//! - The refresh token index (`oauth_refresh`)
//! - Per-user per-client consent (`oauth_client_user_authorized`)
//! - The scope catalog (`oauth_scope`)
//!
//! The store holds no in-process mutable state; a shared connection pool is
//! the only shared resource, so handles are cheap to clone and safe to use
//! from arbitrary concurrency.
//!
//! # Example
//!
//! ```ignore
//! use authstore_postgres::{PgOAuthStore, StoreConfig};
//!
//! let store = PgOAuthStore::connect(&StoreConfig::new("postgres://localhost/auth")).await?;
//! let client = store.clients().get("my-app").await?;
//! ```

pub mod access;
pub mod authorize;
pub mod client;
pub mod config;
pub mod consent;
pub mod refresh;
pub mod schema;
pub mod scope;
mod tx;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx_core::pool::Pool;
use sqlx_postgres::Postgres;

use authstore::types::{AccessData, AuthorizeData, Client, ClientFilter, Scope};
use authstore::{AdminStorage, OAuthStorage, StoreError, StoreResult};

pub use access::AccessStore;
pub use authorize::AuthorizeStore;
pub use client::ClientStore;
pub use config::StoreConfig;
pub use consent::ConsentStore;
pub use refresh::RefreshStore;
pub use scope::ScopeStore;

/// PostgreSQL connection pool type alias.
pub type PgPool = Pool<Postgres>;

/// Attach operation and key context to a driver error.
pub(crate) fn db_error(op: &str, key: &str, err: sqlx_core::error::Error) -> StoreError {
    StoreError::database(format!("{op} {key}: {err}"))
}

/// Loggable prefix of a secret value. Tokens and codes are never logged
/// whole. Tokens are opaque caller-assigned strings, so the cut is clamped
/// to the nearest char boundary rather than byte-sliced.
pub(crate) fn token_prefix(token: &str) -> &str {
    let mut end = token.len().min(8);
    while !token.is_char_boundary(end) {
        end -= 1;
    }
    &token[..end]
}

// =============================================================================
// PostgreSQL OAuth Store
// =============================================================================

/// PostgreSQL-backed token store.
///
/// Holds a connection pool and exposes per-entity store types plus the
/// [`OAuthStorage`] / [`AdminStorage`] trait surfaces. Cloning the handle
/// shares the pool.
#[derive(Debug, Clone)]
pub struct PgOAuthStore {
    pool: Arc<PgPool>,
}

impl PgOAuthStore {
    /// Create a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Create a store by connecting to the database described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails.
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let pool = config
            .pool_options()
            .connect(&config.database_url)
            .await
            .map_err(|e| StoreError::database(format!("connect to database: {e}")))?;
        Ok(Self::new(Arc::new(pool)))
    }

    /// Get a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    // -------------------------------------------------------------------------
    // Store Accessors
    // -------------------------------------------------------------------------

    /// Client registry operations.
    #[must_use]
    pub fn clients(&self) -> ClientStore<'_> {
        ClientStore::new(&self.pool)
    }

    /// Authorization code operations.
    #[must_use]
    pub fn authorize(&self) -> AuthorizeStore<'_> {
        AuthorizeStore::new(&self.pool)
    }

    /// Access token operations.
    #[must_use]
    pub fn access(&self) -> AccessStore<'_> {
        AccessStore::new(&self.pool)
    }

    /// Refresh token index operations.
    #[must_use]
    pub fn refresh(&self) -> RefreshStore<'_> {
        RefreshStore::new(&self.pool)
    }

    /// Consent record operations.
    #[must_use]
    pub fn consent(&self) -> ConsentStore<'_> {
        ConsentStore::new(&self.pool)
    }

    /// Scope catalog operations.
    #[must_use]
    pub fn scopes(&self) -> ScopeStore<'_> {
        ScopeStore::new(&self.pool)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[async_trait]
impl OAuthStorage for PgOAuthStore {
    async fn get_client(&self, id: &str) -> StoreResult<Client> {
        self.clients().get(id).await
    }

    async fn save_authorize(&self, data: &AuthorizeData) -> StoreResult<()> {
        self.authorize().save(data).await
    }

    async fn load_authorize(&self, code: &str) -> StoreResult<AuthorizeData> {
        self.authorize().load(code).await
    }

    async fn remove_authorize(&self, code: &str) -> StoreResult<()> {
        self.authorize().remove(code).await
    }

    async fn save_access(&self, data: &AccessData) -> StoreResult<()> {
        self.access().save(data).await
    }

    async fn load_access(&self, token: &str) -> StoreResult<AccessData> {
        self.access().load(token).await
    }

    async fn remove_access(&self, token: &str) -> StoreResult<()> {
        self.access().remove(token).await
    }

    async fn load_refresh(&self, token: &str) -> StoreResult<AccessData> {
        self.refresh().load(token).await
    }

    async fn remove_refresh(&self, token: &str) -> StoreResult<()> {
        self.refresh().remove(token).await
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AdminStorage for PgOAuthStore {
    async fn save_client(&self, client: &Client) -> StoreResult<()> {
        self.clients().save(client).await
    }

    async fn remove_client(&self, id: &str) -> StoreResult<()> {
        self.clients().remove(id).await
    }

    async fn list_clients(&self, filter: &ClientFilter) -> StoreResult<(Vec<Client>, i64)> {
        self.clients().list(filter).await
    }

    async fn list_scopes(&self) -> StoreResult<Vec<Scope>> {
        self.scopes().list().await
    }

    async fn is_authorized(&self, client_id: &str, username: &str) -> StoreResult<bool> {
        self.consent().is_authorized(client_id, username).await
    }

    async fn save_authorized(&self, client_id: &str, username: &str) -> StoreResult<()> {
        self.consent().save_authorized(client_id, username).await
    }
}

// =============================================================================
// Tests
// =============================================================================
