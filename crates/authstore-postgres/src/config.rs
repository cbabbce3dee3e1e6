//! Store construction configuration.
//!
//! The store takes everything it needs at construction time; there is no
//! ambient connection state or package-level default.

use std::time::Duration;

use serde::Deserialize;
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::Postgres;

fn default_max_connections() -> u32 {
    5
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

/// Connection settings for [`PgOAuthStore::connect`](crate::PgOAuthStore::connect).
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// PostgreSQL connection string.
    pub database_url: String,

    /// Maximum pool size.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Seconds to wait for a pooled connection before failing the operation.
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

impl StoreConfig {
    /// Config for the given connection string with default pool settings.
    #[must_use]
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: default_max_connections(),
            acquire_timeout_secs: default_acquire_timeout_secs(),
        }
    }

    pub(crate) fn pool_options(&self) -> PoolOptions<Postgres> {
        PoolOptions::<Postgres>::new()
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(self.acquire_timeout_secs))
    }
}
