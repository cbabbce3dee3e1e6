//! Storage traits for OAuth2 persistence.
//!
//! [`OAuthStorage`] is the fixed contract the protocol engine calls into
//! during the authorization-code and refresh flows. [`AdminStorage`] is the
//! administrative extension used by registration tooling and consent
//! screens. Implementations are provided by backend crates (e.g.
//! `authstore-postgres`); handles are expected to be cheap to clone and to
//! share one connection pool.

use async_trait::async_trait;

use crate::StoreResult;
use crate::types::{AccessData, AuthorizeData, Client, ClientFilter, Scope};

// =============================================================================
// OAuth Storage Trait
// =============================================================================

/// Persistence operations consumed by the OAuth2 protocol engine.
///
/// The engine owns grant validation, scope checking and token generation;
/// this trait only persists and retrieves what it is given. All operations
/// run to completion on the calling task against a shared pool; no ordering
/// is guaranteed across separate calls.
#[async_trait]
pub trait OAuthStorage: Send + Sync {
    /// Load a client by its id.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no client matches, or a database error.
    async fn get_client(&self, id: &str) -> StoreResult<Client>;

    /// Persist authorization-code grant data.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserData` before any write if the opaque blob is not a
    /// string-keyed mapping, or a database error.
    async fn save_authorize(&self, data: &AuthorizeData) -> StoreResult<()>;

    /// Load authorization data by code, with the full client re-attached.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row matches, `Expired` if the computed expiry
    /// has passed, or a database error.
    async fn load_authorize(&self, code: &str) -> StoreResult<AuthorizeData>;

    /// Delete an authorization code. No-op on an empty code; used both for
    /// single-use consumption and explicit revocation.
    async fn remove_authorize(&self, code: &str) -> StoreResult<()>;

    /// Persist an access token together with its refresh-index entry.
    ///
    /// Idempotent on the token value: saving an already-present token is a
    /// successful no-op. The access row and the refresh-index upsert commit
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `InvalidUserData` before any write if the opaque blob is not a
    /// string-keyed mapping, or a database error (both writes rolled back).
    async fn save_access(&self, data: &AccessData) -> StoreResult<()>;

    /// Load an access token with its client and, best-effort, its linked
    /// authorization code and rotation lineage.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no row matches, a database error if the row or
    /// its client cannot be loaded, or `ChainCycle` on a corrupted lineage.
    /// A missing chain link is not an error; it loads as `None`.
    async fn load_access(&self, token: &str) -> StoreResult<AccessData>;

    /// Delete an access token row. Does not cascade to previous or refresh
    /// rows; those have their own lifecycle events.
    async fn remove_access(&self, token: &str) -> StoreResult<()>;

    /// Resolve a refresh token to the full access data it authorizes
    /// regenerating.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the refresh token is unknown, otherwise the same
    /// errors as [`load_access`](Self::load_access).
    async fn load_refresh(&self, token: &str) -> StoreResult<AccessData>;

    /// Delete a refresh-index entry. Idempotent.
    async fn remove_refresh(&self, token: &str) -> StoreResult<()>;

    /// Release the resources behind this handle.
    async fn close(&self);
}

// =============================================================================
// Admin Storage Trait
// =============================================================================

/// Administrative operations: client registration, scope catalog and
/// per-user consent, sharing the backend's transactional primitives.
#[async_trait]
pub trait AdminStorage: Send + Sync {
    /// Upsert a client registration by id.
    ///
    /// # Errors
    ///
    /// Returns a `Value` error before any write if a required field is empty,
    /// or a database error (including the duplicate-key case when two first
    /// inserts of the same id race).
    async fn save_client(&self, client: &Client) -> StoreResult<()>;

    /// Delete a client registration. Idempotent.
    async fn remove_client(&self, id: &str) -> StoreResult<()>;

    /// List clients with pagination, returning the page and the total count.
    async fn list_clients(&self, filter: &ClientFilter) -> StoreResult<(Vec<Client>, i64)>;

    /// List the scope catalog.
    async fn list_scopes(&self) -> StoreResult<Vec<Scope>>;

    /// Whether the user has previously authorized the client.
    async fn is_authorized(&self, client_id: &str, username: &str) -> StoreResult<bool>;

    /// Record that the user authorized the client. Idempotent.
    async fn save_authorized(&self, client_id: &str, username: &str) -> StoreResult<()>;
}
