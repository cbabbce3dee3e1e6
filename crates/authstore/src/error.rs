//! Error taxonomy shared by all storage backends.
//!
//! Validation failures (`Value`, `InvalidUserData`) are raised before any
//! I/O; backend failures carry the operation and key that produced them.

use time::OffsetDateTime;

/// Errors that can occur during token store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No matching row was found.
    #[error("Not found: {what}")]
    NotFound {
        /// Description of the missing entity (kind and key).
        what: String,
    },

    /// A caller-supplied entity failed required-field validation.
    ///
    /// Raised before any transaction opens; no partial write happens.
    #[error("Value error: {message}")]
    Value {
        /// Description of the invalid field.
        message: String,
    },

    /// The opaque user-data blob is not a string-keyed mapping.
    #[error("Invalid user data: expected a string-keyed mapping")]
    InvalidUserData,

    /// The row exists but its computed expiry has passed.
    #[error("Expired at {at}")]
    Expired {
        /// The computed expiry instant (`created + expires_in`).
        at: OffsetDateTime,
    },

    /// A backing-store failure not classified as `NotFound`.
    #[error("Database error: {message}")]
    Database {
        /// Operation and key context plus the driver message.
        message: String,
    },

    /// A `previous` pointer chain references a token already visited.
    ///
    /// Only produced by chain reconstruction on a corrupted lineage; treated
    /// as a database-level failure by the predicates.
    #[error("Access token chain cycle detected at {token}")]
    ChainCycle {
        /// The token that closed the cycle.
        token: String,
    },
}

impl StoreError {
    // -------------------------------------------------------------------------
    // Constructor Methods
    // -------------------------------------------------------------------------

    /// Create a `NotFound` error.
    #[must_use]
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a `Value` error.
    #[must_use]
    pub fn value(message: impl Into<String>) -> Self {
        Self::Value {
            message: message.into(),
        }
    }

    /// Create a `Database` error.
    #[must_use]
    pub fn database(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    /// Create an `Expired` error.
    #[must_use]
    pub fn expired(at: OffsetDateTime) -> Self {
        Self::Expired { at }
    }

    /// Create a `ChainCycle` error.
    #[must_use]
    pub fn chain_cycle(token: impl Into<String>) -> Self {
        Self::ChainCycle {
            token: token.into(),
        }
    }

    // -------------------------------------------------------------------------
    // Predicate Methods
    // -------------------------------------------------------------------------

    /// Returns `true` if this is a `NotFound` error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an `Expired` error.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        matches!(self, Self::Expired { .. })
    }

    /// Returns `true` if the error was caused by invalid caller input
    /// (validation or user-data contract violations).
    #[must_use]
    pub fn is_value_error(&self) -> bool {
        matches!(self, Self::Value { .. } | Self::InvalidUserData)
    }

    /// Returns `true` if this is a backing-store failure (including a
    /// corrupted rotation chain).
    #[must_use]
    pub fn is_database_error(&self) -> bool {
        matches!(self, Self::Database { .. } | Self::ChainCycle { .. })
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Tests
// =============================================================================
