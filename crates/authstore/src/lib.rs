//! Core types and traits for the OAuth2 token store.
//!
//! This crate defines the storage-facing half of an OAuth2 authorization
//! server:
//!
//! - Domain types (`Client`, `AuthorizeData`, `AccessData`, `Scope`)
//! - Storage traits consumed by the protocol engine ([`OAuthStorage`]) and by
//!   administrative tooling ([`AdminStorage`])
//! - The [`StoreError`] taxonomy shared by all backends
//!
//! The crate is backend-agnostic. Concrete implementations live in sibling
//! crates:
//!
//! - `authstore-postgres` - PostgreSQL storage backend
//!
//! # Example
//!
//! ```ignore
//! use authstore::{OAuthStorage, StoreError};
//!
//! async fn exchange(store: &impl OAuthStorage, code: &str) -> Result<(), StoreError> {
//!     let grant = store.load_authorize(code).await?;
//!     // ... mint the access token via the protocol engine ...
//!     store.remove_authorize(code).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod storage;
pub mod types;

pub use error::{StoreError, StoreResult};
pub use storage::{AdminStorage, OAuthStorage};
pub use types::{
    AccessData, AuthorizeData, Client, ClientFilter, ClientMeta, ClientValidationError, Scope,
};
