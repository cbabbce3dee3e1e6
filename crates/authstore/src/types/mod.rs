//! Domain types for OAuth2 persistence.

pub mod access;
pub mod authorize;
pub mod client;
pub mod scope;
pub mod user_data;

pub use access::AccessData;
pub use authorize::AuthorizeData;
pub use client::{Client, ClientFilter, ClientMeta, ClientValidationError};
pub use scope::Scope;
