//! Scope catalog entry.

use serde::{Deserialize, Serialize};

/// An entry in the scope catalog used by consent screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Scope name as it appears in grant requests.
    pub name: String,

    /// Short display label.
    pub label: String,

    /// Longer description for the consent screen.
    pub description: String,

    /// Whether the scope is granted by default.
    pub is_default: bool,
}
