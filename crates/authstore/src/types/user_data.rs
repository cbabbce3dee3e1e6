//! Opaque user-data normalization.
//!
//! Authorization codes and access tokens carry an opaque user context that is
//! persisted as a JSONB blob. The storage contract requires a string-keyed
//! mapping; anything else is rejected before a transaction opens rather than
//! silently coerced.

use serde_json::{Map, Value};

use crate::{StoreError, StoreResult};

/// Normalize an opaque user-data blob to a string-keyed mapping.
///
/// `Null` coerces to an empty mapping; objects pass through unchanged.
///
/// # Errors
///
/// Returns [`StoreError::InvalidUserData`] for any non-object value.
pub fn normalize(value: &Value) -> StoreResult<Value> {
    match value {
        Value::Null => Ok(Value::Object(Map::new())),
        Value::Object(_) => Ok(value.clone()),
        _ => Err(StoreError::InvalidUserData),
    }
}
