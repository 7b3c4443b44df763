//! Recursive merge of option patches.
//!
//! Relation configuration and per-request suboptions are merged through
//! their JSON form: objects merge key by key, arrays concatenate, and any
//! other value in the patch replaces the base.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{QueryError, QueryResult};

/// Merge `patch` into `base` in place.
pub fn deep_merge(base: &mut Value, patch: Value) {
    match (base, patch) {
        (Value::Object(base), Value::Object(patch)) => {
            for (key, value) in patch {
                match base.get_mut(&key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(base), Value::Array(patch)) => base.extend(patch),
        (base, patch) => *base = patch,
    }
}

/// Merge a JSON patch into a typed value, returning the merged copy.
///
/// `label` names the relation in the error when the merged JSON no longer
/// decodes into `T`.
pub fn merge_typed<T>(base: &T, patch: &Value, label: &str) -> QueryResult<T>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged = serde_json::to_value(base)?;
    deep_merge(&mut merged, patch.clone());
    serde_json::from_value(merged).map_err(|e| QueryError::invalid_options(label, e.to_string()))
}
