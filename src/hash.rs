//! Canonical JSON hashing for fact identity.
//!
//! [`hash_value`] produces a stable SHA-256 hex digest over a canonical
//! encoding of any JSON value: object keys are recursively sorted, output is
//! compact. Two structurally equal values hash identically regardless of key
//! order, which is what makes fact writes idempotent. [`fact_id`] composes
//! the four identity components through the same canonicalization rule.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::{Result, WaymarkError};

/// Recursively sort object keys. Array order is semantic and preserved.
fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys(v));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(arr) => {
            serde_json::Value::Array(arr.iter().map(sort_keys).collect())
        }
        other => other.clone(),
    }
}

/// Canonical compact encoding: sorted keys, no insignificant whitespace.
pub fn canonical_json(value: &serde_json::Value) -> Result<String> {
    serde_json::to_string(&sort_keys(value)).map_err(|e| WaymarkError::Encoding(e.to_string()))
}

/// SHA-256 hex digest of the canonical encoding of any serializable value.
pub fn hash_value<T: Serialize>(value: &T) -> Result<String> {
    let json =
        serde_json::to_value(value).map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    let canonical = canonical_json(&json)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Fact identity digest over `(kind, scope, inputs_hash, payload_hash)`.
///
/// The scope is re-serialized through the same canonicalization as payloads,
/// so field order in the caller's scope object never changes the identity.
pub fn fact_id<S: Serialize>(
    kind: &str,
    scope: &S,
    inputs_hash: &str,
    payload_hash: &str,
) -> Result<String> {
    let scope_json =
        serde_json::to_value(scope).map_err(|e| WaymarkError::Encoding(e.to_string()))?;
    hash_value(&serde_json::json!({
        "kind": kind,
        "scope": scope_json,
        "inputs_hash": inputs_hash,
        "payload_hash": payload_hash,
    }))
}
