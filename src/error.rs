//! Typed error kinds for the core store and atlas operations.
//!
//! Write paths return these as explicit failures; read paths return empty
//! collections instead. Transport layers decide retry policy — nothing in the
//! core retries internally.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaymarkError {
    /// The value could not be serialized for canonical hashing or storage.
    #[error("value is not serializable: {0}")]
    Encoding(String),

    /// Serialized payload exceeds the configured size ceiling.
    #[error("payload is {size} bytes, limit is {limit}")]
    PayloadTooLarge { size: usize, limit: usize },

    /// TTL outside the accepted `[min, max]` window.
    #[error("ttl_seconds {ttl} outside allowed range [{min}, {max}]")]
    InvalidTtl { ttl: i64, min: i64, max: i64 },

    /// Confidence outside `[0.0, 1.0]`.
    #[error("confidence {0} outside allowed range [0.0, 1.0]")]
    InvalidConfidence(f64),

    /// Neighborhood extraction requires at least one seed module.
    #[error("seed module list is empty")]
    EmptySeed,

    /// Fold radius must be non-negative.
    #[error("fold radius {0} is negative")]
    InvalidRadius(i64),

    /// A seed module id has no entry in the policy graph.
    #[error("module not present in policy graph: {0}")]
    UnknownModule(String),

    /// Recall query resolved to no frame.
    #[error("no frame matched the recall query")]
    NotFound,

    #[error(transparent)]
    Database(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, WaymarkError>;
