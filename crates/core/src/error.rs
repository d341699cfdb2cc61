//! Error types for the psx enrichment pipeline.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Caller-visible failure modes of the pipeline.
///
/// Record-level validation failures are deliberately not part of this enum;
/// they are collected as human-readable strings alongside the enriched batch
/// and never abort processing.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed or unsupported configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The input batch exceeds the configured ceiling.
    #[error("Batch of {len} records exceeds the configured ceiling of {max}")]
    BatchTooLarge { len: usize, max: usize },

    /// Every input record failed validation.
    #[error("No valid data: all {rejected} input records failed validation")]
    BatchEmpty { rejected: usize },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
