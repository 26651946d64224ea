//! Vector index error types.

use thiserror::Error;

use crate::index::Metric;

/// Errors that can occur during vector operations.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Bad parameter (zero dimension, k == 0)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Merging indexes built with different similarity metrics
    #[error("Metric mismatch: expected {expected}, got {actual}")]
    MetricMismatch { expected: Metric, actual: Metric },

    /// Vector contains NaN or infinite values
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Persisted artifacts are unreadable or inconsistent
    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    /// One or both persisted artifacts are missing
    #[error("Index not found: {0}")]
    IndexNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Lock poisoned by a panicking writer
    #[error("Lock error: {0}")]
    Lock(String),
}
