//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
///
/// Backend faults may be transient; callers decide whether to retry.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Candle model error
    #[error("Candle error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Tokenizer error
    #[error("Tokenizer error: {0}")]
    Tokenizer(String),

    /// Model file not found
    #[error("Model file not found: {0}")]
    ModelNotFound(String),

    /// Backend cannot serve requests
    #[error("Embedding model unavailable: {0}")]
    ModelUnavailable(String),

    /// Download error
    #[error("Failed to download model: {0}")]
    Download(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input text is empty after trimming
    #[error("Cannot embed empty text (input #{0})")]
    EmptyInput(usize),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
