//! Error types for retrieval.

use docsearch_embeddings::EmbeddingError;
use docsearch_vector::VectorError;
use thiserror::Error;

/// Errors that can occur while answering a query
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Query text is empty or whitespace
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Bad request parameter (k == 0)
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    /// Blocking embedding task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}
