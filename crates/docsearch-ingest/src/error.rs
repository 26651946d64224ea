//! Error types for the ingestion pipeline.

use docsearch_embeddings::EmbeddingError;
use docsearch_vector::VectorError;
use thiserror::Error;

/// Errors that can occur while ingesting documents
#[derive(Error, Debug)]
pub enum IngestError {
    /// Bad chunking or batching parameters
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Embedding generation error
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Vector index error
    #[error("Vector error: {0}")]
    Vector(#[from] VectorError),

    /// PDF could not be parsed
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Document source not configured or unreachable
    #[error("Source unavailable: {0}")]
    SourceUnavailable(String),

    /// Requested page does not exist in the source
    #[error("Page not found: {0}")]
    PageNotFound(String),

    /// Ingestion stopped by its cancellation token
    #[error("Ingestion cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for IngestError {
    fn from(err: serde_json::Error) -> Self {
        IngestError::Serialization(err.to_string())
    }
}

impl From<lopdf::Error> for IngestError {
    fn from(err: lopdf::Error) -> Self {
        IngestError::Pdf(err.to_string())
    }
}
