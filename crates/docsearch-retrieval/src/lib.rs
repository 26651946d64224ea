//! # docsearch-retrieval
//!
//! Query side of docsearch: embeds query text with the same model used at
//! ingestion and returns ranked [`SearchHit`](docsearch_types::SearchHit)s
//! for downstream consumers such as document generators.

pub mod error;
pub mod service;

pub use error::RetrievalError;
pub use service::RetrievalService;
