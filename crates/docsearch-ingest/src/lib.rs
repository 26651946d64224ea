//! # docsearch-ingest
//!
//! Document ingestion for docsearch.
//!
//! Raw document text is split into overlapping character windows, each
//! window is embedded, and the resulting records are appended to the shared
//! vector index and persisted.
//!
//! ## Sources
//! - Plain text with caller-supplied metadata
//! - PDF files, one document per page
//! - Wiki pages behind the [`WikiSource`] trait

pub mod chunker;
pub mod error;
pub mod pipeline;
pub mod sources;

pub use chunker::{split, Chunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use error::IngestError;
pub use pipeline::{IngestionPipeline, PipelineConfig};
pub use sources::{
    clean_html, load_pdf, DirectoryWikiSource, SourceDocument, WikiCredentials, WikiPage,
    WikiSource,
};
