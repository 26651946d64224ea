//! # docsearch-types
//!
//! Shared domain types for the docsearch indexing and retrieval pipeline.
//!
//! This crate defines the data structures passed between crates:
//! - Chunks: bounded slices of document text with provenance metadata
//! - Hits: ranked search results handed to downstream consumers
//! - Status: index health and external source connectivity
//! - Settings: layered configuration
//!
//! ## Usage
//!
//! ```rust
//! use docsearch_types::{Chunk, Metadata};
//!
//! let chunk = Chunk::new("some text", Metadata::new(), 0);
//! assert_eq!(chunk.char_len(), 9);
//! ```

pub mod chunk;
pub mod config;
pub mod error;
pub mod hit;
pub mod status;

pub use chunk::{
    metadata_from_pairs, Chunk, Metadata, META_FILE_NAME, META_SOURCE, META_TITLE,
};
pub use config::{expand_home, EmbedderSettings, Settings, WikiSettings};
pub use error::DocSearchError;
pub use hit::{RecordId, SearchHit};
pub use status::{ConnectionStatus, IndexStatus};
