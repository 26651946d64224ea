//! # docsearch-vector
//!
//! Vector index for docsearch.
//!
//! Stores embeddings together with their chunk payloads and answers exact
//! top-k similarity queries over them.
//!
//! ## Features
//! - Flat in-memory index, cosine or inner-product similarity
//! - Deterministic ranking: ties keep insertion order
//! - Merge without dedup; every copied record gets a fresh id
//! - Two-artifact persistence (`vectors.bin` + `payload.json`)
//! - [`SharedIndex`] readers-writer handle shared by ingestion and queries

pub mod error;
pub mod index;
pub mod shared;
pub mod store;

pub use error::VectorError;
pub use index::{EmbeddedRecord, Metric, VectorIndex};
pub use shared::SharedIndex;
pub use store::{index_exists, load, save, PAYLOAD_FILE, VECTORS_FILE};
