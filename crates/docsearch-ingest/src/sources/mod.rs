//! Document source adapters.
//!
//! Each adapter turns raw input (a PDF file, an exported wiki page) into
//! [`SourceDocument`]s carrying the provenance metadata the pipeline
//! attaches to every chunk.

pub mod pdf;
pub mod wiki;

use docsearch_types::Metadata;

pub use pdf::{load_pdf, PDF_SOURCE};
pub use wiki::{clean_html, DirectoryWikiSource, WikiCredentials, WikiPage, WikiSource, WIKI_SOURCE};

/// Raw document text plus the metadata shared by all of its chunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDocument {
    pub text: String,
    pub metadata: Metadata,
}

impl SourceDocument {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }
}
