//! Chunk type: the atomic unit of embedding and retrieval.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Provenance metadata attached to every chunk.
///
/// Ordered map so persisted payloads serialize deterministically.
pub type Metadata = BTreeMap<String, String>;

/// Origin kind of a document (e.g. "pdf", "wiki")
pub const META_SOURCE: &str = "source";

/// Human-readable document title
pub const META_TITLE: &str = "title";

/// File name for file-backed sources
pub const META_FILE_NAME: &str = "file_name";

/// Build a metadata map from string pairs.
pub fn metadata_from_pairs<K, V, I>(pairs: I) -> Metadata
where
    K: Into<String>,
    V: Into<String>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// A bounded slice of a document's text.
///
/// Created by the chunker and never mutated afterwards. `sequence_index`
/// gives the stable position of the chunk within its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// The text payload of the chunk
    pub text: String,

    /// Provenance fields (`source`, `title`, plus opaque pass-through keys)
    #[serde(default)]
    pub source_metadata: Metadata,

    /// Position within the parent document, starting at 0
    pub sequence_index: usize,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(text: impl Into<String>, source_metadata: Metadata, sequence_index: usize) -> Self {
        Self {
            text: text.into(),
            source_metadata,
            sequence_index,
        }
    }

    /// Length in characters, the unit used for splitting
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }

    /// Look up a metadata value
    pub fn meta(&self, key: &str) -> Option<&str> {
        self.source_metadata.get(key).map(String::as_str)
    }
}
