//! Search hit types returned to retrieval consumers.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::chunk::{Chunk, META_FILE_NAME, META_SOURCE, META_TITLE};

/// Opaque identifier of a record inside one vector index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub u64);

impl RecordId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rec:{}", self.0)
    }
}

/// A single ranked search result.
///
/// `score` is a similarity: higher is more similar, 1.0 is a perfect
/// cosine match. `rank` is 1-based, best hit first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Id of the matching record in the index
    pub record_id: RecordId,
    /// The matching chunk (text + provenance)
    pub chunk: Chunk,
    /// Similarity score (higher = more similar)
    pub score: f32,
    /// Position in the result list, starting at 1
    pub rank: usize,
}

impl SearchHit {
    pub fn new(record_id: RecordId, chunk: Chunk, score: f32, rank: usize) -> Self {
        Self {
            record_id,
            chunk,
            score,
            rank,
        }
    }

    /// Document title, or "Unknown Document" when the source did not supply one
    pub fn title(&self) -> &str {
        self.chunk.meta(META_TITLE).unwrap_or("Unknown Document")
    }

    /// Origin kind, or "unknown"
    pub fn source(&self) -> &str {
        self.chunk.meta(META_SOURCE).unwrap_or("unknown")
    }

    /// File name, or "Unknown File"
    pub fn file_name(&self) -> &str {
        self.chunk.meta(META_FILE_NAME).unwrap_or("Unknown File")
    }
}
