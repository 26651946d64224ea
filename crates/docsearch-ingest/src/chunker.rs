//! Fixed-window text chunking.
//!
//! A window of `chunk_size` characters slides over the text, advancing
//! `chunk_size - overlap` characters each step. Sizes are counted in chars,
//! so a chunk boundary never falls inside a UTF-8 sequence.

use std::iter;

use docsearch_types::{Chunk, Metadata};

use crate::error::IngestError;

/// Default window size in characters
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive windows
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Validated chunking policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    chunk_size: usize,
    overlap: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

impl Chunker {
    /// Requires `chunk_size > 0` and `overlap < chunk_size`.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, IngestError> {
        if chunk_size == 0 {
            return Err(IngestError::InvalidConfiguration(
                "chunk_size must be greater than 0".to_string(),
            ));
        }
        if overlap >= chunk_size {
            return Err(IngestError::InvalidConfiguration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into chunks with empty metadata.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        self.split_with_metadata(text, &Metadata::new())
    }

    /// Split `text`, attaching a copy of `metadata` to every chunk.
    ///
    /// Empty or whitespace-only text yields no chunks.
    pub fn split_with_metadata(&self, text: &str, metadata: &Metadata) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, including the end of the text
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(iter::once(text.len()))
            .collect();
        let char_count = bounds.len() - 1;
        let step = self.chunk_size - self.overlap;

        let mut chunks = Vec::with_capacity(char_count / step + 1);
        let mut start = 0;
        loop {
            let end = (start + self.chunk_size).min(char_count);
            chunks.push(Chunk::new(
                &text[bounds[start]..bounds[end]],
                metadata.clone(),
                chunks.len(),
            ));
            if end == char_count {
                break;
            }
            start += step;
        }
        chunks
    }
}

/// Split `text` with a one-off policy.
pub fn split(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<Chunk>, IngestError> {
    Ok(Chunker::new(chunk_size, overlap)?.split(text))
}
