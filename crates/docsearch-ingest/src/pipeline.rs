//! Ingestion pipeline.
//!
//! Chunks documents, embeds chunk texts in batches and appends the results
//! to the shared index. A call either adds every chunk it produced or leaves
//! the index untouched: embedding happens before the write lock is taken and
//! the add + persist happen under one write lock.

use std::path::Path;
use std::sync::Arc;

use docsearch_embeddings::{EmbeddingError, EmbeddingModel};
use docsearch_types::{Chunk, Metadata};
use docsearch_vector::{SharedIndex, VectorIndex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::chunker::Chunker;
use crate::error::IngestError;
use crate::sources::{load_pdf, SourceDocument, WikiSource};

/// Pipeline configuration
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Number of chunk texts per embedding call
    pub batch_size: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { batch_size: 32 }
    }
}

/// Turns raw documents into indexed, searchable records.
pub struct IngestionPipeline<E: EmbeddingModel + ?Sized> {
    embedder: Arc<E>,
    index: SharedIndex,
    config: PipelineConfig,
    cancel: CancellationToken,
}

impl<E: EmbeddingModel + ?Sized> IngestionPipeline<E> {
    pub fn new(
        embedder: Arc<E>,
        index: SharedIndex,
        config: PipelineConfig,
    ) -> Result<Self, IngestError> {
        if config.batch_size == 0 {
            return Err(IngestError::InvalidConfiguration(
                "batch_size must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            embedder,
            index,
            config,
            cancel: CancellationToken::new(),
        })
    }

    /// Use `token` to abort in-flight ingestion between embedding batches.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    /// Ingest one document. Returns the number of chunks added.
    pub fn ingest(
        &self,
        raw_text: &str,
        metadata: Metadata,
        chunk_size: usize,
        overlap: usize,
    ) -> Result<usize, IngestError> {
        self.ingest_documents(&[SourceDocument::new(raw_text, metadata)], chunk_size, overlap)
    }

    /// Ingest many documents with one index write and one persist.
    pub fn ingest_documents(
        &self,
        documents: &[SourceDocument],
        chunk_size: usize,
        overlap: usize,
    ) -> Result<usize, IngestError> {
        let chunker = Chunker::new(chunk_size, overlap)?;

        let chunks: Vec<Chunk> = documents
            .iter()
            .flat_map(|doc| chunker.split_with_metadata(&doc.text, &doc.metadata))
            .filter(|chunk| {
                // Windows that are pure whitespace carry nothing to embed
                let keep = !chunk.text.trim().is_empty();
                if !keep {
                    debug!(sequence = chunk.sequence_index, "Skipping blank chunk");
                }
                keep
            })
            .collect();

        if chunks.is_empty() {
            debug!(documents = documents.len(), "No chunks to ingest");
            return Ok(0);
        }

        let vectors = self.embed_chunks(&chunks)?;
        let records: Vec<(Vec<f32>, Chunk)> = vectors.into_iter().zip(chunks).collect();
        let count = records.len();

        let ids = self.index.append(self.embedder.dimension(), records)?;
        info!(
            documents = documents.len(),
            chunks = count,
            first_id = ?ids.first(),
            "Ingested documents"
        );
        Ok(count)
    }

    /// Ingest every page of each PDF. Unreadable files are skipped.
    pub fn ingest_pdf_files<P: AsRef<Path>>(
        &self,
        paths: &[P],
        chunk_size: usize,
        overlap: usize,
    ) -> Result<usize, IngestError> {
        let mut documents = Vec::new();
        for path in paths {
            let path = path.as_ref();
            match load_pdf(path) {
                Ok(pages) => documents.extend(pages),
                Err(e) => warn!(path = ?path, error = %e, "Skipping unreadable PDF"),
            }
        }
        self.ingest_documents(&documents, chunk_size, overlap)
    }

    /// Pull pages from `source` and ingest them. Missing pages are skipped.
    pub fn ingest_wiki_pages(
        &self,
        source: &dyn WikiSource,
        page_ids: &[String],
        chunk_size: usize,
        overlap: usize,
    ) -> Result<usize, IngestError> {
        let status = source.status();
        if !status.available {
            return Err(IngestError::SourceUnavailable(
                status
                    .error_message
                    .unwrap_or_else(|| "wiki source unavailable".to_string()),
            ));
        }

        let mut documents = Vec::with_capacity(page_ids.len());
        for page_id in page_ids {
            match source.fetch_page(page_id) {
                Ok(page) => documents.push(page.into_document()),
                Err(IngestError::PageNotFound(id)) => {
                    warn!(page_id = %id, "Skipping missing wiki page");
                }
                Err(e) => return Err(e),
            }
        }

        if documents.is_empty() {
            warn!(requested = page_ids.len(), "No wiki pages found to ingest");
        }
        self.ingest_documents(&documents, chunk_size, overlap)
    }

    /// Merge an externally built index into the shared one and persist.
    /// Returns the number of records copied.
    pub fn merge_index(&self, other: &VectorIndex) -> Result<usize, IngestError> {
        let ids = self.index.merge_from(other)?;
        info!(merged = ids.len(), "Merged external index");
        Ok(ids.len())
    }

    fn embed_chunks(&self, chunks: &[Chunk]) -> Result<Vec<Vec<f32>>, IngestError> {
        let mut vectors = Vec::with_capacity(chunks.len());
        for batch in chunks.chunks(self.config.batch_size) {
            if self.cancel.is_cancelled() {
                info!(embedded = vectors.len(), total = chunks.len(), "Ingestion cancelled");
                return Err(IngestError::Cancelled);
            }

            let texts: Vec<&str> = batch.iter().map(|c| c.text.as_str()).collect();
            let embeddings = self.embedder.embed_batch(&texts)?;
            if embeddings.len() != batch.len() {
                return Err(EmbeddingError::InvalidInput(format!(
                    "model returned {} embeddings for {} texts",
                    embeddings.len(),
                    batch.len()
                ))
                .into());
            }

            debug!(batch = batch.len(), done = vectors.len() + batch.len(), "Embedded batch");
            vectors.extend(embeddings.into_iter().map(|e| e.into_values()));
        }
        Ok(vectors)
    }
}
