//! End-to-end test infrastructure for docsearch.
//!
//! Provides a shared TestHarness and helper functions for E2E tests
//! covering the full ingest-to-query pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rand::Rng;

use docsearch_embeddings::HashEmbedder;
use docsearch_ingest::{IngestionPipeline, PipelineConfig};
use docsearch_retrieval::RetrievalService;
use docsearch_types::{metadata_from_pairs, Metadata};
use docsearch_vector::SharedIndex;

/// Embedding dimension used by the harness
pub const TEST_DIM: usize = 64;

/// Shared test harness for E2E tests.
///
/// Owns a temp index directory, a deterministic embedder and one shared
/// index handle wired into both the pipeline and the retrieval service.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Directory holding the persisted index
    pub index_path: PathBuf,
    pub embedder: Arc<HashEmbedder>,
    pub index: SharedIndex,
    pub pipeline: IngestionPipeline<HashEmbedder>,
    pub retrieval: RetrievalService<HashEmbedder>,
}

impl TestHarness {
    /// Create a new harness with an empty index.
    pub fn new() -> Self {
        Self::with_batch_size(PipelineConfig::default().batch_size)
    }

    pub fn with_batch_size(batch_size: usize) -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let index_path = temp_dir.path().join("vector-index");
        let embedder = Arc::new(HashEmbedder::new(TEST_DIM).expect("Failed to create embedder"));
        let index = SharedIndex::new(&index_path);

        let pipeline = IngestionPipeline::new(
            Arc::clone(&embedder),
            index.clone(),
            PipelineConfig { batch_size },
        )
        .expect("Failed to create pipeline");
        let retrieval = RetrievalService::new(Arc::clone(&embedder), index.clone());

        Self {
            _temp_dir: temp_dir,
            index_path,
            embedder,
            index,
            pipeline,
            retrieval,
        }
    }

    /// A second, independent index directory inside the same temp dir.
    pub fn sibling_dir(&self, name: &str) -> PathBuf {
        self._temp_dir.path().join(name)
    }

    /// Pipeline writing to its own index at `dir`, sharing this embedder.
    pub fn pipeline_at(&self, dir: &Path) -> IngestionPipeline<HashEmbedder> {
        IngestionPipeline::new(
            Arc::clone(&self.embedder),
            SharedIndex::new(dir),
            PipelineConfig::default(),
        )
        .expect("Failed to create pipeline")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Metadata with the two keys every source supplies.
pub fn doc_metadata(source: &str, title: &str) -> Metadata {
    metadata_from_pairs([("source", source), ("title", title)])
}

/// Random lowercase filler of `words` words.
pub fn random_text(words: usize) -> String {
    let mut rng = rand::rng();
    (0..words)
        .map(|_| {
            let len = rng.random_range(3..9);
            (0..len)
                .map(|_| char::from(b'a' + rng.random_range(0..26u8)))
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join(" ")
}
