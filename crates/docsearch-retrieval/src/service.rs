//! Query answering over the shared index.

use std::sync::Arc;

use docsearch_embeddings::{Embedding, EmbeddingModel};
use docsearch_types::{IndexStatus, SearchHit};
use docsearch_vector::SharedIndex;
use tracing::{debug, info};

use crate::error::RetrievalError;

/// Embeds query text and returns the top-k most similar chunks.
///
/// Hits come back exactly as ranked by the index; no score threshold or
/// source filter is applied here.
pub struct RetrievalService<E: EmbeddingModel + ?Sized> {
    embedder: Arc<E>,
    index: SharedIndex,
}

impl<E: EmbeddingModel + ?Sized> RetrievalService<E> {
    pub fn new(embedder: Arc<E>, index: SharedIndex) -> Self {
        Self { embedder, index }
    }

    pub fn index(&self) -> &SharedIndex {
        &self.index
    }

    /// Top-k hits for `text`, best first.
    pub fn query(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        if !self.should_search(text, k)? {
            return Ok(Vec::new());
        }
        let embedding = self.embedder.embed(text)?;
        self.search(text, &embedding, k)
    }

    pub fn status(&self) -> Result<IndexStatus, RetrievalError> {
        Ok(self.index.status()?)
    }

    /// Validate the request; `false` means there is nothing to search.
    fn should_search(&self, text: &str, k: usize) -> Result<bool, RetrievalError> {
        if text.trim().is_empty() {
            return Err(RetrievalError::InvalidQuery(
                "query text is empty".to_string(),
            ));
        }
        if k == 0 {
            return Err(RetrievalError::InvalidConfiguration(
                "k must be greater than 0".to_string(),
            ));
        }
        let status = self.index.status()?;
        if status.record_count == 0 {
            debug!(has_index = status.has_index, "Index empty, no hits");
            return Ok(false);
        }
        Ok(true)
    }

    fn search(
        &self,
        text: &str,
        embedding: &Embedding,
        k: usize,
    ) -> Result<Vec<SearchHit>, RetrievalError> {
        let hits = self
            .index
            .read(|index| match index {
                Some(index) => index.search(&embedding.values, k),
                None => Ok(Vec::new()),
            })??;

        info!(
            query_len = text.chars().count(),
            k = k,
            results = hits.len(),
            top_score = hits.first().map(|h| h.score),
            "Query complete"
        );
        Ok(hits)
    }
}

impl<E: EmbeddingModel + ?Sized + 'static> RetrievalService<E> {
    /// Like [`query`](Self::query), with embedding on the blocking pool.
    pub async fn query_async(&self, text: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        if !self.should_search(text, k)? {
            return Ok(Vec::new());
        }

        let embedder = Arc::clone(&self.embedder);
        let owned = text.to_string();
        let embedding = tokio::task::spawn_blocking(move || embedder.embed(&owned))
            .await
            .map_err(|e| RetrievalError::Task(e.to_string()))??;

        self.search(text, &embedding, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docsearch_embeddings::HashEmbedder;
    use docsearch_types::{metadata_from_pairs, Chunk, Metadata};
    use docsearch_vector::VectorIndex;
    use tempfile::TempDir;

    const DIM: usize = 64;

    fn populated(temp: &TempDir) -> RetrievalService<HashEmbedder> {
        let embedder = Arc::new(HashEmbedder::new(DIM).unwrap());
        let texts = [
            ("Kubernetes pod restart procedure", "Ops Runbook"),
            ("Quarterly revenue forecast spreadsheet", "Finance"),
            ("Rotating database credentials safely", "Security"),
        ];
        let records = texts
            .iter()
            .enumerate()
            .map(|(i, (text, title))| {
                let vector = embedder.embed(text).unwrap().into_values();
                let meta = metadata_from_pairs([("title", *title), ("source", "pdf")]);
                (vector, Chunk::new(*text, meta, i))
            })
            .collect();

        let index = SharedIndex::new(temp.path());
        index.append(DIM, records).unwrap();
        RetrievalService::new(embedder, index)
    }

    #[test]
    fn test_query_finds_exact_text() {
        let temp = TempDir::new().unwrap();
        let service = populated(&temp);

        let hits = service.query("Rotating database credentials safely", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].chunk.text, "Rotating database credentials safely");
        assert_eq!(hits[0].title(), "Security");
        assert_eq!(hits[0].rank, 1);
        assert_eq!(hits[1].rank, 2);
        assert!((hits[0].score - 1.0).abs() < 1e-5);
        assert!(hits[0].score >= hits[1].score);
    }

    #[test]
    fn test_k_larger_than_index() {
        let temp = TempDir::new().unwrap();
        let service = populated(&temp);
        assert_eq!(service.query("pod restart", 10).unwrap().len(), 3);
    }

    #[test]
    fn test_blank_query_rejected() {
        let temp = TempDir::new().unwrap();
        let service = populated(&temp);
        assert!(matches!(
            service.query("   ", 5),
            Err(RetrievalError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_zero_k_rejected() {
        let temp = TempDir::new().unwrap();
        let service = populated(&temp);
        assert!(matches!(
            service.query("anything", 0),
            Err(RetrievalError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_no_index_returns_empty() {
        let temp = TempDir::new().unwrap();
        let service = RetrievalService::new(
            Arc::new(HashEmbedder::new(DIM).unwrap()),
            SharedIndex::new(temp.path()),
        );
        assert!(service.query("hello", 5).unwrap().is_empty());
        assert!(!service.status().unwrap().has_index);
    }

    #[test]
    fn test_empty_index_returns_empty() {
        let temp = TempDir::new().unwrap();
        let service = RetrievalService::new(
            Arc::new(HashEmbedder::new(DIM).unwrap()),
            SharedIndex::from_index(VectorIndex::new(DIM).unwrap(), temp.path()),
        );
        assert!(service.query("hello", 5).unwrap().is_empty());

        let status = service.status().unwrap();
        assert!(status.has_index);
        assert_eq!(status.record_count, 0);
    }

    #[test]
    fn test_embedder_dimension_mismatch() {
        let temp = TempDir::new().unwrap();
        let index = SharedIndex::new(temp.path());
        index
            .append(4, vec![(vec![1.0, 0.0, 0.0, 0.0], Chunk::new("x", Metadata::new(), 0))])
            .unwrap();

        let service = RetrievalService::new(Arc::new(HashEmbedder::new(8).unwrap()), index);
        assert!(matches!(
            service.query("x", 1),
            Err(RetrievalError::Vector(_))
        ));
    }

    #[test]
    fn test_status() {
        let temp = TempDir::new().unwrap();
        let status = populated(&temp).status().unwrap();
        assert_eq!(
            status,
            IndexStatus {
                has_index: true,
                record_count: 3,
                dimension: Some(DIM),
            }
        );
    }

    #[tokio::test]
    async fn test_query_async_matches_sync() {
        let temp = TempDir::new().unwrap();
        let service = populated(&temp);

        let sync_hits = service.query("database credentials", 3).unwrap();
        let async_hits = service.query_async("database credentials", 3).await.unwrap();
        assert_eq!(sync_hits, async_hits);
    }

    #[tokio::test]
    async fn test_query_async_validates() {
        let temp = TempDir::new().unwrap();
        let service = populated(&temp);
        assert!(matches!(
            service.query_async("", 3).await,
            Err(RetrievalError::InvalidQuery(_))
        ));
    }
}
