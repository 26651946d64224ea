//! Flat vector index.
//!
//! Records are kept in insertion order next to a parallel table of vector
//! norms. Search scores every record and selects the top k, so results are
//! exact and `search` always returns `min(k, len)` hits.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

use docsearch_types::{Chunk, RecordId, SearchHit};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::VectorError;

/// Similarity metric, fixed when the index is created.
///
/// Both metrics are similarity-oriented: higher scores mean closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// `1 - cosine_distance`, in [-1, 1]; zero-norm vectors score 0
    #[default]
    Cosine,
    /// Raw dot product
    InnerProduct,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cosine => write!(f, "cosine"),
            Metric::InnerProduct => write!(f, "inner_product"),
        }
    }
}

/// A stored vector with its chunk payload.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedRecord {
    pub record_id: RecordId,
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

/// In-memory flat index over embedded records.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    dimension: usize,
    metric: Metric,
    records: Vec<EmbeddedRecord>,
    norms: Vec<f32>,
    positions: HashMap<RecordId, usize>,
    next_id: u64,
}

impl VectorIndex {
    /// Create an empty cosine index.
    pub fn new(dimension: usize) -> Result<Self, VectorError> {
        Self::with_metric(dimension, Metric::Cosine)
    }

    pub fn with_metric(dimension: usize, metric: Metric) -> Result<Self, VectorError> {
        if dimension == 0 {
            return Err(VectorError::InvalidConfiguration(
                "index dimension must be > 0".to_string(),
            ));
        }
        Ok(Self {
            dimension,
            metric,
            records: Vec::new(),
            norms: Vec::new(),
            positions: HashMap::new(),
            next_id: 1,
        })
    }

    /// Rebuild an index from persisted parts, validating every record.
    pub(crate) fn from_parts(
        dimension: usize,
        metric: Metric,
        next_id: u64,
        records: Vec<EmbeddedRecord>,
    ) -> Result<Self, VectorError> {
        let mut index = Self::with_metric(dimension, metric)
            .map_err(|e| VectorError::CorruptIndex(e.to_string()))?;

        let mut max_id = 0;
        for record in records {
            if record.vector.len() != dimension {
                return Err(VectorError::CorruptIndex(format!(
                    "record {} has {} floats, index dimension is {}",
                    record.record_id,
                    record.vector.len(),
                    dimension
                )));
            }
            if index.positions.contains_key(&record.record_id) {
                return Err(VectorError::CorruptIndex(format!(
                    "duplicate record id {}",
                    record.record_id
                )));
            }
            max_id = max_id.max(record.record_id.as_u64());
            index.push(record);
        }
        let after_max = max_id.checked_add(1).ok_or_else(|| {
            VectorError::CorruptIndex(format!("record id {} leaves no room for new ids", max_id))
        })?;
        index.next_id = next_id.max(after_max);
        Ok(index)
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in insertion order
    pub fn records(&self) -> &[EmbeddedRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&EmbeddedRecord> {
        self.positions.get(&id).map(|&pos| &self.records[pos])
    }

    pub(crate) fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Insert records, allocating a fresh id for each.
    ///
    /// All vectors are checked before anything is inserted: one bad vector
    /// rejects the whole batch and leaves the index unchanged.
    pub fn add(&mut self, records: Vec<(Vec<f32>, Chunk)>) -> Result<Vec<RecordId>, VectorError> {
        for (vector, _) in &records {
            self.check_vector(vector)?;
        }

        let mut ids = Vec::with_capacity(records.len());
        for (vector, chunk) in records {
            let record_id = self.allocate_id();
            self.push(EmbeddedRecord {
                record_id,
                vector,
                chunk,
            });
            ids.push(record_id);
        }

        debug!(added = ids.len(), total = self.len(), "Added records");
        Ok(ids)
    }

    /// Copy every record of `other` into this index under new ids.
    ///
    /// No deduplication: identical chunks from both indexes survive as
    /// distinct records.
    pub fn merge(&mut self, other: &VectorIndex) -> Result<Vec<RecordId>, VectorError> {
        if other.dimension != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: other.dimension,
            });
        }
        if other.metric != self.metric {
            return Err(VectorError::MetricMismatch {
                expected: self.metric,
                actual: other.metric,
            });
        }

        let mut ids = Vec::with_capacity(other.len());
        for record in &other.records {
            let record_id = self.allocate_id();
            self.push(EmbeddedRecord {
                record_id,
                vector: record.vector.clone(),
                chunk: record.chunk.clone(),
            });
            ids.push(record_id);
        }

        debug!(merged = ids.len(), total = self.len(), "Merged index");
        Ok(ids)
    }

    /// Return up to `k` hits, best first.
    ///
    /// An empty index yields an empty result rather than an error.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, VectorError> {
        if k == 0 {
            return Err(VectorError::InvalidConfiguration(
                "k must be > 0".to_string(),
            ));
        }
        if self.is_empty() {
            return Ok(Vec::new());
        }
        self.check_vector(query)?;

        let query_norm = l2_norm(query);
        let mut scored: Vec<(usize, f32)> = self
            .records
            .iter()
            .zip(self.norms.iter())
            .enumerate()
            .map(|(pos, (record, &norm))| (pos, self.score(query, query_norm, &record.vector, norm)))
            .collect();

        // Score descending, then insertion order: a total order, so selection is stable
        let by_rank = |a: &(usize, f32), b: &(usize, f32)| -> Ordering {
            b.1.total_cmp(&a.1).then(a.0.cmp(&b.0))
        };
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, by_rank);
            scored.truncate(k);
        }
        scored.sort_by(by_rank);

        let hits: Vec<SearchHit> = scored
            .into_iter()
            .enumerate()
            .map(|(i, (pos, score))| {
                let record = &self.records[pos];
                SearchHit::new(record.record_id, record.chunk.clone(), score, i + 1)
            })
            .collect();

        debug!(k = k, found = hits.len(), "Search complete");
        Ok(hits)
    }

    fn score(&self, query: &[f32], query_norm: f32, vector: &[f32], norm: f32) -> f32 {
        let dot: f32 = query.iter().zip(vector.iter()).map(|(a, b)| a * b).sum();
        match self.metric {
            Metric::InnerProduct => dot,
            Metric::Cosine => {
                if query_norm == 0.0 || norm == 0.0 {
                    0.0
                } else {
                    dot / (query_norm * norm)
                }
            }
        }
    }

    fn check_vector(&self, vector: &[f32]) -> Result<(), VectorError> {
        if vector.len() != self.dimension {
            return Err(VectorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        if vector.iter().any(|v| !v.is_finite()) {
            return Err(VectorError::InvalidVector(
                "vector contains NaN or infinite values".to_string(),
            ));
        }
        Ok(())
    }

    fn allocate_id(&mut self) -> RecordId {
        let id = RecordId(self.next_id);
        self.next_id += 1;
        id
    }

    fn push(&mut self, record: EmbeddedRecord) {
        self.positions.insert(record.record_id, self.records.len());
        self.norms.push(l2_norm(&record.vector));
        self.records.push(record);
    }
}

fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}
