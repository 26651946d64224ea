//! Deterministic feature-hashing embedder.
//!
//! Each lowercase alphanumeric token is hashed with xxHash64. The low 32 bits
//! pick one of `dimension` buckets and the top bit picks the sign, then the
//! vector is L2-normalized. If signed collisions cancel every bucket, the text
//! is re-counted without signs so non-blank input never embeds to zero.
//! Texts sharing vocabulary land close together, which is enough for offline
//! use and reproducible fixtures.

use std::hash::Hasher;

use tracing::debug;
use twox_hash::XxHash64;

use crate::error::EmbeddingError;
use crate::model::{ensure_non_blank, Embedding, EmbeddingModel, ModelInfo};

/// Name reported in [`ModelInfo`]; bump when the hashing scheme changes.
pub const HASH_MODEL_NAME: &str = "xxhash-bow-v2";

/// Feature-hashing embedder; identity is `(name, dimension, seed)`.
#[derive(Debug, Clone)]
pub struct HashEmbedder {
    seed: u64,
    info: ModelInfo,
}

impl HashEmbedder {
    pub fn new(dimension: usize) -> Result<Self, EmbeddingError> {
        Self::with_seed(dimension, 0)
    }

    pub fn with_seed(dimension: usize, seed: u64) -> Result<Self, EmbeddingError> {
        if dimension == 0 {
            return Err(EmbeddingError::InvalidInput(
                "embedding dimension must be > 0".to_string(),
            ));
        }
        Ok(Self {
            seed,
            info: ModelInfo {
                name: HASH_MODEL_NAME.to_string(),
                dimension,
                max_sequence_length: usize::MAX,
            },
        })
    }

    fn hash_token(&self, token: &str) -> u64 {
        let mut hasher = XxHash64::with_seed(self.seed);
        hasher.write(token.as_bytes());
        hasher.finish()
    }

    fn bucket(&self, h: u64) -> usize {
        ((h & 0xFFFF_FFFF) % self.info.dimension as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0f32; self.info.dimension];

        let lowered = text.to_lowercase();
        let hashes: Vec<u64> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(|t| self.hash_token(t))
            .collect();

        if hashes.is_empty() {
            // Punctuation-only text still gets a stable, non-zero vector
            let h = self.hash_token(lowered.trim());
            values[self.bucket(h)] = 1.0;
            return values;
        }

        for &h in &hashes {
            let sign = if h >> 63 == 0 { 1.0 } else { -1.0 };
            values[self.bucket(h)] += sign;
        }

        if values.iter().all(|v| *v == 0.0) {
            for &h in &hashes {
                values[self.bucket(h)] += 1.0;
            }
        }
        values
    }
}

impl EmbeddingModel for HashEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        ensure_non_blank(&[text])?;
        Ok(Embedding::new(self.vectorize(text)))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        ensure_non_blank(texts)?;
        debug!(count = texts.len(), dim = self.info.dimension, "Hash-embedding batch");
        Ok(texts
            .iter()
            .map(|t| Embedding::new(self.vectorize(t)))
            .collect())
    }
}
