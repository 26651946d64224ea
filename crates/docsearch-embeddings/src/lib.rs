//! # docsearch-embeddings
//!
//! Text embedding for the docsearch index.
//!
//! The rest of the pipeline only depends on the [`EmbeddingModel`] trait and
//! the dimension it advertises, so backends are swapped by configuration:
//! - `hash`: deterministic feature hashing, no model files
//! - `candle`: local sentence-transformer inference, all-MiniLM-L6-v2 by default

pub mod cache;
pub mod candle;
pub mod error;
pub mod hash;
pub mod model;

use std::path::PathBuf;
use std::sync::Arc;

use docsearch_types::EmbedderSettings;
use tracing::info;

pub use crate::candle::{CandleEmbedder, ModelShape};
pub use cache::{ModelCache, ModelPaths, DEFAULT_MODEL_REPO};
pub use error::EmbeddingError;
pub use hash::HashEmbedder;
pub use model::{Embedding, EmbeddingModel, ModelInfo};

/// Build the embedder selected by configuration.
pub fn load_embedder(settings: &EmbedderSettings) -> Result<Arc<dyn EmbeddingModel>, EmbeddingError> {
    match settings.provider.as_str() {
        "hash" => {
            let embedder = HashEmbedder::with_seed(settings.dimension, settings.seed)?;
            info!(dim = settings.dimension, seed = settings.seed, "Using hash embedder");
            Ok(Arc::new(embedder))
        }
        "candle" => {
            let cache = match &settings.cache_dir {
                Some(dir) => ModelCache::new(PathBuf::from(dir), settings.model_repo.clone()),
                None => ModelCache::in_default_location(settings.model_repo.clone()),
            };
            Ok(Arc::new(CandleEmbedder::load(&cache)?))
        }
        other => Err(EmbeddingError::ModelUnavailable(format!(
            "unknown embedder provider '{}'",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_hash_embedder() {
        let settings = EmbedderSettings {
            dimension: 16,
            ..EmbedderSettings::default()
        };
        let embedder = load_embedder(&settings).unwrap();
        assert_eq!(embedder.info().dimension, 16);
    }

    #[test]
    fn test_unknown_provider() {
        let settings = EmbedderSettings {
            provider: "openai".to_string(),
            ..EmbedderSettings::default()
        };
        assert!(matches!(
            load_embedder(&settings),
            Err(EmbeddingError::ModelUnavailable(_))
        ));
    }
}
