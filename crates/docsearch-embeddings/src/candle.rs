//! Local sentence-transformer inference on candle.
//!
//! Any BERT-style checkout with a safetensors file works. Output dimension and
//! token limit are read from the checkout's `config.json`; token embeddings are
//! mean-pooled over the attention mask and L2-normalized.

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::bert::{BertModel, Config as BertConfig};
use serde_json::Value;
use tokenizers::{PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};
use tracing::{debug, info};

use crate::cache::{ModelCache, ModelPaths};
use crate::error::EmbeddingError;
use crate::model::{ensure_non_blank, Embedding, EmbeddingModel, ModelInfo};

/// Size facts a checkout's `config.json` declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelShape {
    /// `hidden_size`, which mean pooling preserves
    pub dimension: usize,
    /// `max_position_embeddings`
    pub max_tokens: usize,
}

impl ModelShape {
    pub fn from_config(config: &Value) -> Result<Self, EmbeddingError> {
        let field = |key: &str| {
            config
                .get(key)
                .and_then(Value::as_u64)
                .filter(|v| *v > 0)
                .map(|v| v as usize)
                .ok_or_else(|| {
                    EmbeddingError::ModelNotFound(format!("config.json has no positive '{}'", key))
                })
        };
        Ok(Self {
            dimension: field("hidden_size")?,
            max_tokens: field("max_position_embeddings")?,
        })
    }
}

pub struct CandleEmbedder {
    model: BertModel,
    tokenizer: Tokenizer,
    device: Device,
    info: ModelInfo,
}

impl CandleEmbedder {
    /// Load the cached checkout, fetching missing files first.
    pub fn load(cache: &ModelCache) -> Result<Self, EmbeddingError> {
        let paths = cache.ensure_files()?;
        Self::from_files(cache.model_name(), &paths)
    }

    pub fn from_files(name: impl Into<String>, paths: &ModelPaths) -> Result<Self, EmbeddingError> {
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&paths.config)?)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Invalid config: {}", e)))?;
        let shape = ModelShape::from_config(&raw)?;
        let config: BertConfig = serde_json::from_value(raw)
            .map_err(|e| EmbeddingError::ModelNotFound(format!("Not a BERT config: {}", e)))?;

        let mut tokenizer = Tokenizer::from_file(&paths.tokenizer)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..Default::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: shape.max_tokens,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let device = Device::Cpu;
        // SAFETY: the weights file is owned by the model cache and not modified while mapped
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[paths.weights.clone()], DType::F32, &device)?
        };
        let model = BertModel::load(vb, &config)?;

        let info = ModelInfo {
            name: name.into(),
            dimension: shape.dimension,
            max_sequence_length: shape.max_tokens,
        };
        info!(model = %info.name, dim = info.dimension, max_tokens = info.max_sequence_length, "Loaded candle model");

        Ok(Self {
            model,
            tokenizer,
            device,
            info,
        })
    }

    fn encode(&self, texts: &[&str]) -> Result<(Tensor, Tensor), EmbeddingError> {
        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let seq_len = encodings.first().map_or(0, |e| e.len());
        let mut ids = Vec::with_capacity(texts.len() * seq_len);
        let mut mask = Vec::with_capacity(texts.len() * seq_len);
        for encoding in &encodings {
            if encoding.len() != seq_len {
                return Err(EmbeddingError::Tokenizer(
                    "batch encodings are not padded to one length".to_string(),
                ));
            }
            ids.extend_from_slice(encoding.get_ids());
            mask.extend_from_slice(encoding.get_attention_mask());
        }

        let shape = (texts.len(), seq_len);
        Ok((
            Tensor::from_vec(ids, shape, &self.device)?,
            Tensor::from_vec(mask, shape, &self.device)?,
        ))
    }
}

/// Average of the token vectors the mask marks as real, `[B, T, H]` to `[B, H]`.
fn mean_pool(hidden: &Tensor, mask: &Tensor) -> Result<Tensor, EmbeddingError> {
    let mask = mask.to_dtype(DType::F32)?.unsqueeze(2)?;
    let summed = hidden.broadcast_mul(&mask)?.sum(1)?;
    let counts = mask.sum(1)?.clamp(1e-9, f64::MAX)?;
    Ok(summed.broadcast_div(&counts)?)
}

impl EmbeddingModel for CandleEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        self.embed_batch(&[text])?
            .pop()
            .ok_or_else(|| EmbeddingError::ModelUnavailable("model returned no output".to_string()))
    }

    fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        ensure_non_blank(texts)?;

        let (input_ids, attention_mask) = self.encode(texts)?;
        let token_type_ids = input_ids.zeros_like()?;
        let hidden = self
            .model
            .forward(&input_ids, &token_type_ids, Some(&attention_mask))?;

        let pooled: Vec<Vec<f32>> = mean_pool(&hidden, &attention_mask)?.to_vec2()?;
        if let Some(row) = pooled.first() {
            if row.len() != self.info.dimension {
                return Err(EmbeddingError::ModelUnavailable(format!(
                    "model produced {} floats, config declares {}",
                    row.len(),
                    self.info.dimension
                )));
            }
        }

        debug!(count = pooled.len(), dim = self.info.dimension, "Embedded batch");
        Ok(pooled.into_iter().map(Embedding::new).collect())
    }
}
