//! Local store of model files fetched from HuggingFace Hub.
//!
//! Each repository gets its own directory under the cache root. Only files
//! missing from that directory are fetched, so an interrupted download
//! resumes with what is left.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::EmbeddingError;

/// Repository used when none is configured
pub const DEFAULT_MODEL_REPO: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Files of a BERT-style sentence-transformer checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPaths {
    pub config: PathBuf,
    pub tokenizer: PathBuf,
    pub weights: PathBuf,
}

impl ModelPaths {
    pub const CONFIG: &'static str = "config.json";
    pub const TOKENIZER: &'static str = "tokenizer.json";
    pub const WEIGHTS: &'static str = "model.safetensors";

    /// Every file name a checkout needs.
    pub const FILES: [&'static str; 3] = [Self::CONFIG, Self::TOKENIZER, Self::WEIGHTS];

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config: dir.join(Self::CONFIG),
            tokenizer: dir.join(Self::TOKENIZER),
            weights: dir.join(Self::WEIGHTS),
        }
    }
}

/// Cache root plus the repository to serve from it.
#[derive(Debug, Clone)]
pub struct ModelCache {
    root: PathBuf,
    repo_id: String,
}

impl ModelCache {
    pub fn new(root: impl Into<PathBuf>, repo_id: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            repo_id: repo_id.into(),
        }
    }

    /// Cache under the platform cache directory, e.g. `~/.cache/docsearch/models`.
    pub fn in_default_location(repo_id: impl Into<String>) -> Self {
        let root = dirs::cache_dir()
            .unwrap_or_else(|| PathBuf::from(".cache"))
            .join("docsearch")
            .join("models");
        Self::new(root, repo_id)
    }

    pub fn repo_id(&self) -> &str {
        &self.repo_id
    }

    /// Last path segment of the repository id, used as the model name
    pub fn model_name(&self) -> &str {
        self.repo_id.rsplit('/').next().unwrap_or(&self.repo_id)
    }

    /// `org/name` is stored as `<root>/org_name`
    pub fn model_dir(&self) -> PathBuf {
        self.root.join(self.repo_id.replace('/', "_"))
    }

    pub fn paths(&self) -> ModelPaths {
        ModelPaths::in_dir(&self.model_dir())
    }

    /// Required files not yet present locally.
    pub fn missing_files(&self) -> Vec<&'static str> {
        let dir = self.model_dir();
        ModelPaths::FILES
            .into_iter()
            .filter(|name| !dir.join(name).is_file())
            .collect()
    }

    /// Return local paths, fetching whatever is missing first.
    pub fn ensure_files(&self) -> Result<ModelPaths, EmbeddingError> {
        let missing = self.missing_files();
        if missing.is_empty() {
            debug!(path = ?self.model_dir(), "Model files already cached");
        } else {
            self.fetch(&missing)?;
        }
        Ok(self.paths())
    }

    fn fetch(&self, files: &[&str]) -> Result<(), EmbeddingError> {
        let api = hf_hub::api::sync::Api::new().map_err(|e| EmbeddingError::Download(e.to_string()))?;
        let repo = api.model(self.repo_id.clone());
        let dir = self.model_dir();
        fs::create_dir_all(&dir)?;

        info!(repo = %self.repo_id, count = files.len(), "Fetching model files");
        for &name in files {
            let downloaded = repo
                .get(name)
                .map_err(|e| EmbeddingError::Download(format!("{}: {}", name, e)))?;
            fs::copy(&downloaded, dir.join(name))?;
            debug!(file = name, "Cached model file");
        }
        Ok(())
    }
}
