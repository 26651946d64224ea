//! Configuration loading for docsearch.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at ~/.config/docsearch/config.toml.

use config::{Config, Environment, File};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::DocSearchError;

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbedderSettings {
    /// Provider name ("hash" or "candle")
    #[serde(default = "default_embedder_provider")]
    pub provider: String,

    /// HuggingFace repository of the candle model
    #[serde(default = "default_model_repo")]
    pub model_repo: String,

    /// Model file cache directory (platform cache dir when unset)
    #[serde(default)]
    pub cache_dir: Option<String>,

    /// Output dimension of the hash provider
    #[serde(default = "default_hash_dimension")]
    pub dimension: usize,

    /// Seed of the hash provider; part of its model identity
    #[serde(default)]
    pub seed: u64,
}

fn default_embedder_provider() -> String {
    "hash".to_string()
}

fn default_model_repo() -> String {
    "sentence-transformers/all-MiniLM-L6-v2".to_string()
}

fn default_hash_dimension() -> usize {
    384
}

impl Default for EmbedderSettings {
    fn default() -> Self {
        Self {
            provider: default_embedder_provider(),
            model_repo: default_model_repo(),
            cache_dir: None,
            dimension: default_hash_dimension(),
            seed: 0,
        }
    }
}

/// Wiki source configuration.
///
/// The API token is expected from the environment (DOCSEARCH_WIKI__API_TOKEN),
/// not from a committed config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WikiSettings {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub api_token: Option<String>,

    /// Directory of exported pages (`<page_id>.html` + optional `<page_id>.json`)
    #[serde(default)]
    pub export_dir: Option<String>,
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding the persisted vector index
    #[serde(default = "default_index_path")]
    pub index_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Maximum chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Default number of hits per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Texts per embedding call during ingestion
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub embedder: EmbedderSettings,

    #[serde(default)]
    pub wiki: WikiSettings,
}

fn default_index_path() -> String {
    ProjectDirs::from("", "", "docsearch")
        .map(|p| p.data_local_dir().join("vector-index"))
        .unwrap_or_else(|| PathBuf::from("./vector-index"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_chunk_size() -> usize {
    500
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_top_k() -> usize {
    5
}

fn default_batch_size() -> usize {
    32
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_path: default_index_path(),
            log_level: default_log_level(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            batch_size: default_batch_size(),
            embedder: EmbedderSettings::default(),
            wiki: WikiSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/docsearch/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (DOCSEARCH_*, `__` between nested keys)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, DocSearchError> {
        let config_dir = ProjectDirs::from("", "", "docsearch")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("index_path", default_index_path())
            .map_err(|e| DocSearchError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| DocSearchError::Config(e.to_string()))?
            .set_default("chunk_size", default_chunk_size() as i64)
            .map_err(|e| DocSearchError::Config(e.to_string()))?
            .set_default("chunk_overlap", default_chunk_overlap() as i64)
            .map_err(|e| DocSearchError::Config(e.to_string()))?
            .set_default("top_k", default_top_k() as i64)
            .map_err(|e| DocSearchError::Config(e.to_string()))?
            .set_default("embedder.provider", default_embedder_provider())
            .map_err(|e| DocSearchError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // DOCSEARCH_CHUNK_SIZE, DOCSEARCH_EMBEDDER__PROVIDER, DOCSEARCH_WIKI__URL, ...
        builder = builder.add_source(
            Environment::with_prefix("DOCSEARCH")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| DocSearchError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| DocSearchError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Reject parameter combinations the chunker and search cannot honor.
    pub fn validate(&self) -> Result<(), DocSearchError> {
        if self.chunk_size == 0 {
            return Err(DocSearchError::Config("chunk_size must be > 0".to_string()));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DocSearchError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.top_k == 0 {
            return Err(DocSearchError::Config("top_k must be > 0".to_string()));
        }
        if self.batch_size == 0 {
            return Err(DocSearchError::Config("batch_size must be > 0".to_string()));
        }
        Ok(())
    }

    /// Expand ~ in index_path to the user's home directory
    pub fn expanded_index_path(&self) -> PathBuf {
        expand_home(&self.index_path)
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(base) = BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(path)
}
