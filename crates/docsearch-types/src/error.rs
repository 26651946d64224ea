//! Error types shared across docsearch crates.

use thiserror::Error;

/// Error type for configuration and shared-type operations.
#[derive(Debug, Error)]
pub enum DocSearchError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
