//! docsearch
//!
//! Index documents and search them by meaning.
//!
//! # Usage
//!
//! ```bash
//! docsearch ingest-text notes.txt --title "Team notes"
//! docsearch ingest-pdf manual.pdf handbook.pdf
//! docsearch ingest-wiki --dir ./export 12345 67890
//! docsearch query "how do I rotate credentials" -k 3
//! docsearch status
//! docsearch merge /path/to/other/index
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/docsearch/config.toml)
//! 3. File passed with --config
//! 4. Environment variables (DOCSEARCH_*)
//! 5. CLI flags

use anyhow::Result;
use clap::Parser;

use docsearch_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
