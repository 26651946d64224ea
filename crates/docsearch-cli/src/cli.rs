//! CLI argument parsing for docsearch.
//!
//! Flags given here override every other configuration source.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Document search
///
/// Index PDF files and wiki pages, then query them by meaning.
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/docsearch/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override the index directory
    #[arg(long, global = true)]
    pub index_path: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest a plain text file
    IngestText {
        /// File to read
        file: PathBuf,

        /// Document title (defaults to the file stem)
        #[arg(long)]
        title: Option<String>,

        /// Source label stored with every chunk
        #[arg(long, default_value = "text")]
        source: String,
    },

    /// Ingest PDF files, one document per page
    IngestPdf {
        /// PDF files to read
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ingest exported wiki pages
    IngestWiki {
        /// Export directory (defaults to wiki.export_dir from config)
        #[arg(short, long)]
        dir: Option<String>,

        /// Page ids to ingest
        #[arg(required = true)]
        page_ids: Vec<String>,
    },

    /// Search the index
    Query {
        /// Query text
        text: String,

        /// Number of hits (defaults to top_k from config)
        #[arg(short)]
        k: Option<usize>,
    },

    /// Show index and wiki status
    Status,

    /// Merge another persisted index into this one
    Merge {
        /// Directory of the index to merge in
        other: PathBuf,
    },
}
