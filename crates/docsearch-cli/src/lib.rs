//! docsearch CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (ingest, query, status, merge)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{format_hit, init_logging, load_settings, run, App};
