//! Recall CLI library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (ingest, remember, search, page, stats)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands};
pub use commands::{
    build_embedder, collect_files, handle_ingest, handle_page, handle_remember, handle_search,
    handle_stats, init_logging, load_settings, run, App,
};
