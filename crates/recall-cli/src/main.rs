//! Recall
//!
//! Document and memory store with brute-force vector similarity search.
//!
//! # Usage
//!
//! ```bash
//! recall ingest ./notes --owner alice
//! recall remember "prefers dark mode" --type preference
//! recall search "borrow checker" --limit 5 --threshold 0.6
//! recall page "borrow checker" [--cursor CURSOR]
//! recall stats
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (~/.config/recall/config.toml)
//! 3. Environment variables (RECALL_*)
//! 4. CLI flags

use anyhow::Result;
use clap::Parser;

use recall_cli::{run, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    run(Cli::parse()).await
}
