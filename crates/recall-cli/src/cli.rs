//! CLI argument parsing for the recall binary.
//!
//! CLI flags override all other config sources.

use clap::{Parser, Subcommand};

/// Recall
///
/// Document and memory store with brute-force vector similarity search.
#[derive(Parser, Debug)]
#[command(name = "recall")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides default ~/.config/recall/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Override database path
    #[arg(long, global = true)]
    pub db_path: Option<String>,

    /// Override embedding provider ("voyage" or "mock")
    #[arg(long, global = true)]
    pub provider: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Chunk, embed and store documents (.md and .txt files, directories walked)
    Ingest {
        /// Files or directories
        #[arg(required = true)]
        paths: Vec<String>,

        /// Owner recorded on every stored record
        #[arg(long)]
        owner: Option<String>,
    },

    /// Store a single memory
    Remember {
        text: String,

        /// Memory category
        #[arg(short = 't', long = "type", default_value = "fact")]
        memory_type: String,

        #[arg(long)]
        owner: Option<String>,
    },

    /// Search the newest candidates for text similar to the query
    Search {
        query: String,

        /// Maximum results
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Minimum cosine similarity (inclusive)
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Only search this record type (document, chunk, memory)
        #[arg(long)]
        doc_type: Option<String>,

        #[arg(long)]
        owner: Option<String>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Search one scan window; pass the printed cursor to continue
    Page {
        query: String,

        #[arg(short = 'n', long)]
        limit: Option<usize>,

        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Cursor from the previous page
        #[arg(long)]
        cursor: Option<String>,

        /// Only scan records embedded by this model
        #[arg(long)]
        model: Option<String>,

        #[arg(long)]
        json: bool,
    },

    /// Show storage statistics
    Stats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_ingest_paths() {
        let cli = Cli::parse_from(["recall", "ingest", "notes/", "todo.md", "--owner", "alice"]);
        match cli.command {
            Commands::Ingest { paths, owner } => {
                assert_eq!(paths, vec!["notes/", "todo.md"]);
                assert_eq!(owner.as_deref(), Some("alice"));
            }
            _ => panic!("Expected Ingest command"),
        }
    }

    #[test]
    fn test_cli_ingest_requires_path() {
        assert!(Cli::try_parse_from(["recall", "ingest"]).is_err());
    }

    #[test]
    fn test_cli_remember_default_type() {
        let cli = Cli::parse_from(["recall", "remember", "likes tea"]);
        match cli.command {
            Commands::Remember {
                text, memory_type, ..
            } => {
                assert_eq!(text, "likes tea");
                assert_eq!(memory_type, "fact");
            }
            _ => panic!("Expected Remember command"),
        }
    }

    #[test]
    fn test_cli_search_options() {
        let cli = Cli::parse_from([
            "recall",
            "search",
            "borrow checker",
            "-n",
            "5",
            "--threshold",
            "-0.2",
            "--doc-type",
            "memory",
        ]);
        match cli.command {
            Commands::Search {
                query,
                limit,
                threshold,
                doc_type,
                json,
                ..
            } => {
                assert_eq!(query, "borrow checker");
                assert_eq!(limit, Some(5));
                assert_eq!(threshold, Some(-0.2));
                assert_eq!(doc_type.as_deref(), Some("memory"));
                assert!(!json);
            }
            _ => panic!("Expected Search command"),
        }
    }

    #[test]
    fn test_cli_page_cursor() {
        let cli = Cli::parse_from(["recall", "page", "q", "--cursor", "c1:1000:abc"]);
        match cli.command {
            Commands::Page { cursor, .. } => assert_eq!(cursor.as_deref(), Some("c1:1000:abc")),
            _ => panic!("Expected Page command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::parse_from([
            "recall",
            "stats",
            "--config",
            "/path/to/config.toml",
            "--log-level",
            "debug",
            "--db-path",
            "/custom/db",
            "--provider",
            "mock",
        ]);
        assert!(matches!(cli.command, Commands::Stats));
        assert_eq!(cli.config.as_deref(), Some("/path/to/config.toml"));
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert_eq!(cli.db_path.as_deref(), Some("/custom/db"));
        assert_eq!(cli.provider.as_deref(), Some("mock"));
    }
}
