//! Configuration loading for recall.
//!
//! Layered config: defaults -> config file -> env vars -> CLI flags.
//! The default config file lives at `~/.config/recall/config.toml`.

use config::{Config, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::RecallError;

/// Similarity search defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchSettings {
    /// Maximum results returned per query or page
    #[serde(default = "default_limit")]
    pub default_limit: usize,

    /// Minimum raw cosine similarity for a result to be kept.
    /// Range: -1.0..=1.0
    #[serde(default = "default_threshold")]
    pub default_threshold: f64,

    /// Maximum candidates scanned per query or page. This is the only
    /// latency bound on the linear scan.
    #[serde(default = "default_scan_cap")]
    pub scan_cap: usize,
}

fn default_limit() -> usize {
    10
}

fn default_threshold() -> f64 {
    0.7
}

fn default_scan_cap() -> usize {
    1000
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_threshold: default_threshold(),
            scan_cap: default_scan_cap(),
        }
    }
}

impl SearchSettings {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.default_limit == 0 {
            return Err("default_limit must be > 0".to_string());
        }
        if !(-1.0..=1.0).contains(&self.default_threshold) {
            return Err(format!(
                "default_threshold must be -1.0..=1.0, got {}",
                self.default_threshold
            ));
        }
        if self.scan_cap == 0 {
            return Err("scan_cap must be > 0".to_string());
        }
        Ok(())
    }
}

/// Embedding provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    /// Provider name ("voyage" or "mock")
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model name (e.g., "voyage-3")
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Expected embedding dimensionality for the model
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// API key (loaded from env var, not stored in config file)
    #[serde(default)]
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum attempts per embedding request, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// First retry delay in milliseconds; later delays grow exponentially
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Maximum number of cached embeddings
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// Time-to-live of a cached embedding in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

fn default_embedding_provider() -> String {
    "voyage".to_string()
}

fn default_embedding_model() -> String {
    "voyage-3".to_string()
}

fn default_dimensions() -> usize {
    1024
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    500
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimensions: default_dimensions(),
            api_key: None,
            api_base_url: None,
            timeout_secs: default_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            cache_capacity: default_cache_capacity(),
            cache_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl EmbeddingSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.dimensions == 0 {
            return Err("dimensions must be > 0".to_string());
        }
        if self.max_attempts == 0 {
            return Err("max_attempts must be > 0".to_string());
        }
        Ok(())
    }
}

/// Word-window chunking used during document ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingSettings {
    /// Words per chunk
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Words shared between consecutive chunks
    #[serde(default = "default_overlap")]
    pub overlap: usize,

    /// Chunks embedded per provider call
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

fn default_chunk_size() -> usize {
    500
}

fn default_overlap() -> usize {
    50
}

fn default_batch_size() -> usize {
    32
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            overlap: default_overlap(),
            batch_size: default_batch_size(),
        }
    }
}

impl ChunkingSettings {
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be > 0".to_string());
        }
        if self.overlap >= self.chunk_size {
            return Err(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            ));
        }
        if self.batch_size == 0 {
            return Err("batch_size must be > 0".to_string());
        }
        Ok(())
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Path to RocksDB storage directory
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub search: SearchSettings,

    #[serde(default)]
    pub embedding: EmbeddingSettings,

    #[serde(default)]
    pub chunking: ChunkingSettings,
}

fn default_db_path() -> String {
    ProjectDirs::from("", "", "recall")
        .map(|p| p.data_local_dir().join("db"))
        .unwrap_or_else(|| PathBuf::from("./data"))
        .to_string_lossy()
        .to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            log_level: default_log_level(),
            search: SearchSettings::default(),
            embedding: EmbeddingSettings::default(),
            chunking: ChunkingSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings with layered precedence:
    /// 1. Built-in defaults
    /// 2. Config file (~/.config/recall/config.toml)
    /// 3. CLI-specified config file (optional)
    /// 4. Environment variables (RECALL_*, nested with `__`)
    ///
    /// CLI flags should be applied by the caller after this returns.
    pub fn load(cli_config_path: Option<&str>) -> Result<Self, RecallError> {
        let config_dir = ProjectDirs::from("", "", "recall")
            .map(|p| p.config_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."));

        let default_config_path = config_dir.join("config");

        let mut builder = Config::builder()
            .set_default("db_path", default_db_path())
            .map_err(|e| RecallError::Config(e.to_string()))?
            .set_default("log_level", default_log_level())
            .map_err(|e| RecallError::Config(e.to_string()))?
            .add_source(File::with_name(&default_config_path.to_string_lossy()).required(false));

        if let Some(path) = cli_config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        // RECALL_DB_PATH, RECALL_SEARCH__SCAN_CAP, RECALL_EMBEDDING__MODEL, ...
        builder = builder.add_source(
            Environment::with_prefix("RECALL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| RecallError::Config(e.to_string()))?;

        let settings: Settings = config
            .try_deserialize()
            .map_err(|e| RecallError::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<(), RecallError> {
        self.search
            .validate()
            .and_then(|_| self.embedding.validate())
            .and_then(|_| self.chunking.validate())
            .map_err(RecallError::Config)
    }

    /// Expand ~ in db_path to the home directory
    pub fn expanded_db_path(&self) -> PathBuf {
        if let Some(rest) = self.db_path.strip_prefix("~/") {
            if let Some(dirs) = directories::BaseDirs::new() {
                return dirs.home_dir().join(rest);
            }
        }
        PathBuf::from(&self.db_path)
    }
}
