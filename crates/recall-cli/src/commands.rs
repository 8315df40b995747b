//! Command implementations for the recall CLI.
//!
//! Every command loads settings (defaults -> file -> env -> CLI flags),
//! opens RocksDB storage and builds the configured embedder.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::DateTime;
use tracing::{info, warn};
use walkdir::WalkDir;

use recall_embeddings::{
    CachedEmbedder, EmbeddingCache, EmbeddingProvider, MockEmbedder, RetryPolicy, VoyageConfig,
    VoyageEmbedder,
};
use recall_service::{
    DocumentInput, IngestPipeline, IngestStats, MemoryInput, PaginatedSearchRequest,
    RecallService, SimilaritySearchRequest,
};
use recall_storage::{Storage, StorageStats};
use recall_types::{DocType, EmbeddingSettings, Settings};
use recall_vector::{Page, ScoredResult, SearchOutcome};

use crate::cli::{Cli, Commands};

/// Environment variable consulted when no API key is configured
pub const VOYAGE_API_KEY_ENV: &str = "VOYAGE_API_KEY";

const INGEST_EXTENSIONS: &[&str] = &["md", "markdown", "txt"];

/// Load settings and apply CLI overrides (highest precedence).
pub fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    if let Some(ref db_path) = cli.db_path {
        settings.db_path = db_path.clone();
    }
    if let Some(ref log_level) = cli.log_level {
        settings.log_level = log_level.clone();
    }
    if let Some(ref provider) = cli.provider {
        settings.embedding.provider = provider.clone();
    }
    settings.validate().context("Invalid configuration")?;
    Ok(settings)
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;
    Ok(())
}

/// Build the configured provider wrapped in an embedding cache.
pub fn build_embedder(settings: &EmbeddingSettings) -> Result<Arc<dyn EmbeddingProvider>> {
    let base: Arc<dyn EmbeddingProvider> = match settings.provider.as_str() {
        "mock" => Arc::new(MockEmbedder::new(settings.dimensions)),
        "voyage" => {
            let api_key = settings
                .api_key
                .clone()
                .or_else(|| std::env::var(VOYAGE_API_KEY_ENV).ok())
                .with_context(|| {
                    format!("Voyage API key missing: set embedding.api_key or {VOYAGE_API_KEY_ENV}")
                })?;

            let retry = RetryPolicy::default()
                .with_max_attempts(settings.max_attempts)
                .with_initial_interval(Duration::from_millis(settings.initial_backoff_ms));
            let mut config = VoyageConfig::new(api_key, &settings.model, settings.dimensions)
                .with_retry(retry)
                .with_timeout(Duration::from_secs(settings.timeout_secs));
            if let Some(ref base_url) = settings.api_base_url {
                config = config.with_base_url(base_url);
            }
            Arc::new(VoyageEmbedder::new(config).context("Failed to build Voyage client")?)
        }
        other => bail!("Unknown embedding provider: {other}"),
    };

    let cache = Arc::new(EmbeddingCache::new(
        settings.cache_capacity,
        Duration::from_secs(settings.cache_ttl_secs),
    ));
    Ok(Arc::new(CachedEmbedder::new(base, cache)))
}

/// Expand files and directories into the ingestible files they contain.
pub fn collect_files(paths: &[String]) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        for entry in WalkDir::new(path).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to read {path}"))?;
            if entry.file_type().is_dir() {
                continue;
            }
            if has_ingest_extension(entry.path()) {
                files.push(entry.into_path());
            } else if entry.depth() == 0 {
                warn!(path = %entry.path().display(), "Skipping unsupported file type");
            }
        }
    }

    Ok(files)
}

fn has_ingest_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| INGEST_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Opened storage, settings and embedder shared by all commands.
pub struct App {
    pub settings: Settings,
    pub storage: Arc<Storage>,
    pub embedder: Arc<dyn EmbeddingProvider>,
}

impl App {
    pub fn open(settings: Settings) -> Result<Self> {
        let db_path = settings.expanded_db_path();
        std::fs::create_dir_all(&db_path)
            .with_context(|| format!("Failed to create {}", db_path.display()))?;
        let storage = Storage::open(&db_path).context("Failed to open storage")?;
        let embedder = build_embedder(&settings.embedding)?;

        Ok(Self {
            settings,
            storage: Arc::new(storage),
            embedder,
        })
    }

    fn service(&self) -> RecallService<Storage> {
        RecallService::new(self.storage.clone(), self.settings.search.clone())
            .with_dimensions(self.settings.embedding.dimensions)
    }

    fn pipeline(&self) -> IngestPipeline<dyn EmbeddingProvider, Storage> {
        IngestPipeline::new(
            self.embedder.clone(),
            self.storage.clone(),
            self.settings.chunking.clone(),
        )
    }
}

pub async fn handle_ingest(
    app: &App,
    paths: &[String],
    owner: Option<String>,
) -> Result<IngestStats> {
    let files = collect_files(paths)?;
    if files.is_empty() {
        bail!("No .md or .txt files found");
    }

    let pipeline = app.pipeline();
    let mut total = IngestStats::default();
    for file in &files {
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        let title = file
            .file_name()
            .map(|name| name.to_string_lossy().to_string());

        let stats = pipeline
            .ingest_document(DocumentInput {
                document_id: None,
                title,
                text,
                owner: owner.clone(),
            })
            .await
            .with_context(|| format!("Failed to ingest {}", file.display()))?;
        info!(file = %file.display(), chunks = stats.chunks, "Ingested file");
        total.merge(&stats);
    }

    Ok(total)
}

pub async fn handle_remember(
    app: &App,
    text: String,
    memory_type: String,
    owner: Option<String>,
) -> Result<String> {
    let id = app
        .pipeline()
        .remember(MemoryInput {
            text,
            memory_type,
            owner,
        })
        .await
        .context("Failed to store memory")?;
    Ok(id)
}

pub async fn handle_search(
    app: &App,
    query: &str,
    limit: Option<usize>,
    threshold: Option<f64>,
    doc_type: Option<&str>,
    owner: Option<String>,
) -> Result<SearchOutcome> {
    let request = SimilaritySearchRequest {
        query: Vec::new(),
        doc_type: doc_type.map(DocType::from_str).transpose()?,
        owner,
        limit,
        threshold,
        model: None,
    };
    let outcome = app
        .service()
        .search_text(app.embedder.as_ref(), query, request)
        .await
        .context("Search failed")?;
    Ok(outcome)
}

pub async fn handle_page(
    app: &App,
    query: &str,
    limit: Option<usize>,
    threshold: Option<f64>,
    cursor: Option<String>,
    model: Option<String>,
) -> Result<Page> {
    let embedding = app
        .embedder
        .embed(query, recall_embeddings::InputType::Query)
        .await
        .context("Failed to embed query")?;

    let request = PaginatedSearchRequest {
        query: embedding.into_values(),
        limit,
        threshold,
        cursor,
        model,
    };
    let page = app
        .service()
        .paginated_similarity_search(&request)
        .context("Search failed")?;
    Ok(page)
}

pub fn handle_stats(app: &App) -> Result<StorageStats> {
    Ok(app.storage.stats()?)
}

fn format_timestamp(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| ms.to_string())
}

fn print_results(results: &[ScoredResult]) {
    if results.is_empty() {
        println!("No matches above threshold.");
        return;
    }
    for (rank, result) in results.iter().enumerate() {
        let preview: String = result
            .payload
            .get("text")
            .or_else(|| result.payload.get("title"))
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .chars()
            .take(80)
            .collect();
        println!(
            "{:>3}. {:.4}  {:<8} {}  {}  {}",
            rank + 1,
            result.similarity,
            result.doc_type,
            format_timestamp(result.inserted_at),
            result.id,
            preview
        );
    }
}

/// Dispatch a parsed command line.
pub async fn run(cli: Cli) -> Result<()> {
    let settings = load_settings(&cli)?;
    init_logging(&settings.log_level)?;
    let app = App::open(settings)?;

    match cli.command {
        Commands::Ingest { paths, owner } => {
            let stats = handle_ingest(&app, &paths, owner).await?;
            println!(
                "Ingested {} chunks, wrote {} records ({} already present)",
                stats.chunks, stats.records_written, stats.records_skipped
            );
        }
        Commands::Remember {
            text,
            memory_type,
            owner,
        } => {
            let id = handle_remember(&app, text, memory_type, owner).await?;
            println!("{id}");
        }
        Commands::Search {
            query,
            limit,
            threshold,
            doc_type,
            owner,
            json,
        } => {
            let outcome =
                handle_search(&app, &query, limit, threshold, doc_type.as_deref(), owner).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                print_results(&outcome.results);
                println!("({:.2} ms)", outcome.timing_ms);
            }
        }
        Commands::Page {
            query,
            limit,
            threshold,
            cursor,
            model,
            json,
        } => {
            let page = handle_page(&app, &query, limit, threshold, cursor, model).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&page)?);
            } else {
                print_results(&page.results);
                println!("Scanned {} candidates ({:.2} ms)", page.scanned, page.timing_ms);
                match page.next_cursor {
                    Some(cursor) => println!("Next cursor: {cursor}"),
                    None => println!("End of results."),
                }
            }
        }
        Commands::Stats => {
            let stats = handle_stats(&app)?;
            println!("Database:   {}", app.settings.expanded_db_path().display());
            println!("Candidates: {}", stats.candidate_count);
            if let (Some(oldest), Some(newest)) =
                (stats.oldest_inserted_at, stats.newest_inserted_at)
            {
                println!("Oldest:     {}", format_timestamp(oldest));
                println!("Newest:     {}", format_timestamp(newest));
            }
        }
    }

    Ok(())
}
