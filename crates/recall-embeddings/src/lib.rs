//! # recall-embeddings
//!
//! Embedding providers for recall.
//!
//! Search consumes vectors only; this crate is how callers and the ingestion
//! pipeline obtain them.
//!
//! ## Features
//! - `EmbeddingProvider` trait (async, batch-capable)
//! - Voyage AI HTTP client with an injected exponential-backoff `RetryPolicy`
//! - `EmbeddingCache`: LRU-bounded, per-entry TTL, explicit sweep, injectable clock
//! - `MockEmbedder`: deterministic feature-hashing embedder for tests and offline runs

pub mod cache;
pub mod error;
pub mod mock;
pub mod model;
pub mod retry;
pub mod voyage;

pub use cache::{CachedEmbedder, Clock, EmbeddingCache, ManualClock, SystemClock};
pub use error::EmbeddingError;
pub use mock::{MockEmbedder, MOCK_MODEL_NAME};
pub use model::{Embedding, EmbeddingProvider, InputType, ModelInfo};
pub use retry::RetryPolicy;
pub use voyage::{VoyageConfig, VoyageEmbedder, VOYAGE_BASE_URL};
