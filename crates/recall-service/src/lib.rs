//! # recall-service
//!
//! Operation surface for recall: similarity search, cursor-paginated
//! search, offline top-K, and the ingestion pipeline that produces
//! candidate records.

pub mod access;
pub mod chunker;
pub mod error;
pub mod ingest;
pub mod search;

pub use access::{AccessTracker, DEFAULT_MAX_TRACKED};
pub use chunker::chunk_words;
pub use error::ServiceError;
pub use ingest::{DocumentInput, IngestPipeline, IngestStats, MemoryInput};
pub use search::{
    top_k_offline, PaginatedSearchRequest, RecallService, SimilaritySearchRequest,
};
