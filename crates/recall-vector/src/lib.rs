//! # recall-vector
//!
//! Brute-force vector similarity search for recall.
//!
//! Every query is a linear scan over a bounded candidate window (default
//! 1000 records), scored by cosine similarity against magnitudes cached at
//! write time. There is no ANN index.
//!
//! ## Features
//! - Pure vector math: dot, magnitude, cosine (raw and cached-magnitude),
//!   normalization, centroid, batch similarity, top-K selection
//! - Candidate records that carry their write-time magnitude
//! - Threshold + limit ranking with a stable, newest-first tie-break
//! - Keyset cursors over the `(inserted_at desc, id desc)` scan
//! - `CandidateReader` / `CandidateWriter` seams for storage backends

pub mod cursor;
pub mod error;
pub mod math;
pub mod paginate;
pub mod record;
pub mod search;
pub mod store;

pub use cursor::Cursor;
pub use error::{BoxError, VectorError};
pub use math::{
    batch_similarity, centroid, cosine_similarity, cosine_similarity_with_magnitude, dot,
    ensure_valid_vector, euclidean_distance, magnitude, normalize, similarity_score,
    top_k_similar, validate_vector, ScoredIndex, VectorRef,
};
pub use paginate::{Page, PageRequest, DEFAULT_SCAN_CAP};
pub use record::CandidateRecord;
pub use search::{
    top_k_offline, ScoredResult, SearchEngine, SearchOptions, SearchOutcome, DEFAULT_LIMIT,
    DEFAULT_THRESHOLD,
};
pub use store::{CandidateFilter, CandidateReader, CandidateWriter};
