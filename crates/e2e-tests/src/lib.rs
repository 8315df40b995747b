//! End-to-end test infrastructure for recall.
//!
//! Provides a shared TestHarness and helpers for tests covering the full
//! ingest-to-search pipeline over real RocksDB storage.

use std::sync::Arc;

use rand::Rng;

use recall_embeddings::MockEmbedder;
use recall_service::{IngestPipeline, RecallService};
use recall_storage::Storage;
use recall_types::{ChunkingSettings, DocType, SearchSettings};
use recall_vector::CandidateRecord;

/// Dimension used by the harness embedder.
pub const TEST_DIMENSION: usize = 64;

/// Base timestamp for seeded records (2024-01-29 approx)
pub const BASE_TS: i64 = 1_706_540_400_000;

/// Shared test harness for E2E tests.
pub struct TestHarness {
    /// Keeps temp dir alive for the lifetime of the harness
    pub _temp_dir: tempfile::TempDir,
    /// Shared storage instance
    pub storage: Arc<Storage>,
    pub embedder: Arc<MockEmbedder>,
}

impl TestHarness {
    /// Create a new test harness with temp directory and storage.
    pub fn new() -> Self {
        let temp_dir = tempfile::TempDir::new().expect("Failed to create temp dir");
        let storage =
            Arc::new(Storage::open(temp_dir.path()).expect("Failed to open test storage"));

        Self {
            _temp_dir: temp_dir,
            storage,
            embedder: Arc::new(MockEmbedder::new(TEST_DIMENSION)),
        }
    }

    /// Service over the harness storage with the given scan cap.
    pub fn service(&self, scan_cap: usize) -> RecallService<Storage> {
        let settings = SearchSettings {
            scan_cap,
            ..SearchSettings::default()
        };
        RecallService::new(self.storage.clone(), settings)
    }

    /// Ingestion pipeline writing into the harness storage.
    pub fn pipeline(
        &self,
        chunk_size: usize,
        overlap: usize,
    ) -> IngestPipeline<MockEmbedder, Storage> {
        let chunking = ChunkingSettings {
            chunk_size,
            overlap,
            batch_size: 4,
        };
        IngestPipeline::new(self.embedder.clone(), self.storage.clone(), chunking)
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Random vector with components in [-1, 1).
pub fn random_vector(dim: usize) -> Vec<f64> {
    let mut rng = rand::rng();
    (0..dim).map(|_| rng.random_range(-1.0..1.0)).collect()
}

/// Store `count` chunk records with random embeddings, 100ms apart.
///
/// Returns the stored records oldest first.
pub fn seed_random_records(storage: &Storage, count: usize, dim: usize) -> Vec<CandidateRecord> {
    let mut records = Vec::with_capacity(count);
    for i in 0..count {
        let record = CandidateRecord::new(
            format!("rec-{i:04}"),
            random_vector(dim),
            BASE_TS + (i as i64) * 100,
            DocType::Chunk,
        );
        storage
            .put_candidate(&record)
            .expect("Failed to put candidate");
        records.push(record);
    }
    records
}
