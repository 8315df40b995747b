//! Deterministic embedder for tests and offline use.
//!
//! Hashes lowercase word tokens into a fixed number of buckets (signed
//! feature hashing). Texts that share words get similar vectors; no network
//! or model files are involved.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::error::EmbeddingError;
use crate::model::{ensure_text, Embedding, EmbeddingProvider, InputType, ModelInfo};

pub const MOCK_MODEL_NAME: &str = "mock-hash";

pub struct MockEmbedder {
    info: ModelInfo,
    calls: AtomicUsize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            info: ModelInfo::new(MOCK_MODEL_NAME, dimension.max(1)),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of `embed` calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Embed synchronously.
    pub fn embed_sync(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        ensure_text(text)?;
        let dim = self.info.dimension;
        let mut values = vec![0.0f64; dim];

        for word in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            let hash = fnv1a(word.to_lowercase().as_bytes());
            let bucket = (hash % dim as u64) as usize;
            let sign = if (hash >> 63) & 1 == 0 { 1.0 } else { -1.0 };
            values[bucket] += sign;
        }

        Ok(Embedding::new(values))
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    bytes
        .iter()
        .fold(OFFSET, |hash, b| (hash ^ u64::from(*b)).wrapping_mul(PRIME))
}

#[async_trait]
impl EmbeddingProvider for MockEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed(&self, text: &str, _input_type: InputType) -> Result<Embedding, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.embed_sync(text)
    }
}
