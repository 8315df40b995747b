//! Bounded embedding cache with per-entry TTL.
//!
//! The cache is an explicit value injected where needed; there is no
//! process-wide instance. Expiry is checked lazily on reads and eagerly by
//! [`EmbeddingCache::sweep_expired`]. Time comes from a [`Clock`] so tests
//! can drive expiry with [`ManualClock`].

use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use lru::LruCache;
use tracing::debug;

use crate::error::EmbeddingError;
use crate::model::{Embedding, EmbeddingProvider, InputType, ModelInfo};

/// Source of monotonic time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    base: Instant,
    offset: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset: Mutex::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut offset = self.offset.lock().expect("clock mutex poisoned");
        *offset += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + *self.offset.lock().expect("clock mutex poisoned")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    model: String,
    input_type: InputType,
    text: String,
}

struct CacheEntry {
    embedding: Embedding,
    expires_at: Instant,
}

/// LRU-bounded cache of embeddings keyed by `(model, input_type, text)`.
pub struct EmbeddingCache {
    entries: Mutex<LruCache<CacheKey, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl EmbeddingCache {
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self::with_clock(capacity, ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(capacity: usize, ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            ttl,
            clock,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<CacheKey, CacheEntry>> {
        self.entries.lock().expect("cache mutex poisoned")
    }

    fn key(model: &str, input_type: InputType, text: &str) -> CacheKey {
        CacheKey {
            model: model.to_string(),
            input_type,
            text: text.to_string(),
        }
    }

    /// Look up a live entry, dropping it if expired.
    pub fn get(&self, model: &str, input_type: InputType, text: &str) -> Option<Embedding> {
        let key = Self::key(model, input_type, text);
        let now = self.clock.now();
        let mut entries = self.lock();

        match entries.get(&key) {
            Some(entry) if entry.expires_at > now => Some(entry.embedding.clone()),
            Some(_) => {
                entries.pop(&key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, model: &str, input_type: InputType, text: &str, embedding: Embedding) {
        let entry = CacheEntry {
            embedding,
            expires_at: self.clock.now() + self.ttl,
        };
        self.lock().put(Self::key(model, input_type, text), entry);
    }

    /// Remove all expired entries. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.lock();
        let expired: Vec<CacheKey> = entries
            .iter()
            .filter(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            entries.pop(key);
        }
        if !expired.is_empty() {
            debug!(removed = expired.len(), "Swept expired embeddings");
        }
        expired.len()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Provider decorator that serves repeated texts from an [`EmbeddingCache`].
pub struct CachedEmbedder<P> {
    inner: P,
    cache: Arc<EmbeddingCache>,
}

impl<P: EmbeddingProvider> CachedEmbedder<P> {
    pub fn new(inner: P, cache: Arc<EmbeddingCache>) -> Self {
        Self { inner, cache }
    }

    pub fn cache(&self) -> &Arc<EmbeddingCache> {
        &self.cache
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbedder<P> {
    fn info(&self) -> &ModelInfo {
        self.inner.info()
    }

    async fn embed(&self, text: &str, input_type: InputType) -> Result<Embedding, EmbeddingError> {
        let model = &self.inner.info().name;
        if let Some(hit) = self.cache.get(model, input_type, text) {
            return Ok(hit);
        }
        let embedding = self.inner.embed(text, input_type).await?;
        self.cache.insert(model, input_type, text, embedding.clone());
        Ok(embedding)
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let model = &self.inner.info().name;
        let mut out: Vec<Option<Embedding>> = texts
            .iter()
            .map(|t| self.cache.get(model, input_type, t))
            .collect();

        let missing: Vec<usize> = (0..texts.len()).filter(|&i| out[i].is_none()).collect();
        if !missing.is_empty() {
            let misses: Vec<String> = missing.iter().map(|&i| texts[i].clone()).collect();
            let fresh = self.inner.embed_batch(&misses, input_type).await?;
            if fresh.len() != misses.len() {
                return Err(EmbeddingError::Parse(format!(
                    "expected {} embeddings, got {}",
                    misses.len(),
                    fresh.len()
                )));
            }
            for (i, embedding) in missing.into_iter().zip(fresh) {
                self.cache
                    .insert(model, input_type, &texts[i], embedding.clone());
                out[i] = Some(embedding);
            }
        }

        out.into_iter()
            .map(|e| e.ok_or_else(|| EmbeddingError::Parse("missing embedding".to_string())))
            .collect()
    }
}
