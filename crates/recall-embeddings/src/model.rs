//! Embedding provider trait and types.
//!
//! Defines the interface for turning text into vectors. Search never calls a
//! provider directly; callers embed the query and pass the vector in.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EmbeddingError;

/// Vector embedding as returned by a provider (not normalized).
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f64>,
}

impl Embedding {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Get the embedding dimension
    pub fn dimension(&self) -> usize {
        self.values.len()
    }

    pub fn into_values(self) -> Vec<f64> {
        self.values
    }
}

/// Model information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Model name (e.g., "voyage-3")
    pub name: String,
    /// Embedding dimension
    pub dimension: usize,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
        }
    }
}

/// Whether text is embedded as a search query or as stored content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputType {
    Query,
    Document,
}

impl InputType {
    pub fn as_str(&self) -> &'static str {
        match self {
            InputType::Query => "query",
            InputType::Document => "document",
        }
    }
}

/// Trait for embedding providers.
///
/// Implementations must be thread-safe (Send + Sync) for concurrent use.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Get model information
    fn info(&self) -> &ModelInfo;

    /// Generate embedding for a single text.
    async fn embed(&self, text: &str, input_type: InputType) -> Result<Embedding, EmbeddingError>;

    /// Generate embeddings for multiple texts, in input order.
    /// Default implementation calls embed() for each text.
    async fn embed_batch(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text, input_type).await?);
        }
        Ok(out)
    }
}

#[async_trait]
impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<P> {
    fn info(&self) -> &ModelInfo {
        (**self).info()
    }

    async fn embed(&self, text: &str, input_type: InputType) -> Result<Embedding, EmbeddingError> {
        (**self).embed(text, input_type).await
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        (**self).embed_batch(texts, input_type).await
    }
}

/// Reject empty or whitespace-only input.
pub(crate) fn ensure_text(text: &str) -> Result<(), EmbeddingError> {
    if text.trim().is_empty() {
        return Err(EmbeddingError::InvalidInput("text is empty".to_string()));
    }
    Ok(())
}
