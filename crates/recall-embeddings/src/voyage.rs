//! Voyage AI embedding client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EmbeddingError;
use crate::model::{ensure_text, Embedding, EmbeddingProvider, InputType, ModelInfo};
use crate::retry::RetryPolicy;

/// Default Voyage API base URL
pub const VOYAGE_BASE_URL: &str = "https://api.voyageai.com/v1";

/// Configuration for the Voyage client.
#[derive(Debug, Clone)]
pub struct VoyageConfig {
    /// API base URL (e.g., "https://api.voyageai.com/v1")
    pub base_url: String,

    /// Model to use (e.g., "voyage-3")
    pub model: String,

    /// Expected output dimensionality
    pub dimension: usize,

    /// API key
    pub api_key: SecretString,

    /// Request timeout
    pub timeout: Duration,

    pub retry: RetryPolicy,
}

impl VoyageConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, dimension: usize) -> Self {
        Self {
            base_url: VOYAGE_BASE_URL.to_string(),
            model: model.into(),
            dimension,
            api_key: SecretString::from(api_key.into()),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Serialize)]
struct EmbeddingsRequest<'a> {
    input: &'a [String],
    model: &'a str,
    input_type: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f64>,
    index: usize,
}

/// Embedding provider backed by the Voyage AI HTTP API.
pub struct VoyageEmbedder {
    client: Client,
    config: VoyageConfig,
    info: ModelInfo,
}

impl VoyageEmbedder {
    pub fn new(config: VoyageConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| EmbeddingError::Config(e.to_string()))?;
        let info = ModelInfo::new(config.model.clone(), config.dimension);

        Ok(Self {
            client,
            config,
            info,
        })
    }

    /// Make a single API request.
    async fn make_request(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        let request = EmbeddingsRequest {
            input: texts,
            model: &self.config.model,
            input_type: input_type.as_str(),
        };

        let url = format!("{}/embeddings", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .header(
                "Authorization",
                format!("Bearer {}", self.config.api_key.expose_secret()),
            )
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(EmbeddingError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let mut body: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::Parse(e.to_string()))?;

        if body.data.len() != texts.len() {
            return Err(EmbeddingError::Parse(format!(
                "expected {} embeddings, got {}",
                texts.len(),
                body.data.len()
            )));
        }

        body.data.sort_by_key(|d| d.index);
        body.data
            .into_iter()
            .map(|d| {
                if d.embedding.len() != self.info.dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.info.dimension,
                        actual: d.embedding.len(),
                    });
                }
                Ok(Embedding::new(d.embedding))
            })
            .collect()
    }
}

#[async_trait]
impl EmbeddingProvider for VoyageEmbedder {
    fn info(&self) -> &ModelInfo {
        &self.info
    }

    async fn embed(&self, text: &str, input_type: InputType) -> Result<Embedding, EmbeddingError> {
        let mut batch = self.embed_batch(&[text.to_string()], input_type).await?;
        batch
            .pop()
            .ok_or_else(|| EmbeddingError::Parse("No embedding in response".to_string()))
    }

    async fn embed_batch(
        &self,
        texts: &[String],
        input_type: InputType,
    ) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            ensure_text(text)?;
        }

        debug!(count = texts.len(), model = %self.info.name, "Requesting embeddings");
        let retry = self.config.retry.clone();
        retry.run(|| self.make_request(texts, input_type)).await
    }
}
