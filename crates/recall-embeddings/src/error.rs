//! Embedding error types.

use thiserror::Error;

/// Errors that can occur during embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Provider answered with HTTP 429
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Provider answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// Response body could not be interpreted
    #[error("Failed to parse response: {0}")]
    Parse(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider returned vectors of the wrong size
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl EmbeddingError {
    /// Whether a retry may succeed: transport errors, 429 and 5xx.
    pub fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::Request(_) | EmbeddingError::RateLimited => true,
            EmbeddingError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }
}
