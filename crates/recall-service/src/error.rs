//! Service layer error types.

use thiserror::Error;

use recall_embeddings::EmbeddingError;
use recall_vector::VectorError;

/// Errors returned by recall operations.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Query validation, cursor, or storage failure from the search core
    #[error(transparent)]
    Vector(#[from] VectorError),

    /// Embedding provider failure
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Request parameters out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ServiceError {
    /// True when the caller sent a bad request rather than hitting a failure.
    pub fn is_invalid_request(&self) -> bool {
        match self {
            ServiceError::InvalidInput(_) => true,
            ServiceError::Vector(err) => matches!(
                err,
                VectorError::DimensionMismatch { .. }
                    | VectorError::InvalidVector(_)
                    | VectorError::EmptyInput
                    | VectorError::InvalidCursor(_)
                    | VectorError::InvalidInput(_)
            ),
            ServiceError::Embedding(EmbeddingError::InvalidInput(_)) => true,
            ServiceError::Embedding(_) => false,
        }
    }
}
