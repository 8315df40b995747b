//! Vector search error types.

use thiserror::Error;

/// Boxed error from a storage collaborator, kept intact as the error source.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during vector operations.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Dimension mismatch
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Vector is empty or holds a non-finite value
    #[error("Invalid vector: {0}")]
    InvalidVector(String),

    /// Operation needs at least one vector
    #[error("Empty input: at least one vector is required")]
    EmptyInput,

    /// Pagination cursor could not be decoded
    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    /// Request parameter out of range
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Candidate fetch failed in the storage layer
    #[error("Storage error: {0}")]
    Storage(#[source] BoxError),
}

impl VectorError {
    /// Wrap a storage-layer error without altering it.
    pub fn storage(err: impl Into<BoxError>) -> Self {
        VectorError::Storage(err.into())
    }
}
