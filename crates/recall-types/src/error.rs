//! Error types shared across the recall crates.

use thiserror::Error;

/// Unified error type for configuration and domain-level failures.
#[derive(Debug, Error)]
pub enum RecallError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
