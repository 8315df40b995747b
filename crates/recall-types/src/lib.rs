//! # recall-types
//!
//! Shared domain types for the recall document and memory store.
//!
//! - `DocType`: what kind of record a stored vector belongs to
//! - `Metadata`: open-ended key/value payload attached to records
//! - `Settings`: layered configuration
//! - `RecallError`: configuration and input errors shared across crates
//!
//! ## Usage
//!
//! ```rust
//! use recall_types::{DocType, Settings};
//!
//! let settings = Settings::default();
//! assert_eq!(settings.search.default_limit, 10);
//! assert_eq!(DocType::Chunk.as_str(), "chunk");
//! ```

pub mod config;
pub mod doc;
pub mod error;

pub use config::{ChunkingSettings, EmbeddingSettings, SearchSettings, Settings};
pub use doc::{DocType, Metadata};
pub use error::RecallError;
