//! # recall-storage
//!
//! Candidate record storage for recall.
//!
//! ## Features
//! - RocksDB-backed append-only candidate store with a dedicated column family
//! - Time-prefixed keys so a reverse scan yields newest-first order
//! - Keyset resume from a [`recall_vector::Cursor`]
//! - `InMemoryStore` with identical ordering for tests and ephemeral use

pub mod column_families;
pub mod db;
pub mod error;
pub mod keys;
pub mod memory;

pub use column_families::{ALL_CF_NAMES, CF_CANDIDATES};
pub use db::{Storage, StorageStats};
pub use error::StorageError;
pub use keys::CandidateKey;
pub use memory::InMemoryStore;
