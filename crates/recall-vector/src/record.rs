//! Stored candidate records.
//!
//! A record's magnitude is computed once when the record is built for
//! writing and persisted next to the embedding. Search trusts the stored
//! value and never recomputes it; a corrupted magnitude produces wrong
//! scores without any error.

use serde::{Deserialize, Serialize};

use recall_types::{DocType, Metadata};

use crate::math::{magnitude, VectorRef};

/// A vector eligible for comparison against a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Record ID (ULID for ingested records)
    pub id: String,
    /// The embedding vector
    pub embedding: Vec<f64>,
    /// L2 norm of `embedding`, computed at write time
    pub magnitude: f64,
    /// Insertion time (ms since epoch)
    pub inserted_at: i64,
    /// Record kind
    pub doc_type: DocType,
    /// Owning user or agent, if any
    #[serde(default)]
    pub owner: Option<String>,
    /// Embedding model that produced the vector
    #[serde(default)]
    pub model: Option<String>,
    /// Document/chunk/memory metadata
    #[serde(default)]
    pub payload: Metadata,
}

impl CandidateRecord {
    /// Build a record for writing, computing its magnitude.
    pub fn new(
        id: impl Into<String>,
        embedding: Vec<f64>,
        inserted_at: i64,
        doc_type: DocType,
    ) -> Self {
        let magnitude = magnitude(&embedding);
        Self {
            id: id.into(),
            embedding,
            magnitude,
            inserted_at,
            doc_type,
            owner: None,
            model: None,
            payload: Metadata::new(),
        }
    }

    /// Rehydrate a record whose magnitude was persisted earlier.
    ///
    /// The magnitude is taken as-is.
    pub fn with_cached_magnitude(
        id: impl Into<String>,
        embedding: Vec<f64>,
        magnitude: f64,
        inserted_at: i64,
        doc_type: DocType,
    ) -> Self {
        Self {
            id: id.into(),
            embedding,
            magnitude,
            inserted_at,
            doc_type,
            owner: None,
            model: None,
            payload: Metadata::new(),
        }
    }

    /// Set owner (builder pattern).
    pub fn with_owner(mut self, owner: Option<String>) -> Self {
        self.owner = owner;
        self
    }

    /// Set embedding model (builder pattern).
    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }

    /// Set payload metadata (builder pattern).
    pub fn with_payload(mut self, payload: Metadata) -> Self {
        self.payload = payload;
        self
    }

    /// Borrow the embedding together with its cached magnitude.
    pub fn as_vector_ref(&self) -> VectorRef<'_> {
        VectorRef::with_magnitude(&self.embedding, self.magnitude)
    }

    pub fn dimension(&self) -> usize {
        self.embedding.len()
    }

    /// Serialize to JSON bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Deserialize from JSON bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
