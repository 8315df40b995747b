//! Storage seams consumed by the search engine.
//!
//! Implementations live in `recall-storage`. Both traits must be safe for
//! concurrent use: readers see append-only snapshots and records are never
//! mutated after they are written.

use serde::{Deserialize, Serialize};

use recall_types::DocType;

use crate::cursor::Cursor;
use crate::error::VectorError;
use crate::record::CandidateRecord;

/// Metadata predicates applied before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateFilter {
    pub doc_type: Option<DocType>,
    pub owner: Option<String>,
    pub model: Option<String>,
}

impl CandidateFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn with_doc_type(mut self, doc_type: DocType) -> Self {
        self.doc_type = Some(doc_type);
        self
    }

    pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Check whether a record passes every set predicate.
    pub fn matches(&self, record: &CandidateRecord) -> bool {
        if let Some(doc_type) = self.doc_type {
            if record.doc_type != doc_type {
                return false;
            }
        }
        if let Some(ref owner) = self.owner {
            if record.owner.as_deref() != Some(owner.as_str()) {
                return false;
            }
        }
        if let Some(ref model) = self.model {
            if record.model.as_deref() != Some(model.as_str()) {
                return false;
            }
        }
        true
    }
}

/// Read side of the candidate pool.
pub trait CandidateReader: Send + Sync {
    /// Fetch up to `cap` records matching `filter`, ordered by
    /// `(inserted_at desc, id desc)`.
    ///
    /// With `after` set, only records strictly after the cursor position in
    /// that order are returned.
    fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        cap: usize,
        after: Option<&Cursor>,
    ) -> Result<Vec<CandidateRecord>, VectorError>;
}

/// Append-only write side of the candidate pool.
pub trait CandidateWriter: Send + Sync {
    /// Append a record. Returns `false` if a record with the same
    /// `(inserted_at, id)` already exists.
    fn append(&self, record: CandidateRecord) -> Result<bool, VectorError>;
}
