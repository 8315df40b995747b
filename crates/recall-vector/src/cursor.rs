//! Keyset cursor over the insertion-ordered candidate scan.
//!
//! A cursor marks the last scanned record of a page as `(inserted_at, id)`.
//! It says nothing about similarity ranking. Callers receive it as an opaque
//! string and hand it back unchanged.
//!
//! Encoded format: `c1:{inserted_at}:{id}`

use crate::error::VectorError;
use crate::record::CandidateRecord;

const CURSOR_VERSION: &str = "c1";

/// Position in the `(inserted_at desc, id desc)` scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cursor {
    pub inserted_at: i64,
    pub id: String,
}

impl Cursor {
    pub fn new(inserted_at: i64, id: impl Into<String>) -> Self {
        Self {
            inserted_at,
            id: id.into(),
        }
    }

    /// Cursor positioned at a scanned record.
    pub fn from_record(record: &CandidateRecord) -> Self {
        Self::new(record.inserted_at, record.id.clone())
    }

    /// Keyset predicate: true when `(inserted_at, id)` comes strictly after
    /// this cursor in descending scan order.
    pub fn precedes(&self, inserted_at: i64, id: &str) -> bool {
        inserted_at < self.inserted_at || (inserted_at == self.inserted_at && id < self.id.as_str())
    }

    /// Encode to the opaque string handed to callers.
    pub fn encode(&self) -> String {
        format!("{}:{}:{}", CURSOR_VERSION, self.inserted_at, self.id)
    }

    /// Decode a string produced by [`Cursor::encode`].
    pub fn decode(s: &str) -> Result<Self, VectorError> {
        let mut parts = s.splitn(3, ':');
        let (Some(version), Some(ts), Some(id)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(VectorError::InvalidCursor(format!("malformed cursor: {s}")));
        };

        if version != CURSOR_VERSION {
            return Err(VectorError::InvalidCursor(format!(
                "unsupported cursor version: {version}"
            )));
        }
        if id.is_empty() {
            return Err(VectorError::InvalidCursor("cursor id is empty".to_string()));
        }
        let inserted_at: i64 = ts
            .parse()
            .map_err(|e| VectorError::InvalidCursor(format!("invalid timestamp: {e}")))?;

        Ok(Self::new(inserted_at, id))
    }
}
