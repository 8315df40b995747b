//! Key encoding and decoding for candidate records.
//!
//! Key format: `cand:{inserted_at_ms:013}:{id}`
//! - inserted_at_ms: milliseconds since Unix epoch, zero-padded to 13 digits
//! - id: record ID, compared bytewise
//!
//! Byte order of keys equals `(inserted_at, id)` order, so a reverse
//! iteration yields `(inserted_at desc, id desc)`.

use crate::error::StorageError;

const PREFIX: &str = "cand";

/// Largest timestamp that still fits in 13 digits
pub const MAX_TIMESTAMP_MS: i64 = 9_999_999_999_999;

/// Key for candidate storage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateKey {
    pub inserted_at: i64,
    pub id: String,
}

impl CandidateKey {
    /// Create a key, rejecting timestamps that would break lexicographic order.
    pub fn new(inserted_at: i64, id: impl Into<String>) -> Result<Self, StorageError> {
        if !(0..=MAX_TIMESTAMP_MS).contains(&inserted_at) {
            return Err(StorageError::Key(format!(
                "timestamp out of range: {inserted_at}"
            )));
        }
        let id = id.into();
        if id.is_empty() {
            return Err(StorageError::Key("record id is empty".to_string()));
        }
        Ok(Self { inserted_at, id })
    }

    /// Encode key to bytes for storage
    pub fn to_bytes(&self) -> Vec<u8> {
        format!("{}:{:013}:{}", PREFIX, self.inserted_at, self.id).into_bytes()
    }

    /// Decode key from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, StorageError> {
        let s = std::str::from_utf8(bytes)
            .map_err(|e| StorageError::Key(format!("Invalid UTF-8: {}", e)))?;

        let mut parts = s.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(PREFIX), Some(ts), Some(id)) => {
                let inserted_at: i64 = ts
                    .parse()
                    .map_err(|e| StorageError::Key(format!("Invalid timestamp: {}", e)))?;
                Self::new(inserted_at, id)
            }
            _ => Err(StorageError::Key(format!(
                "Invalid candidate key format: {}",
                s
            ))),
        }
    }
}
