//! Record kinds and payload metadata.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RecallError;

/// Free-form metadata attached to stored records.
///
/// The schema is documented per use site, not type-checked. Ingestion writes
/// `document_id`, `title`, `chunk_index` and `text` for chunks, and
/// `memory_type` and `text` for memories.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// Kind of record a stored vector belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocType {
    /// Whole-document embedding
    Document,
    /// Chunk of an ingested document
    Chunk,
    /// Standalone memory (fact, preference, note)
    Memory,
}

impl DocType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocType::Document => "document",
            DocType::Chunk => "chunk",
            DocType::Memory => "memory",
        }
    }
}

impl fmt::Display for DocType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocType {
    type Err = RecallError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "document" => Ok(DocType::Document),
            "chunk" => Ok(DocType::Chunk),
            "memory" => Ok(DocType::Memory),
            other => Err(RecallError::InvalidInput(format!(
                "unknown doc type: {other}"
            ))),
        }
    }
}
