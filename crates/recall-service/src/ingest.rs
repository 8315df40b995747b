//! Ingestion pipeline.
//!
//! Turns documents and free-form memories into candidate records: chunk,
//! embed in batches, compute magnitudes once, append. Record ids are ULIDs
//! and `inserted_at` is strictly increasing within one pipeline, so scan
//! order matches ingestion order.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info, warn};
use ulid::Ulid;

use recall_embeddings::{Embedding, EmbeddingProvider, InputType};
use recall_types::{ChunkingSettings, DocType, Metadata};
use recall_vector::{centroid, CandidateRecord, CandidateWriter};

use crate::chunker::chunk_words;
use crate::error::ServiceError;

/// A document to split into chunks.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentInput {
    /// Caller-assigned id; a ULID is generated when `None`
    pub document_id: Option<String>,
    pub title: Option<String>,
    pub text: String,
    pub owner: Option<String>,
}

/// A single memory stored as one record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryInput {
    pub text: String,
    /// Free-form category, e.g. "fact" or "preference"
    pub memory_type: String,
    pub owner: Option<String>,
}

/// Statistics from ingesting one document
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestStats {
    pub document_id: String,
    /// Chunks produced by the chunker
    pub chunks: usize,
    /// Records appended, including the document record
    pub records_written: usize,
    /// Records the writer already held
    pub records_skipped: usize,
}

impl IngestStats {
    /// Merge another stats into this one
    pub fn merge(&mut self, other: &IngestStats) {
        self.chunks += other.chunks;
        self.records_written += other.records_written;
        self.records_skipped += other.records_skipped;
    }
}

pub struct IngestPipeline<P: ?Sized, W: ?Sized> {
    provider: Arc<P>,
    writer: Arc<W>,
    chunking: ChunkingSettings,
    last_inserted_at: AtomicI64,
}

impl<P, W> IngestPipeline<P, W>
where
    P: EmbeddingProvider + ?Sized,
    W: CandidateWriter + ?Sized,
{
    pub fn new(provider: Arc<P>, writer: Arc<W>, chunking: ChunkingSettings) -> Self {
        Self {
            provider,
            writer,
            chunking,
            last_inserted_at: AtomicI64::new(0),
        }
    }

    /// Current time in ms, bumped past the previous value if the clock
    /// has not moved.
    fn next_inserted_at(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let prev = self
            .last_inserted_at
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(now.max(last + 1))
            })
            .unwrap_or_else(|last| last);
        now.max(prev + 1)
    }

    fn model_name(&self) -> String {
        self.provider.info().name.clone()
    }

    fn append(
        &self,
        record: CandidateRecord,
        stats: &mut IngestStats,
    ) -> Result<(), ServiceError> {
        if self.writer.append(record)? {
            stats.records_written += 1;
        } else {
            stats.records_skipped += 1;
        }
        Ok(())
    }

    /// Chunk, embed and store a document.
    ///
    /// Writes one `Chunk` record per chunk and, when there is at least one
    /// chunk, a `Document` record whose embedding is the chunk centroid.
    pub async fn ingest_document(
        &self,
        input: DocumentInput,
    ) -> Result<IngestStats, ServiceError> {
        let document_id = match input.document_id {
            Some(id) if id.trim().is_empty() => {
                return Err(ServiceError::InvalidInput(
                    "document_id must not be blank".to_string(),
                ));
            }
            Some(id) => id,
            None => Ulid::new().to_string(),
        };
        let chunks = chunk_words(&input.text, self.chunking.chunk_size, self.chunking.overlap)?;
        let mut stats = IngestStats {
            document_id: document_id.clone(),
            chunks: chunks.len(),
            ..IngestStats::default()
        };

        if chunks.is_empty() {
            warn!(document_id = %document_id, "Document has no text, nothing ingested");
            return Ok(stats);
        }

        let model = self.model_name();
        let title = input.title.map(Value::String).unwrap_or(Value::Null);
        let mut embeddings: Vec<Embedding> = Vec::with_capacity(chunks.len());

        for (batch_index, batch) in chunks.chunks(self.chunking.batch_size.max(1)).enumerate() {
            let batch_embeddings = self
                .provider
                .embed_batch(batch, InputType::Document)
                .await?;
            debug!(
                document_id = %document_id,
                batch = batch_index,
                size = batch.len(),
                "Embedded chunk batch"
            );
            embeddings.extend(batch_embeddings);
        }

        if embeddings.len() != chunks.len() {
            return Err(ServiceError::InvalidInput(format!(
                "provider returned {} embeddings for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }

        for (chunk_index, (text, embedding)) in chunks.iter().zip(&embeddings).enumerate() {
            let payload = payload([
                ("document_id", json!(document_id)),
                ("title", title.clone()),
                ("chunk_index", json!(chunk_index)),
                ("text", json!(text)),
            ]);
            let record = CandidateRecord::new(
                Ulid::new().to_string(),
                embedding.values.clone(),
                self.next_inserted_at(),
                DocType::Chunk,
            )
            .with_owner(input.owner.clone())
            .with_model(Some(model.clone()))
            .with_payload(payload);
            self.append(record, &mut stats)?;
        }

        let vectors: Vec<&[f64]> = embeddings.iter().map(|e| e.values.as_slice()).collect();
        let document_vector = centroid(&vectors)?;
        let record = CandidateRecord::new(
            document_id.clone(),
            document_vector,
            self.next_inserted_at(),
            DocType::Document,
        )
        .with_owner(input.owner)
        .with_model(Some(model))
        .with_payload(payload([
            ("document_id", json!(document_id)),
            ("title", title),
            ("chunk_count", json!(chunks.len())),
        ]));
        self.append(record, &mut stats)?;

        info!(
            document_id = %stats.document_id,
            chunks = stats.chunks,
            written = stats.records_written,
            "Ingested document"
        );
        Ok(stats)
    }

    /// Embed and store a single memory. Returns the new record id.
    pub async fn remember(&self, input: MemoryInput) -> Result<String, ServiceError> {
        if input.text.trim().is_empty() {
            return Err(ServiceError::InvalidInput("memory text is empty".to_string()));
        }

        let embedding = self
            .provider
            .embed(&input.text, InputType::Document)
            .await?;
        let id = Ulid::new().to_string();
        let record = CandidateRecord::new(
            id.clone(),
            embedding.into_values(),
            self.next_inserted_at(),
            DocType::Memory,
        )
        .with_owner(input.owner)
        .with_model(Some(self.model_name()))
        .with_payload(payload([
            ("memory_type", json!(input.memory_type)),
            ("text", json!(input.text)),
        ]));

        self.writer.append(record)?;
        debug!(id = %id, "Stored memory");
        Ok(id)
    }
}

fn payload<const N: usize>(fields: [(&str, Value); N]) -> Metadata {
    fields
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
