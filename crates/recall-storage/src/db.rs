//! RocksDB wrapper for recall storage.
//!
//! Provides:
//! - Database open with column family setup
//! - Idempotent appends of candidate records
//! - Newest-first keyset scans with metadata filtering

use std::path::Path;

use rocksdb::{Direction, IteratorMode, Options, DB};
use tracing::{debug, info};

use recall_vector::{
    CandidateFilter, CandidateReader, CandidateRecord, CandidateWriter, Cursor, VectorError,
};

use crate::column_families::{build_cf_descriptors, CF_CANDIDATES};
use crate::error::StorageError;
use crate::keys::{CandidateKey, MAX_TIMESTAMP_MS};

/// Summary of what is stored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    pub candidate_count: usize,
    pub oldest_inserted_at: Option<i64>,
    pub newest_inserted_at: Option<i64>,
}

/// Main storage interface for recall
pub struct Storage {
    db: DB,
}

impl Storage {
    /// Open storage at the given path, creating if necessary
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        info!("Opening storage at {:?}", path);

        let mut db_opts = Options::default();
        db_opts.create_if_missing(true);
        db_opts.create_missing_column_families(true);
        // Append-only workload
        db_opts.set_compaction_style(rocksdb::DBCompactionStyle::Universal);
        db_opts.set_max_background_jobs(4);

        let db = DB::open_cf_descriptors(&db_opts, path, build_cf_descriptors())?;
        Ok(Self { db })
    }

    fn candidates_cf(&self) -> Result<&rocksdb::ColumnFamily, StorageError> {
        self.db
            .cf_handle(CF_CANDIDATES)
            .ok_or_else(|| StorageError::ColumnFamilyNotFound(CF_CANDIDATES.to_string()))
    }

    /// Store a candidate record.
    ///
    /// Returns `false` if a record with the same `(inserted_at, id)` already
    /// exists; the stored record is left untouched.
    pub fn put_candidate(&self, record: &CandidateRecord) -> Result<bool, StorageError> {
        let cf = self.candidates_cf()?;
        let key = CandidateKey::new(record.inserted_at, record.id.clone())?;
        let key_bytes = key.to_bytes();

        if self.db.get_cf(cf, &key_bytes)?.is_some() {
            debug!(id = %record.id, "Candidate already exists, skipping");
            return Ok(false);
        }

        let value = serde_json::to_vec(record)?;
        self.db.put_cf(cf, &key_bytes, value)?;
        debug!(id = %record.id, inserted_at = record.inserted_at, "Stored candidate");
        Ok(true)
    }

    /// Scan candidates newest-first, keeping those that match `filter`.
    ///
    /// With `after` set, the scan resumes strictly past that position.
    /// Stops once `cap` matching records are collected.
    pub fn get_candidates(
        &self,
        filter: &CandidateFilter,
        cap: usize,
        after: Option<&Cursor>,
    ) -> Result<Vec<CandidateRecord>, StorageError> {
        let mut results = Vec::new();
        if cap == 0 {
            return Ok(results);
        }

        let seek_key;
        let mode = match after {
            None => IteratorMode::End,
            Some(cursor) if cursor.inserted_at < 0 => return Ok(results),
            Some(cursor) if cursor.inserted_at > MAX_TIMESTAMP_MS => IteratorMode::End,
            Some(cursor) => {
                seek_key = format!("cand:{:013}:{}", cursor.inserted_at, cursor.id).into_bytes();
                IteratorMode::From(&seek_key, Direction::Reverse)
            }
        };

        let cf = self.candidates_cf()?;
        for item in self.db.iterator_cf(cf, mode) {
            let (key, value) = item?;
            let key = CandidateKey::from_bytes(&key)?;
            if let Some(cursor) = after {
                if !cursor.precedes(key.inserted_at, &key.id) {
                    continue;
                }
            }

            let record: CandidateRecord = serde_json::from_slice(&value)?;
            if !filter.matches(&record) {
                continue;
            }
            results.push(record);
            if results.len() >= cap {
                break;
            }
        }

        debug!(count = results.len(), cap, "Scanned candidates");
        Ok(results)
    }

    /// Look up a record by id. Ids are not part of the key prefix, so this
    /// is a full scan.
    pub fn find_by_id(&self, id: &str) -> Result<Option<CandidateRecord>, StorageError> {
        let cf = self.candidates_cf()?;
        for item in self.db.iterator_cf(cf, IteratorMode::End) {
            let (key, value) = item?;
            if CandidateKey::from_bytes(&key)?.id == id {
                return Ok(Some(serde_json::from_slice(&value)?));
            }
        }
        Ok(None)
    }

    /// Number of stored candidates.
    pub fn count(&self) -> Result<usize, StorageError> {
        let cf = self.candidates_cf()?;
        let mut count = 0;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn stats(&self) -> Result<StorageStats, StorageError> {
        let cf = self.candidates_cf()?;
        let first_ts = |mode: IteratorMode<'static>| -> Result<Option<i64>, StorageError> {
            match self.db.iterator_cf(cf, mode).next() {
                Some(item) => {
                    let (key, _) = item?;
                    Ok(Some(CandidateKey::from_bytes(&key)?.inserted_at))
                }
                None => Ok(None),
            }
        };

        Ok(StorageStats {
            candidate_count: self.count()?,
            oldest_inserted_at: first_ts(IteratorMode::Start)?,
            newest_inserted_at: first_ts(IteratorMode::End)?,
        })
    }

    /// Flush memtables to disk
    pub fn flush(&self) -> Result<(), StorageError> {
        let cf = self.candidates_cf()?;
        self.db.flush_cf(cf)?;
        Ok(())
    }
}

impl CandidateReader for Storage {
    fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        cap: usize,
        after: Option<&Cursor>,
    ) -> Result<Vec<CandidateRecord>, VectorError> {
        self.get_candidates(filter, cap, after)
            .map_err(VectorError::storage)
    }
}

impl CandidateWriter for Storage {
    fn append(&self, record: CandidateRecord) -> Result<bool, VectorError> {
        self.put_candidate(&record).map_err(VectorError::storage)
    }
}
