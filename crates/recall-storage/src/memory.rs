//! In-process candidate store.
//!
//! Same ordering and idempotency rules as [`crate::Storage`], backed by a
//! `BTreeMap` keyed on `(inserted_at, id)`. Used by tests and by callers that
//! do not need persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use recall_vector::{
    CandidateFilter, CandidateReader, CandidateRecord, CandidateWriter, Cursor, VectorError,
};

use crate::error::StorageError;
use crate::keys::CandidateKey;

type Key = (i64, String);

#[derive(Default)]
pub struct InMemoryStore {
    records: RwLock<BTreeMap<Key, CandidateRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<Key, CandidateRecord>>, StorageError> {
        self.records
            .read()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<Key, CandidateRecord>>, StorageError> {
        self.records
            .write()
            .map_err(|e| StorageError::Poisoned(e.to_string()))
    }

    /// Store a record. Keys are validated like [`crate::Storage`] keys, so
    /// an empty id or a timestamp outside `0..=MAX_TIMESTAMP_MS` is rejected.
    pub fn insert(&self, record: CandidateRecord) -> Result<bool, StorageError> {
        let CandidateKey { inserted_at, id } =
            CandidateKey::new(record.inserted_at, record.id.clone())?;
        let key = (inserted_at, id);
        let mut records = self.write()?;
        if records.contains_key(&key) {
            return Ok(false);
        }
        records.insert(key, record);
        Ok(true)
    }

    pub fn scan(
        &self,
        filter: &CandidateFilter,
        cap: usize,
        after: Option<&Cursor>,
    ) -> Result<Vec<CandidateRecord>, StorageError> {
        let records = self.read()?;
        let iter: Box<dyn Iterator<Item = &CandidateRecord> + '_> = match after {
            Some(cursor) => Box::new(
                records
                    .range(..(cursor.inserted_at, cursor.id.clone()))
                    .rev()
                    .map(|(_, r)| r),
            ),
            None => Box::new(records.values().rev()),
        };

        Ok(iter
            .filter(|r| filter.matches(r))
            .take(cap)
            .cloned()
            .collect())
    }

    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.read()?.is_empty())
    }
}

impl CandidateReader for InMemoryStore {
    fn fetch_candidates(
        &self,
        filter: &CandidateFilter,
        cap: usize,
        after: Option<&Cursor>,
    ) -> Result<Vec<CandidateRecord>, VectorError> {
        self.scan(filter, cap, after).map_err(VectorError::storage)
    }
}

impl CandidateWriter for InMemoryStore {
    fn append(&self, record: CandidateRecord) -> Result<bool, VectorError> {
        self.insert(record).map_err(VectorError::storage)
    }
}
