//! In-memory record storage for the sync authority.
//!
//! Records are kept per collection and stamped with a server clock that
//! never goes backwards and never repeats, so `updatedAt` totally orders the
//! writes the server has accepted.
//!
//! Stamping and inserting happen under one write lock and pulls read under
//! the same lock. A pull therefore never sees a stamp while an older one is
//! still waiting to be inserted, and the newest stamp for an id is always
//! the stored one.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use wordsync_engine::{
    CollectionName, JsonRecord, RecordId, SyncResult, Syncable, Timestamp,
};

use crate::error::{AppError, Result};

/// Thread-safe store shared across handlers via `Arc`.
#[derive(Debug, Default)]
pub struct RecordStore {
    /// All records, keyed by (collection, id).
    records: DashMap<(CollectionName, RecordId), JsonRecord>,
    /// Last assigned stamp, in microseconds since the epoch.
    last_stamp: RwLock<i64>,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store wrapped in Arc for sharing.
    pub fn new_shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    // The lock guards a plain integer, so a poisoned lock is still usable.
    fn write_clock(&self) -> RwLockWriteGuard<'_, i64> {
        self.last_stamp.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read_clock(&self) -> RwLockReadGuard<'_, i64> {
        self.last_stamp.read().unwrap_or_else(|e| e.into_inner())
    }

    /// Persist a record and acknowledge it.
    ///
    /// The stored copy is marked synced at a new stamp: the wall clock,
    /// bumped past the previous stamp.
    pub fn upsert(&self, collection: &str, mut record: JsonRecord) -> Result<SyncResult> {
        let mut last_stamp = self.write_clock();
        let stamp = Utc::now().timestamp_micros().max(*last_stamp + 1);
        let updated_at = DateTime::<Utc>::from_timestamp_micros(stamp)
            .ok_or(AppError::ClockOutOfRange(stamp))?;

        record.meta.acknowledge(updated_at);
        let result = SyncResult::new(record.id.clone(), updated_at);
        self.records
            .insert((collection.to_string(), record.id.clone()), record);
        *last_stamp = stamp;

        Ok(result)
    }

    /// Records of `collection` changed after `since` (all when `None`),
    /// ordered by `updatedAt`, then id.
    pub fn changed_since(&self, collection: &str, since: Option<Timestamp>) -> Vec<JsonRecord> {
        let _clock = self.read_clock();
        let mut changed: Vec<JsonRecord> = self
            .records
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .filter(|entry| match since {
                Some(since) => entry.value().meta.effective_updated_at() > since,
                None => true,
            })
            .map(|entry| entry.value().clone())
            .collect();

        changed.sort_by(|a, b| {
            a.meta
                .effective_updated_at()
                .cmp(&b.meta.effective_updated_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        changed
    }

    /// Get a stored record.
    pub fn get(&self, collection: &str, id: &str) -> Option<JsonRecord> {
        self.records
            .get(&(collection.to_string(), id.to_string()))
            .map(|entry| entry.value().clone())
    }

    /// Number of records across all collections.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of records stored in `collection`.
    pub fn count(&self, collection: &str) -> usize {
        self.records
            .iter()
            .filter(|entry| entry.key().0 == collection)
            .count()
    }
}
