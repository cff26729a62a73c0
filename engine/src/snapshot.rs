//! Snapshot types for handing replicas to and from persistent storage.
//!
//! The engine owns no storage. A [`ReplicaSnapshot`] is the shape the storage
//! collaborator writes and reads back: one collection's records plus the
//! watermark of the last completed pass.

use crate::{
    error::Result, find_latest_updated_at, get_unsynced_items, CollectionName, Error, RecordId,
    Syncable, Timestamp,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Version of the snapshot format for future compatibility.
pub const SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// A point-in-time replica of one collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicaSnapshot<T> {
    /// Snapshot format version
    pub format_version: u32,
    /// Name of the collection, e.g. `words`
    pub collection: CollectionName,
    /// Watermark of the last completed sync pass
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_synced_at: Option<Timestamp>,
    /// Records in replica order
    pub records: Vec<T>,
}

impl<T> ReplicaSnapshot<T> {
    /// Create a snapshot that has never been synced.
    pub fn new(collection: impl Into<CollectionName>, records: Vec<T>) -> Self {
        Self {
            format_version: SNAPSHOT_FORMAT_VERSION,
            collection: collection.into(),
            last_synced_at: None,
            records,
        }
    }

    pub fn with_last_synced_at(mut self, last_synced_at: Timestamp) -> Self {
        self.last_synced_at = Some(last_synced_at);
        self
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }
}

impl<T: Syncable + Clone> ReplicaSnapshot<T> {
    /// Replace the records after a sync pass and advance the watermark.
    ///
    /// Only acknowledged records count, so a pending record's device time
    /// never becomes the bound of a server query.
    pub fn replace_records(&mut self, records: Vec<T>) {
        self.last_synced_at = Some(find_latest_updated_at(
            records.iter().filter(|record| record.is_synced()),
        ));
        self.records = records;
    }

    /// Records still waiting for acknowledgement.
    pub fn unsynced(&self) -> Vec<T> {
        get_unsynced_items(&self.records)
    }

    /// Records keyed by id.
    ///
    /// Uses BTreeMap for deterministic ordering. With duplicate ids the last
    /// occurrence wins.
    pub fn into_map(self) -> BTreeMap<RecordId, T> {
        self.records
            .into_iter()
            .map(|record| (record.id().to_string(), record))
            .collect()
    }

    /// Check that every record has a non-empty, unique id.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.records.len());
        for record in &self.records {
            let id = record.id();
            if id.trim().is_empty() {
                return Err(Error::InvalidRecord(format!(
                    "empty id in collection {}",
                    self.collection
                )));
            }
            if !seen.insert(id) {
                return Err(Error::InvalidRecord(format!(
                    "duplicate id {} in collection {}",
                    id, self.collection
                )));
            }
        }
        Ok(())
    }
}

impl<T: Serialize> ReplicaSnapshot<T> {
    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }

    /// Serialize to pretty JSON.
    pub fn to_json_pretty(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::InvalidSnapshot(e.to_string()))
    }
}

impl<T: DeserializeOwned> ReplicaSnapshot<T> {
    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let snapshot: Self =
            serde_json::from_str(json).map_err(|e| Error::InvalidSnapshot(e.to_string()))?;

        // Validate format version
        if snapshot.format_version > SNAPSHOT_FORMAT_VERSION {
            return Err(Error::SnapshotVersionMismatch {
                expected: SNAPSHOT_FORMAT_VERSION,
                actual: snapshot.format_version,
            });
        }

        Ok(snapshot)
    }
}
