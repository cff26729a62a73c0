//! The sync contract every record embeds.

use crate::{clock::EPOCH, RecordId, Timestamp};
use serde::{Deserialize, Serialize};

fn epoch() -> Timestamp {
    EPOCH
}

/// Timestamps and flag that track a record's sync state.
///
/// A record is *authoritative-server* when `synced` is true; in that state
/// `updated_at == Some(locally_updated_at)`. A record is *pending-local*
/// when `synced` is false; `locally_updated_at` then reflects the
/// unacknowledged edit and `updated_at` may lag behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncMetadata {
    /// Whether the server acknowledged the current revision
    #[serde(default)]
    pub synced: bool,
    /// Server-assigned revision time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
    /// Device-assigned time of the last local mutation
    #[serde(default = "epoch")]
    pub locally_updated_at: Timestamp,
}

impl SyncMetadata {
    /// Metadata for a record created on this device.
    pub fn new_local(now: Timestamp) -> Self {
        Self {
            synced: false,
            updated_at: None,
            locally_updated_at: now,
        }
    }

    /// Metadata for a record the server persisted at `updated_at`.
    pub fn new_synced(updated_at: Timestamp) -> Self {
        Self {
            synced: true,
            updated_at: Some(updated_at),
            locally_updated_at: updated_at,
        }
    }

    /// Adopt the server's canonical revision time.
    pub fn acknowledge(&mut self, updated_at: Timestamp) {
        self.synced = true;
        self.updated_at = Some(updated_at);
        self.locally_updated_at = updated_at;
    }

    /// Flag an unacknowledged local edit.
    pub fn mark_local_edit(&mut self, now: Timestamp) {
        self.synced = false;
        self.locally_updated_at = now;
    }

    /// `updated_at`, or `locally_updated_at` if the server never assigned one.
    pub fn effective_updated_at(&self) -> Timestamp {
        self.updated_at.unwrap_or(self.locally_updated_at)
    }
}

/// Any record type the engine can reconcile.
///
/// Implementors expose a stable unique id and their embedded
/// [`SyncMetadata`]. Payload fields are opaque to the engine.
pub trait Syncable {
    /// Stable unique identifier.
    fn id(&self) -> &str;

    fn sync_metadata(&self) -> &SyncMetadata;

    fn sync_metadata_mut(&mut self) -> &mut SyncMetadata;

    /// Whether the server acknowledged the current revision.
    fn is_synced(&self) -> bool {
        self.sync_metadata().synced
    }

    /// Record a local edit made at `now`.
    fn touch(&mut self, now: Timestamp) {
        self.sync_metadata_mut().mark_local_edit(now);
    }
}

/// Server acknowledgement that a record was durably persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncResult {
    /// The acknowledged record
    pub id: RecordId,
    /// The server's canonical revision time
    pub updated_at: Timestamp,
}

impl SyncResult {
    pub fn new(id: impl Into<RecordId>, updated_at: Timestamp) -> Self {
        Self {
            id: id.into(),
            updated_at,
        }
    }
}
