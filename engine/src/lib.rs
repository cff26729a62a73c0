//! # Wordsync Engine
//!
//! A timestamp-based reconciliation engine for local-first applications.
//!
//! This crate keeps a device-local replica of mutable records (vocabulary
//! words, study sessions, evaluations, suggestions) consistent with a remote
//! authority. It tolerates offline edits, partial connectivity and
//! out-of-order writes using nothing but per-record timestamps.
//!
//! ## Design Principles
//!
//! - **No IO**: The engine never touches storage or the network. It receives
//!   replica snapshots and an injected remote-sync function.
//! - **Pure**: Every operation takes immutable input collections and returns
//!   freshly built ones. Inputs are never aliased in the output.
//! - **Deterministic**: Same inputs always produce the same outputs.
//! - **Sequential**: Batches are pushed one at a time, in order.
//!
//! ## Core Concepts
//!
//! ### Sync metadata
//!
//! Every syncable record embeds [`SyncMetadata`]:
//! - `synced` - the server acknowledged the current revision
//! - `updatedAt` - server-assigned revision time
//! - `locallyUpdatedAt` - device-assigned time of the last local edit
//!
//! Any type implementing [`Syncable`] can flow through the engine. The
//! application entities live in [`entities`].
//!
//! ### The sync cycle
//!
//! 1. [`get_unsynced_items`] selects the records awaiting acknowledgement
//! 2. [`Batcher`] pushes them in bounded chunks through the remote call
//! 3. [`update_local_items`] folds the [`SyncResult`] acknowledgements back in
//! 4. [`find_latest_updated_at`] computes the watermark for the next pull
//! 5. [`merge_local_and_server`] adopts the pulled server replica
//! 6. [`find_changed_items`] tells the caller which records to persist
//!
//! [`SyncPass`] runs the whole cycle against a [`RemoteSync`] implementation,
//! always pushing before it pulls.
//!
//! ## Merge policy
//!
//! The server always wins on a pull-merge. A local edit made after the last
//! push and before the pull is overwritten if the server returns that id.
//! Push first.
//!
//! ## Quick Start
//!
//! ```rust
//! use wordsync_engine::{
//!     find_latest_updated_at, get_unsynced_items, merge_local_and_server,
//!     parse_timestamp, update_local_items, SyncResult, Word,
//! };
//!
//! let now = parse_timestamp("2024-01-02").unwrap();
//! let local = vec![Word::new("w1", "hola", "hello", now)];
//!
//! // 1. Select what needs pushing
//! let pending = get_unsynced_items(&local);
//! assert_eq!(pending.len(), 1);
//!
//! // 2. Fold the server acknowledgement back in
//! let acked_at = parse_timestamp("2024-01-03").unwrap();
//! let local = update_local_items(&local, &[SyncResult::new("w1", acked_at)]);
//! assert!(get_unsynced_items(&local).is_empty());
//!
//! // 3. Merge what was pulled; the new watermark bounds the next pull
//! let merged = merge_local_and_server(&local, &[]);
//! assert_eq!(merged, local);
//! assert_eq!(find_latest_updated_at(&merged), acked_at);
//! ```
//!
//! ## FFI
//!
//! The [`ffi`] module exposes the pure operations as C-compatible functions
//! that exchange JSON strings of [`JsonRecord`] lists.

pub mod batch;
pub mod clock;
pub mod config;
pub mod entities;
pub mod error;
pub mod ffi;
pub mod pass;
pub mod reconcile;
pub mod record;
pub mod snapshot;
pub mod unsynced;

// Re-export main types at crate root
pub use batch::{sync_in_batches, Batcher, DEFAULT_BATCH_SIZE};
pub use clock::{find_latest_updated_at, format_timestamp, parse_timestamp, EPOCH};
pub use config::SyncConfig;
pub use entities::{Evaluation, JsonRecord, Session, Suggestion, Word};
pub use error::Error;
pub use pass::{RemoteSync, SyncOutcome, SyncPass};
pub use reconcile::{
    find_changed_items, merge_local_and_server, unknown_acknowledgements, update_local_items,
};
pub use record::{SyncMetadata, SyncResult, Syncable};
pub use snapshot::{ReplicaSnapshot, SNAPSHOT_FORMAT_VERSION};
pub use unsynced::{find_unacknowledged, get_unsynced_items};

/// Type aliases for clarity
pub type RecordId = String;
pub type CollectionName = String;
pub type Timestamp = chrono::DateTime<chrono::Utc>;
