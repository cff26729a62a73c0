//! Error types for the wordsync engine.
//!
//! The reconciliation operations themselves are total functions over
//! snapshots and never fail. Errors only come from validating the inputs
//! that shape a sync pass: batch sizes, timestamps, persisted snapshots and
//! configuration. Failures of the injected remote call are never wrapped
//! here; they travel back to the caller in their own type.

use thiserror::Error;

/// All possible errors from the wordsync engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    // Batching errors
    #[error("invalid batch size: {0} (must be at least 1)")]
    InvalidBatchSize(usize),

    // Value errors
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    // Snapshot errors
    #[error("invalid snapshot: {0}")]
    InvalidSnapshot(String),

    #[error("snapshot format version mismatch: expected at most {expected}, got {actual}")]
    SnapshotVersionMismatch { expected: u32, actual: u32 },

    // Configuration errors
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
