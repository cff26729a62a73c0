//! Push handler - persists records sent by clients.

use crate::error::{AppError, Result};
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use wordsync_engine::{JsonRecord, SyncResult};

/// Request body for push sync.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Records to persist, one chunk of a client batch
    pub records: Vec<JsonRecord>,
}

/// Response for push sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PushResponse {
    /// One acknowledgement per persisted record
    pub results: Vec<SyncResult>,
    /// Number of records that were not persisted
    pub skipped: usize,
}

/// Process a push request from a client.
///
/// Records with an empty id are skipped and get no acknowledgement; the
/// client keeps them unsynced.
pub fn handle_push(
    store: &RecordStore,
    max_records: usize,
    collection: &str,
    request: PushRequest,
) -> Result<PushResponse> {
    if request.records.len() > max_records {
        return Err(AppError::PushTooLarge {
            count: request.records.len(),
            limit: max_records,
        });
    }

    let mut results = Vec::with_capacity(request.records.len());
    let mut skipped = 0;

    for record in request.records {
        if record.id.trim().is_empty() {
            tracing::warn!("Skipping record with empty id in {}", collection);
            skipped += 1;
            continue;
        }
        results.push(store.upsert(collection, record)?);
    }

    tracing::debug!(
        "Persisted {} records in {} ({} skipped)",
        results.len(),
        collection,
        skipped
    );

    Ok(PushResponse { results, skipped })
}
