//! Pull handler - serves records changed since a watermark.

use crate::error::Result;
use crate::store::RecordStore;
use serde::{Deserialize, Serialize};
use wordsync_engine::{find_latest_updated_at, parse_timestamp, JsonRecord, Timestamp};

/// Query parameters for pull sync.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullQuery {
    /// Watermark from the client's last pull (absent for initial sync)
    pub since: Option<String>,
}

/// Response for pull sync.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Records changed after `since`, oldest first
    pub records: Vec<JsonRecord>,
    /// Latest `updatedAt` among the returned records
    pub watermark: Timestamp,
}

/// Process a pull request from a client.
pub fn handle_pull(store: &RecordStore, collection: &str, query: PullQuery) -> Result<PullResponse> {
    let since = query
        .since
        .as_deref()
        .filter(|raw| !raw.trim().is_empty())
        .map(parse_timestamp)
        .transpose()?;

    let records = store.changed_since(collection, since);
    let watermark = find_latest_updated_at(&records);

    Ok(PullResponse { records, watermark })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use wordsync_engine::{SyncMetadata, EPOCH};

    fn seed(store: &RecordStore, id: &str) -> Timestamp {
        let record = JsonRecord::new(
            id,
            serde_json::Map::new(),
            SyncMetadata::new_local(EPOCH),
        );
        store.upsert("words", record).unwrap().updated_at
    }

    #[test]
    fn initial_pull_returns_everything() {
        let store = RecordStore::new();
        seed(&store, "w1");
        let last = seed(&store, "w2");

        let response = handle_pull(&store, "words", PullQuery::default()).unwrap();
        assert_eq!(response.records.len(), 2);
        assert_eq!(response.watermark, last);
    }

    #[test]
    fn incremental_pull() {
        let store = RecordStore::new();
        let first = seed(&store, "w1");
        seed(&store, "w2");

        let query = PullQuery {
            since: Some(first.to_rfc3339()),
        };
        let response = handle_pull(&store, "words", query).unwrap();
        assert_eq!(response.records.len(), 1);
        assert_eq!(response.records[0].id, "w2");
    }

    #[test]
    fn empty_pull_watermark_is_epoch() {
        let store = RecordStore::new();
        let response = handle_pull(&store, "words", PullQuery::default()).unwrap();
        assert!(response.records.is_empty());
        assert_eq!(response.watermark, EPOCH);
    }

    #[test]
    fn invalid_since_is_rejected() {
        let store = RecordStore::new();
        let query = PullQuery {
            since: Some("soon".to_string()),
        };
        let err = handle_pull(&store, "words", query).unwrap_err();
        assert!(matches!(err, AppError::Engine(_)));
    }
}
