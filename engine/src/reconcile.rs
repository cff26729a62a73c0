//! Reconciliation of a local replica against the server.
//!
//! Three pure operations over immutable snapshots:
//!
//! - [`merge_local_and_server`] is the pull path. The server snapshot wins
//!   entirely for every id it contains.
//! - [`update_local_items`] is the push path. Server acknowledgements mark
//!   the matching local records as synced.
//! - [`find_changed_items`] finds records whose sync metadata moved between
//!   two snapshots, so only those need persisting.
//!
//! # Merge policy
//!
//! "Writer" means whoever's record appears in the server snapshot passed to
//! the merge, not whoever has the later wall-clock time. A pending local edit
//! to an id the server returns is discarded. Callers push pending edits
//! before pulling; [`crate::SyncPass`] does this in the right order.
//!
//! Id uniqueness within a replica is the caller's responsibility. With
//! duplicates, lookups see the last occurrence.

use crate::{RecordId, SyncResult, Syncable, Timestamp};
use std::collections::{HashMap, HashSet};

/// Merge a local replica with a server replica.
///
/// - Ids in both: the server record, stamped synced at its `updatedAt`
/// - Ids only local: the local record unchanged
/// - Ids only on the server: appended as synced server records
///
/// The result keeps local order, followed by server-only records in server
/// order, and contains each id once.
pub fn merge_local_and_server<T>(local: &[T], server: &[T]) -> Vec<T>
where
    T: Syncable + Clone,
{
    let server_by_id: HashMap<&str, &T> = server.iter().map(|r| (r.id(), r)).collect();
    let local_ids: HashSet<&str> = local.iter().map(|r| r.id()).collect();

    let mut merged = Vec::with_capacity(local.len() + server.len());
    let mut replaced = 0usize;

    for record in local {
        match server_by_id.get(record.id()) {
            Some(server_record) => {
                replaced += 1;
                merged.push(adopt_server_record(*server_record));
            }
            None => merged.push(record.clone()),
        }
    }

    let mut added: HashSet<&str> = HashSet::new();
    for record in server {
        let id = record.id();
        if local_ids.contains(id) || !added.insert(id) {
            continue;
        }
        // Last occurrence wins for duplicated server ids
        let winner = server_by_id.get(id).copied().unwrap_or(record);
        merged.push(adopt_server_record(winner));
    }

    tracing::debug!(
        "Merged {} local and {} server records: {} replaced, {} added",
        local.len(),
        server.len(),
        replaced,
        added.len()
    );

    merged
}

/// Clone a server record with its timestamps aligned to the server's.
fn adopt_server_record<T>(record: &T) -> T
where
    T: Syncable + Clone,
{
    let mut adopted = record.clone();
    let updated_at = adopted.sync_metadata().effective_updated_at();
    adopted.sync_metadata_mut().acknowledge(updated_at);
    adopted
}

/// Records in `final_items` that are new or whose sync metadata changed.
///
/// Only `synced`, `updatedAt` and `locallyUpdatedAt` are compared. A payload
/// change without a metadata change is not reported.
pub fn find_changed_items<T>(original: &[T], final_items: &[T]) -> Vec<T>
where
    T: Syncable + Clone,
{
    let original_by_id: HashMap<&str, &T> = original.iter().map(|r| (r.id(), r)).collect();

    final_items
        .iter()
        .filter(|record| match original_by_id.get(record.id()) {
            Some(before) => before.sync_metadata() != record.sync_metadata(),
            None => true,
        })
        .cloned()
        .collect()
}

/// Apply server acknowledgements to a local replica.
///
/// Every record with an acknowledgement becomes synced with both timestamps
/// set to the acknowledged time. All other records pass through unchanged.
pub fn update_local_items<T>(local: &[T], results: &[SyncResult]) -> Vec<T>
where
    T: Syncable + Clone,
{
    let acknowledged: HashMap<&str, Timestamp> = results
        .iter()
        .map(|result| (result.id.as_str(), result.updated_at))
        .collect();

    local
        .iter()
        .map(|record| {
            let mut updated = record.clone();
            if let Some(updated_at) = acknowledged.get(record.id()) {
                updated.sync_metadata_mut().acknowledge(*updated_at);
            }
            updated
        })
        .collect()
}

/// Ids present in `results` but missing from `local`.
///
/// Acknowledgements for unknown ids are ignored by [`update_local_items`];
/// this lets a caller notice them.
pub fn unknown_acknowledgements<T>(local: &[T], results: &[SyncResult]) -> Vec<RecordId>
where
    T: Syncable,
{
    let local_ids: HashSet<&str> = local.iter().map(|r| r.id()).collect();
    results
        .iter()
        .filter(|result| !local_ids.contains(result.id.as_str()))
        .map(|result| result.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse_timestamp, JsonRecord, SyncMetadata, Word};

    fn ts(value: &str) -> Timestamp {
        parse_timestamp(value).unwrap()
    }

    fn record(id: &str, synced: bool, updated_at: Option<&str>, local: &str) -> JsonRecord {
        JsonRecord::new(
            id,
            serde_json::Map::new(),
            SyncMetadata {
                synced,
                updated_at: updated_at.map(ts),
                locally_updated_at: ts(local),
            },
        )
    }

    fn server(id: &str, updated_at: &str) -> JsonRecord {
        let mut record = record(id, false, Some(updated_at), "1970-01-01");
        record
            .fields
            .insert("source".into(), serde_json::json!("server"));
        record
    }

    fn ids<T: Syncable>(items: &[T]) -> Vec<&str> {
        items.iter().map(|r| r.id()).collect()
    }

    #[test]
    fn merge_server_wins_and_adds() {
        let local = vec![record("a", false, Some("2024-01-01"), "2024-01-02")];
        let remote = vec![server("a", "2024-01-03"), server("b", "2024-01-01")];

        let merged = merge_local_and_server(&local, &remote);

        assert_eq!(ids(&merged), vec!["a", "b"]);
        assert_eq!(merged[0].meta, SyncMetadata::new_synced(ts("2024-01-03")));
        assert_eq!(merged[1].meta, SyncMetadata::new_synced(ts("2024-01-01")));
        assert_eq!(merged[0].field("source"), Some(&serde_json::json!("server")));
    }

    #[test]
    fn merge_keeps_local_only_records() {
        let local = vec![
            record("a", false, None, "2024-01-02"),
            record("b", true, Some("2024-01-01"), "2024-01-01"),
        ];
        let remote = vec![server("b", "2024-01-05")];

        let merged = merge_local_and_server(&local, &remote);

        assert_eq!(ids(&merged), vec!["a", "b"]);
        assert_eq!(merged[0], local[0]);
        assert_eq!(merged[1].meta.updated_at, Some(ts("2024-01-05")));
    }

    #[test]
    fn merge_discards_pending_local_edit() {
        let mut word = Word::new("w1", "perro", "dog", ts("2024-01-01"));
        word.meta.acknowledge(ts("2024-01-01"));
        word.retranslate("hound", ts("2024-01-09"));

        let mut from_server = Word::new("w1", "perro", "dog", ts("2024-01-01"));
        from_server.meta.acknowledge(ts("2024-01-02"));

        // The server copy is older than the local edit and still wins
        let merged = merge_local_and_server(&[word], &[from_server]);
        assert_eq!(merged[0].translation, "dog");
        assert!(merged[0].is_synced());
        assert_eq!(merged[0].meta.locally_updated_at, ts("2024-01-02"));
    }

    #[test]
    fn merge_server_record_without_updated_at() {
        let remote = vec![record("a", false, None, "2024-01-04")];
        let merged = merge_local_and_server(&[], &remote);
        assert_eq!(merged[0].meta, SyncMetadata::new_synced(ts("2024-01-04")));
    }

    #[test]
    fn merge_duplicate_server_ids_emitted_once() {
        let remote = vec![
            server("a", "2024-01-01"),
            server("b", "2024-01-01"),
            server("a", "2024-01-06"),
        ];
        let merged = merge_local_and_server(&[], &remote);

        assert_eq!(ids(&merged), vec!["a", "b"]);
        assert_eq!(merged[0].meta.updated_at, Some(ts("2024-01-06")));
    }

    #[test]
    fn merge_does_not_touch_inputs() {
        let local = vec![record("a", false, None, "2024-01-02")];
        let remote = vec![server("a", "2024-01-03")];
        let local_before = local.clone();
        let remote_before = remote.clone();

        let _ = merge_local_and_server(&local, &remote);

        assert_eq!(local, local_before);
        assert_eq!(remote, remote_before);
    }

    #[test]
    fn merge_empty_inputs() {
        let empty: Vec<JsonRecord> = Vec::new();
        assert!(merge_local_and_server(&empty, &empty).is_empty());
    }

    #[test]
    fn changed_detects_new_and_metadata_changes() {
        let original = vec![
            record("a", false, None, "2024-01-02"),
            record("b", true, Some("2024-01-01"), "2024-01-01"),
            record("c", true, Some("2024-01-01"), "2024-01-01"),
        ];
        let mut final_items = original.clone();
        final_items[0].meta.acknowledge(ts("2024-01-03"));
        final_items.push(record("d", true, Some("2024-01-04"), "2024-01-04"));

        let changed = find_changed_items(&original, &final_items);
        assert_eq!(ids(&changed), vec!["a", "d"]);
    }

    #[test]
    fn changed_ignores_payload_only_edits() {
        let original = vec![record("a", true, Some("2024-01-01"), "2024-01-01")];
        let mut final_items = original.clone();
        final_items[0]
            .fields
            .insert("word".into(), serde_json::json!("changed"));

        assert!(find_changed_items(&original, &final_items).is_empty());
    }

    #[test]
    fn changed_same_snapshot_is_empty() {
        let items = vec![
            record("a", false, None, "2024-01-02"),
            record("b", true, Some("2024-01-01"), "2024-01-01"),
        ];
        assert!(find_changed_items(&items, &items).is_empty());
    }

    #[test]
    fn update_marks_acknowledged_records() {
        let local = vec![
            record("a", false, None, "2024-01-02"),
            record("b", false, Some("2024-01-01"), "2024-01-03"),
            record("c", true, Some("2024-01-01"), "2024-01-01"),
        ];
        let results = vec![SyncResult::new("b", ts("2024-01-04"))];

        let updated = update_local_items(&local, &results);

        assert_eq!(updated[0], local[0]);
        assert_eq!(updated[1].meta, SyncMetadata::new_synced(ts("2024-01-04")));
        assert_eq!(updated[2], local[2]);
        // The input replica is unchanged
        assert!(!local[1].meta.synced);
    }

    #[test]
    fn update_ignores_unknown_ids() {
        let local = vec![record("a", false, None, "2024-01-02")];
        let results = vec![SyncResult::new("zzz", ts("2024-01-04"))];

        assert_eq!(update_local_items(&local, &results), local);
        assert_eq!(unknown_acknowledgements(&local, &results), vec!["zzz"]);
    }

    #[test]
    fn update_last_acknowledgement_wins() {
        let local = vec![record("a", false, None, "2024-01-02")];
        let results = vec![
            SyncResult::new("a", ts("2024-01-03")),
            SyncResult::new("a", ts("2024-01-05")),
        ];
        let updated = update_local_items(&local, &results);
        assert_eq!(updated[0].meta.updated_at, Some(ts("2024-01-05")));
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn arb_meta() -> impl Strategy<Value = SyncMetadata> {
            (any::<bool>(), prop::option::of(0i64..10_000), 0i64..10_000).prop_map(
                |(synced, updated_at, local)| SyncMetadata {
                    synced,
                    updated_at: updated_at.map(secs),
                    locally_updated_at: secs(local),
                },
            )
        }

        fn secs(value: i64) -> Timestamp {
            crate::EPOCH + chrono::Duration::seconds(value)
        }

        /// A replica with unique ids drawn from a small pool, so that local
        /// and server replicas overlap.
        fn arb_replica() -> impl Strategy<Value = Vec<JsonRecord>> {
            prop::collection::btree_map(0u8..20, arb_meta(), 0..12).prop_map(|map| {
                map.into_iter()
                    .map(|(id, meta)| {
                        JsonRecord::new(format!("r{}", id), serde_json::Map::new(), meta)
                    })
                    .collect()
            })
        }

        proptest! {
            #[test]
            fn prop_merge_idempotent(local in arb_replica(), remote in arb_replica()) {
                let once = merge_local_and_server(&local, &remote);
                let twice = merge_local_and_server(&once, &remote);
                prop_assert_eq!(once, twice);
            }

            #[test]
            fn prop_merge_complete(local in arb_replica(), remote in arb_replica()) {
                let merged = merge_local_and_server(&local, &remote);

                let expected: HashSet<&str> =
                    local.iter().chain(remote.iter()).map(|r| r.id()).collect();
                let got: HashSet<&str> = merged.iter().map(|r| r.id()).collect();

                prop_assert_eq!(merged.len(), expected.len());
                prop_assert_eq!(got, expected);
            }

            #[test]
            fn prop_merge_server_precedence(local in arb_replica(), remote in arb_replica()) {
                let merged = merge_local_and_server(&local, &remote);
                for server_record in &remote {
                    let record = merged.iter().find(|r| r.id == server_record.id).unwrap();
                    prop_assert!(record.meta.synced);
                    prop_assert_eq!(
                        record.meta.updated_at,
                        Some(server_record.meta.effective_updated_at())
                    );
                    prop_assert_eq!(&record.fields, &server_record.fields);
                }
            }

            #[test]
            fn prop_changed_symmetry(items in arb_replica()) {
                prop_assert!(find_changed_items(&items, &items).is_empty());
            }

            #[test]
            fn prop_update_then_changed_matches_acknowledged(
                items in arb_replica(),
                stamp in 20_000i64..30_000,
            ) {
                let results: Vec<SyncResult> = items
                    .iter()
                    .filter(|r| !r.meta.synced)
                    .map(|r| SyncResult::new(r.id.clone(), secs(stamp)))
                    .collect();

                let updated = update_local_items(&items, &results);
                let changed = find_changed_items(&items, &updated);

                prop_assert_eq!(changed.len(), results.len());
                prop_assert!(updated.iter().all(|r| r.meta.synced));
            }
        }
    }
}
