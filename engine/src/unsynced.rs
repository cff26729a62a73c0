//! Selection of records awaiting acknowledgement.

use crate::{RecordId, SyncResult, Syncable};
use std::collections::HashSet;

/// Records with `synced == false`, in replica order.
///
/// This is exactly the candidate set for the next push.
pub fn get_unsynced_items<T>(items: &[T]) -> Vec<T>
where
    T: Syncable + Clone,
{
    items.iter().filter(|item| !item.is_synced()).cloned().collect()
}

/// Ids of `sent` records that no acknowledgement in `results` covers.
///
/// These stay unsynced and are picked up again on the next pass.
pub fn find_unacknowledged<T>(sent: &[T], results: &[SyncResult]) -> Vec<RecordId>
where
    T: Syncable,
{
    let acknowledged: HashSet<&str> = results.iter().map(|r| r.id.as_str()).collect();
    sent.iter()
        .map(|item| item.id())
        .filter(|id| !acknowledged.contains(id))
        .map(str::to_string)
        .collect()
}
