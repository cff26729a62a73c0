//! A full push-then-pull sync pass against a remote authority.
//!
//! The pass composes the engine operations in the only order that keeps the
//! server-wins merge from discarding local work:
//!
//! 1. Select unsynced records
//! 2. Push them in batches and fold the acknowledgements back in
//! 3. Pull everything the server changed since the watermark the replica had
//!    before this pass
//! 4. Merge the pulled replica and report what changed
//!
//! Records the server did not acknowledge stay unsynced. If one of them is
//! also in the pulled replica, the merge still lets the server copy win.

use crate::{
    find_changed_items, find_latest_updated_at, find_unacknowledged, get_unsynced_items,
    merge_local_and_server, unknown_acknowledgements, update_local_items, Batcher, RecordId,
    SyncResult, Syncable, Timestamp,
};

/// The remote authority a pass talks to.
///
/// Implementations own the transport. Timeouts, cancellation and retries of
/// a single call are theirs too; an error aborts the pass.
#[allow(async_fn_in_trait)]
pub trait RemoteSync<T> {
    type Error;

    /// Persist one chunk. `None` or an empty list means nothing was
    /// acknowledged.
    async fn push(&self, chunk: Vec<T>) -> Result<Option<Vec<SyncResult>>, Self::Error>;

    /// Every record the server changed after `since`.
    async fn pull(&self, since: Timestamp) -> Result<Vec<T>, Self::Error>;
}

/// What a pass produced.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome<T> {
    /// The new local replica
    pub replica: Vec<T>,
    /// Records of `replica` that differ from the input replica and need
    /// persisting
    pub changed: Vec<T>,
    /// Acknowledgements received during the push
    pub acknowledged: Vec<SyncResult>,
    /// Pushed records the server did not acknowledge
    pub unacknowledged: Vec<RecordId>,
    /// Number of records returned by the pull
    pub pulled: usize,
    /// Bound passed to the pull
    pub pulled_since: Timestamp,
    /// Watermark of the new replica
    pub watermark: Timestamp,
}

impl<T> SyncOutcome<T> {
    /// Whether every pushed record was acknowledged.
    pub fn is_complete(&self) -> bool {
        self.unacknowledged.is_empty()
    }
}

/// Runs the sync cycle with a given batcher.
#[derive(Debug, Clone, Copy, Default)]
pub struct SyncPass {
    batcher: Batcher,
}

impl SyncPass {
    pub fn new(batcher: Batcher) -> Self {
        Self { batcher }
    }

    pub fn batcher(&self) -> &Batcher {
        &self.batcher
    }

    /// Push pending records of `local`, then pull and merge.
    ///
    /// The pull is bounded by the watermark of the records `local` already
    /// had acknowledged, taken before pushing. Acknowledgements from this
    /// pass would skip writes other devices made in between, and pending
    /// device times never bound a server query. The pull therefore also
    /// returns this pass's own pushes. The first remote error aborts the
    /// pass; `local` is never modified.
    pub async fn run<T, R>(&self, local: &[T], remote: &R) -> Result<SyncOutcome<T>, R::Error>
    where
        T: Syncable + Clone,
        R: RemoteSync<T>,
    {
        let pulled_since = find_latest_updated_at(local.iter().filter(|r| r.is_synced()));
        let pending = get_unsynced_items(local);
        tracing::debug!("Pushing {} of {} records", pending.len(), local.len());

        let acknowledged = self
            .batcher
            .run(&pending, move |chunk| remote.push(chunk))
            .await?;
        let unacknowledged = find_unacknowledged(&pending, &acknowledged);
        let unknown = unknown_acknowledgements(local, &acknowledged);
        if !unknown.is_empty() {
            tracing::warn!("Server acknowledged {} unknown records: {:?}", unknown.len(), unknown);
        }
        let pushed = update_local_items(local, &acknowledged);

        let server = remote.pull(pulled_since).await?;
        tracing::debug!("Pulled {} records since {}", server.len(), pulled_since);

        let replica = merge_local_and_server(&pushed, &server);
        let changed = find_changed_items(local, &replica);
        let watermark = find_latest_updated_at(&replica);

        if unacknowledged.is_empty() {
            tracing::info!(
                "Sync pass complete: {} pushed, {} pulled, {} changed",
                acknowledged.len(),
                server.len(),
                changed.len()
            );
        } else {
            tracing::warn!(
                "Sync pass left {} of {} records unacknowledged",
                unacknowledged.len(),
                pending.len()
            );
        }

        Ok(SyncOutcome {
            replica,
            changed,
            acknowledged,
            unacknowledged,
            pulled: server.len(),
            pulled_since,
            watermark,
        })
    }
}
