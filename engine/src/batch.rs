//! Sequential, bounded-size pushes through an injected remote call.
//!
//! The batcher is a pure sequencer. It splits records into contiguous
//! chunks, awaits the remote call for each chunk in order and concatenates
//! the acknowledgements. It never retries, never runs two chunks at once
//! and never catches the remote's error.
//!
//! A chunk answered with `None` (or an empty list) contributes nothing. The
//! caller sees the gap as records without a [`SyncResult`] and retries them
//! on the next pass.

use crate::{error::Result, Error, SyncResult};
use std::future::Future;
use std::num::NonZeroUsize;

/// Records per remote call unless the caller overrides it.
pub const DEFAULT_BATCH_SIZE: usize = 500;

/// Drives a remote-sync call over fixed-size chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batcher {
    batch_size: usize,
}

impl Default for Batcher {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl Batcher {
    /// Create a batcher with a custom chunk size.
    ///
    /// A size of zero is rejected.
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidBatchSize(batch_size));
        }
        Ok(Self { batch_size })
    }

    /// Create a batcher from a size that cannot be zero.
    pub fn with_size(batch_size: NonZeroUsize) -> Self {
        Self {
            batch_size: batch_size.get(),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Contiguous chunks of at most `batch_size` items; only the last may be
    /// smaller.
    pub fn chunks<'a, T>(&self, items: &'a [T]) -> std::slice::Chunks<'a, T> {
        items.chunks(self.batch_size)
    }

    /// Number of remote calls a push of `len` records takes.
    pub fn chunk_count(&self, len: usize) -> usize {
        len.div_ceil(self.batch_size)
    }

    /// Push `items` chunk by chunk and collect the acknowledgements.
    ///
    /// `sync_fn` is invoked exactly once per chunk, in index order, and the
    /// next chunk is only dispatched after the previous call resolved.
    /// Results keep chunk order. The first error aborts the remaining chunks
    /// and is returned as-is.
    pub async fn run<T, F, Fut, E>(
        &self,
        items: &[T],
        mut sync_fn: F,
    ) -> std::result::Result<Vec<SyncResult>, E>
    where
        T: Clone,
        F: FnMut(Vec<T>) -> Fut,
        Fut: Future<Output = std::result::Result<Option<Vec<SyncResult>>, E>>,
    {
        let mut results = Vec::new();
        if items.is_empty() {
            return Ok(results);
        }

        let total = self.chunk_count(items.len());
        for (index, chunk) in self.chunks(items).enumerate() {
            let sent = chunk.len();
            let acknowledged = sync_fn(chunk.to_vec()).await?.unwrap_or_default();

            if acknowledged.is_empty() {
                tracing::warn!(
                    "Chunk {}/{} acknowledged none of {} records",
                    index + 1,
                    total,
                    sent
                );
            } else if acknowledged.len() < sent {
                tracing::warn!(
                    "Chunk {}/{} acknowledged {} of {} records",
                    index + 1,
                    total,
                    acknowledged.len(),
                    sent
                );
            } else {
                tracing::debug!("Chunk {}/{} acknowledged {} records", index + 1, total, sent);
            }

            results.extend(acknowledged);
        }

        Ok(results)
    }
}

/// Push `items` through `sync_fn` in chunks of `batch_size`, or
/// [`DEFAULT_BATCH_SIZE`] when `None`.
pub async fn sync_in_batches<T, F, Fut, E>(
    items: &[T],
    sync_fn: F,
    batch_size: Option<NonZeroUsize>,
) -> std::result::Result<Vec<SyncResult>, E>
where
    T: Clone,
    F: FnMut(Vec<T>) -> Fut,
    Fut: Future<Output = std::result::Result<Option<Vec<SyncResult>>, E>>,
{
    let batcher = batch_size.map(Batcher::with_size).unwrap_or_default();
    batcher.run(items, sync_fn).await
}
