//! Timestamps and watermark computation.
//!
//! Timestamps are the only ordering signal the engine has. Records carry a
//! server-assigned `updatedAt` and a device-assigned `locallyUpdatedAt`; the
//! watermark is the most recent of those across a replica and bounds the next
//! incremental pull.

use crate::{error::Result, Error, Syncable, Timestamp};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};

/// Watermark of a replica that has never seen a timestamp.
pub const EPOCH: Timestamp = DateTime::<Utc>::UNIX_EPOCH;

/// Parse a timestamp from RFC 3339 or a bare `YYYY-MM-DD` date.
///
/// Dates without a time are read as midnight UTC.
pub fn parse_timestamp(value: &str) -> Result<Timestamp> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|_| Error::InvalidTimestamp(value.to_string()))
}

/// Format a timestamp as RFC 3339 in UTC with a `Z` suffix.
///
/// Sub-second digits are kept as far as they are set, so a formatted
/// watermark parses back to the same instant.
pub fn format_timestamp(timestamp: &Timestamp) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Most recent timestamp across a replica.
///
/// Each record contributes its `updatedAt`, or its `locallyUpdatedAt` when
/// the server never assigned one. An empty replica yields [`EPOCH`].
pub fn find_latest_updated_at<'a, T, I>(items: I) -> Timestamp
where
    T: Syncable + 'a,
    I: IntoIterator<Item = &'a T>,
{
    items
        .into_iter()
        .map(|item| item.sync_metadata().effective_updated_at())
        .max()
        .unwrap_or(EPOCH)
}
