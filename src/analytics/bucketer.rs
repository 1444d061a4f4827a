use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

use super::LogEntry;

// ─── Configuration ───────────────────────────────────────────────

/// Default group size for fixed-batch mode.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Auto span aims for roughly this many points across the log.
const AUTO_SPAN_TARGET_POINTS: i64 = 24;

// ─── Public types ────────────────────────────────────────────────

/// How entries are grouped before aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BucketMode {
    /// Calendar hours. `span_hours > 1` folds several hours of the same
    /// day into one bucket.
    Hour { span_hours: u32 },
    /// Consecutive groups of `size` entries, ordered by timestamp.
    Batch { size: usize },
}

impl BucketMode {
    pub fn hourly() -> Self {
        Self::Hour { span_hours: 1 }
    }

    pub fn batch(size: usize) -> Self {
        Self::Batch { size: size.max(1) }
    }
}

impl Default for BucketMode {
    fn default() -> Self {
        Self::hourly()
    }
}

// ─── Helpers ─────────────────────────────────────────────────────

pub fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
}

/// Start of the hour `ts` falls into, in the entry's own offset.
/// With `span_hours > 1` the hour is rounded down to a multiple of the span
/// within the calendar day.
pub fn hour_key(ts: DateTime<FixedOffset>, span_hours: u32) -> DateTime<FixedOffset> {
    let span = span_hours.clamp(1, 24);
    let hour = (ts.hour() / span) * span;
    ts.with_hour(hour)
        .and_then(|t| t.with_minute(0))
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Span that yields roughly 24 buckets over the entries' time range.
/// Unparsable timestamps are ignored here; the aggregator reports them.
pub fn auto_span_hours(entries: &[LogEntry]) -> u32 {
    let mut bounds: Option<(DateTime<FixedOffset>, DateTime<FixedOffset>)> = None;
    for ts in entries.iter().filter_map(|e| parse_timestamp(&e.timestamp).ok()) {
        bounds = Some(match bounds {
            Some((lo, hi)) => (lo.min(ts), hi.max(ts)),
            None => (ts, ts),
        });
    }

    let Some((first, last)) = bounds else {
        return 1;
    };

    let secs = (last - first).num_seconds();
    let hours = (secs + 3599) / 3600;
    (hours / AUTO_SPAN_TARGET_POINTS).clamp(1, 24) as u32
}
