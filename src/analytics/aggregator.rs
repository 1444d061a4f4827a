use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use super::bucketer::{hour_key, parse_timestamp, BucketMode};
use super::classify::StatusClass;
use super::LogEntry;

// ─── Public types ────────────────────────────────────────────────

/// Running totals for one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Counts {
    pub status_2xx: u64,
    pub status_3xx: u64,
    pub status_4xx: u64,
    pub status_5xx: u64,
    /// Sum of member response sizes (bytes)
    pub response_size: u64,
    /// Members that were classified into one of the four counters
    pub entry_count: u64,
}

impl Counts {
    fn record(&mut self, class: StatusClass, response_size: u64) {
        match class {
            StatusClass::Success => self.status_2xx += 1,
            StatusClass::Redirect => self.status_3xx += 1,
            StatusClass::ClientError => self.status_4xx += 1,
            StatusClass::ServerError => self.status_5xx += 1,
        }
        self.response_size = self.response_size.saturating_add(response_size);
        self.entry_count += 1;
    }
}

/// A bucket before ordering and labelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBucket {
    pub key: DateTime<FixedOffset>,
    pub counts: Counts,
}

/// What happened to the input during one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub entries_in: usize,
    pub entries_counted: usize,
    pub skipped_timestamp: usize,
    pub ignored_status: usize,
}

/// Output of one aggregation pass. `buckets` is in no particular order.
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub buckets: Vec<RawBucket>,
    /// Response sizes of every counted entry, for percentile summaries
    pub counted_sizes: Vec<u64>,
    pub report: RunReport,
}

// ─── Entry point ─────────────────────────────────────────────────

pub fn aggregate(entries: &[LogEntry], mode: BucketMode) -> Aggregation {
    let mut agg = Aggregation {
        report: RunReport {
            entries_in: entries.len(),
            ..RunReport::default()
        },
        ..Aggregation::default()
    };

    // Parse once; a bad timestamp only costs its own entry.
    let mut timed = Vec::with_capacity(entries.len());
    for entry in entries {
        match parse_timestamp(&entry.timestamp) {
            Ok(ts) => timed.push((ts, entry)),
            Err(e) => {
                tracing::warn!(
                    timestamp = %entry.timestamp,
                    error = %e,
                    "skipping log entry with unparsable timestamp"
                );
                agg.report.skipped_timestamp += 1;
            }
        }
    }

    match mode {
        BucketMode::Hour { span_hours } => agg.by_hour(timed, span_hours),
        BucketMode::Batch { size } => agg.by_batch(timed, size),
    }

    agg
}

// ─── Strategies ──────────────────────────────────────────────────

impl Aggregation {
    fn by_hour(&mut self, timed: Vec<(DateTime<FixedOffset>, &LogEntry)>, span_hours: u32) {
        let mut map: HashMap<DateTime<FixedOffset>, Counts> = HashMap::new();

        for (ts, entry) in timed {
            // Classify first so an uncounted entry never creates a bucket
            let Some(class) = self.classify(entry) else {
                continue;
            };
            map.entry(hour_key(ts, span_hours))
                .or_default()
                .record(class, entry.response_size);
        }

        self.buckets = map
            .into_iter()
            .map(|(key, counts)| RawBucket { key, counts })
            .collect();
    }

    fn by_batch(&mut self, mut timed: Vec<(DateTime<FixedOffset>, &LogEntry)>, size: usize) {
        // Stable: entries sharing a timestamp keep input order
        timed.sort_by_key(|(ts, _)| *ts);

        for group in timed.chunks(size.max(1)) {
            let mut counts = Counts::default();
            for (_, entry) in group {
                if let Some(class) = self.classify(entry) {
                    counts.record(class, entry.response_size);
                }
            }
            if counts.entry_count == 0 {
                continue;
            }
            // Keyed by the last member so the label reflects real data
            let Some((last_ts, _)) = group.last() else {
                continue;
            };
            self.buckets.push(RawBucket {
                key: *last_ts,
                counts,
            });
        }
    }

    fn classify(&mut self, entry: &LogEntry) -> Option<StatusClass> {
        match StatusClass::from_code(entry.status_code) {
            Some(class) => {
                self.report.entries_counted += 1;
                self.counted_sizes.push(entry.response_size);
                Some(class)
            }
            None => {
                self.report.ignored_status += 1;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: &str, status: u16, size: u64) -> LogEntry {
        LogEntry::new(ts, status, size)
    }

    #[test]
    fn same_hour_entries_collapse() {
        let agg = aggregate(
            &[
                entry("2024-01-01T10:05:00+00:00", 200, 100),
                entry("2024-01-01T10:55:00+00:00", 404, 50),
            ],
            BucketMode::hourly(),
        );
        assert_eq!(agg.buckets.len(), 1);
        let c = agg.buckets[0].counts;
        assert_eq!(c.status_2xx, 1);
        assert_eq!(c.status_4xx, 1);
        assert_eq!(c.response_size, 150);
        assert_eq!(c.entry_count, 2);
    }

    #[test]
    fn informational_status_alone_creates_no_bucket() {
        let agg = aggregate(
            &[entry("2024-01-01T10:05:00+00:00", 101, 0)],
            BucketMode::hourly(),
        );
        assert!(agg.buckets.is_empty());
        assert_eq!(agg.report.ignored_status, 1);
    }

    #[test]
    fn bad_timestamp_is_skipped_not_fatal() {
        let agg = aggregate(
            &[
                entry("yesterday-ish", 200, 10),
                entry("2024-01-01T10:05:00+00:00", 500, 20),
            ],
            BucketMode::hourly(),
        );
        assert_eq!(agg.report.skipped_timestamp, 1);
        assert_eq!(agg.report.entries_counted, 1);
        assert_eq!(agg.buckets[0].counts.status_5xx, 1);
    }

    #[test]
    fn batches_are_keyed_by_their_last_member() {
        let entries: Vec<_> = (0..25)
            .rev()
            .map(|m| entry(&format!("2024-01-01T10:{m:02}:00+00:00"), 200, 1))
            .collect();
        let agg = aggregate(&entries, BucketMode::batch(10));
        assert_eq!(agg.buckets.len(), 3);

        let mut keys: Vec<_> = agg.buckets.iter().map(|b| b.key.to_rfc3339()).collect();
        keys.sort();
        assert_eq!(
            keys,
            vec![
                "2024-01-01T10:09:00+00:00",
                "2024-01-01T10:19:00+00:00",
                "2024-01-01T10:24:00+00:00",
            ]
        );
        let sizes: u64 = agg.buckets.iter().map(|b| b.counts.entry_count).sum();
        assert_eq!(sizes, 25);
    }

    #[test]
    fn batch_of_only_uncounted_entries_is_dropped() {
        let mut entries: Vec<_> = (0..2)
            .map(|m| entry(&format!("2024-01-01T10:0{m}:00+00:00"), 101, 0))
            .collect();
        entries.push(entry("2024-01-01T10:05:00+00:00", 200, 7));
        let agg = aggregate(&entries, BucketMode::batch(2));
        assert_eq!(agg.buckets.len(), 1);
        assert_eq!(agg.buckets[0].counts.response_size, 7);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(aggregate(&[], BucketMode::hourly()).buckets.is_empty());
        assert!(aggregate(&[], BucketMode::batch(10)).buckets.is_empty());
    }
}
