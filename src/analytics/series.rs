use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer};

use super::aggregator::{aggregate, Counts, RawBucket};
use super::bucketer::BucketMode;
use super::percentiles::SizePercentiles;
use super::LogEntry;

pub use super::aggregator::RunReport;

/// Axis label pattern, e.g. "Jan 5 14:00".
const LABEL_FORMAT: &str = "%b %-d %H:%M";

// ─── Public types ────────────────────────────────────────────────

/// One point on the status chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    /// Same spelling as `LogEntry::timestamp` ("+00:00", never "Z")
    #[serde(serialize_with = "rfc3339")]
    pub key: DateTime<FixedOffset>,
    pub label: String,
    pub status_2xx: u64,
    pub status_3xx: u64,
    pub status_4xx: u64,
    pub status_5xx: u64,
    pub response_size: u64,
    pub entry_count: u64,
}

impl Bucket {
    fn labelled(raw: RawBucket) -> Self {
        let Counts {
            status_2xx,
            status_3xx,
            status_4xx,
            status_5xx,
            response_size,
            entry_count,
        } = raw.counts;
        Self {
            label: raw.key.format(LABEL_FORMAT).to_string(),
            key: raw.key,
            status_2xx,
            status_3xx,
            status_4xx,
            status_5xx,
            response_size,
            entry_count,
        }
    }

    pub fn requests(&self) -> u64 {
        self.status_2xx + self.status_3xx + self.status_4xx + self.status_5xx
    }
}

fn rfc3339<S: Serializer>(key: &DateTime<FixedOffset>, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_str(&key.to_rfc3339())
}

/// Totals over the whole series, as shown on the summary cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total_requests: u64,
    pub success: u64,
    pub redirects: u64,
    pub client_errors: u64,
    pub server_errors: u64,
    pub total_bytes: u64,
    /// Percent of requests that were 2xx, 0 when there were none
    pub success_rate: f64,
}

impl Summary {
    pub fn from_buckets(buckets: &[Bucket]) -> Self {
        let mut s = buckets.iter().fold(Self::default(), |mut acc, b| {
            acc.success += b.status_2xx;
            acc.redirects += b.status_3xx;
            acc.client_errors += b.status_4xx;
            acc.server_errors += b.status_5xx;
            acc.total_requests += b.requests();
            acc.total_bytes = acc.total_bytes.saturating_add(b.response_size);
            acc
        });
        if s.total_requests > 0 {
            s.success_rate = s.success as f64 * 100.0 / s.total_requests as f64;
        }
        s
    }
}

/// Complete payload for the dashboard chart.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    #[serde(flatten)]
    pub mode: BucketMode,
    pub buckets: Vec<Bucket>,
    pub summary: Summary,
    pub response_sizes: SizePercentiles,
    pub report: RunReport,
}

// ─── Builder ─────────────────────────────────────────────────────

/// Runs the whole pipeline over `entries`. Pure: same input and mode,
/// same output.
pub fn build_series(entries: &[LogEntry], mode: BucketMode) -> Series {
    let agg = aggregate(entries, mode);

    let mut raw = agg.buckets;
    // Stable sort; equal keys (possible in batch mode) keep batch order
    raw.sort_by_key(|b| b.key);
    let buckets: Vec<Bucket> = raw.into_iter().map(Bucket::labelled).collect();

    tracing::debug!(
        buckets = buckets.len(),
        entries_in = agg.report.entries_in,
        skipped = agg.report.skipped_timestamp,
        ignored = agg.report.ignored_status,
        "built log series"
    );

    Series {
        mode,
        summary: Summary::from_buckets(&buckets),
        response_sizes: SizePercentiles::from_sizes(&agg.counted_sizes),
        buckets,
        report: agg.report,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(ts: &str, status: u16, size: u64) -> LogEntry {
        LogEntry::new(ts, status, size)
    }

    fn sample() -> Vec<LogEntry> {
        vec![
            entry("2024-01-05T16:20:00+00:00", 503, 10),
            entry("2024-01-05T14:03:00+00:00", 200, 100),
            entry("2024-01-05T14:59:00+00:00", 404, 50),
            entry("2024-01-05T15:00:00+00:00", 301, 0),
            entry("2024-01-05T15:30:00+00:00", 101, 0),
            entry("garbage", 200, 999),
        ]
    }

    #[test]
    fn hour_series_is_sorted_and_labelled() {
        let s = build_series(&sample(), BucketMode::hourly());
        let labels: Vec<_> = s.buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Jan 5 14:00", "Jan 5 15:00", "Jan 5 16:00"]);
        assert!(s.buckets.windows(2).all(|w| w[0].key <= w[1].key));

        let first = &s.buckets[0];
        assert_eq!(first.status_2xx, 1);
        assert_eq!(first.status_4xx, 1);
        assert_eq!(first.response_size, 150);
    }

    #[test]
    fn counted_total_matches_in_range_entries() {
        let s = build_series(&sample(), BucketMode::hourly());
        let total: u64 = s.buckets.iter().map(Bucket::requests).sum();
        // 5 parseable, one of which is 101
        assert_eq!(total, 4);
        assert_eq!(s.summary.total_requests, 4);
        assert_eq!(s.report.skipped_timestamp, 1);
        assert_eq!(s.report.ignored_status, 1);
    }

    #[test]
    fn summary_matches_bucket_sums() {
        let s = build_series(&sample(), BucketMode::hourly());
        assert_eq!(s.summary.success, 1);
        assert_eq!(s.summary.redirects, 1);
        assert_eq!(s.summary.client_errors, 1);
        assert_eq!(s.summary.server_errors, 1);
        assert_eq!(s.summary.total_bytes, 160);
        assert!((s.summary.success_rate - 25.0).abs() < f64::EPSILON);
        assert_eq!(s.response_sizes.count, 4);
    }

    #[test]
    fn batch_series_has_ceil_n_over_size_points() {
        for n in [1usize, 9, 10, 11, 37] {
            let entries: Vec<_> = (0..n)
                .map(|i| {
                    let ts = format!("2024-01-05T{:02}:{:02}:00+00:00", i / 60, i % 60);
                    entry(&ts, 200, 1)
                })
                .collect();
            let s = build_series(&entries, BucketMode::batch(10));
            assert_eq!(s.buckets.len(), n.div_ceil(10), "n = {n}");
        }
    }

    #[test]
    fn rebuilding_gives_identical_output() {
        for mode in [BucketMode::hourly(), BucketMode::batch(2)] {
            let a = build_series(&sample(), mode);
            let b = build_series(&sample(), mode);
            assert_eq!(a.buckets, b.buckets);
            assert_eq!(a.summary, b.summary);
        }
    }

    #[test]
    fn empty_input_is_an_empty_series() {
        let s = build_series(&[], BucketMode::hourly());
        assert!(s.buckets.is_empty());
        assert_eq!(s.summary, Summary::default());
    }

    #[test]
    fn series_json_shape() {
        let s = build_series(
            &[entry("2024-01-05T14:03:00+00:00", 200, 100)],
            BucketMode::batch(10),
        );
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["mode"], "batch");
        assert_eq!(v["size"], 10);
        assert_eq!(v["buckets"][0]["key"], "2024-01-05T14:03:00+00:00");
        assert_eq!(v["buckets"][0]["label"], "Jan 5 14:03");
    }
}
