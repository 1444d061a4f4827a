use hdrhistogram::Histogram;
use serde::Serialize;

/// HdrHistogram range: 1 byte → 64 GiB, 3 significant figures
const HIST_LOW: u64 = 1;
const HIST_HIGH: u64 = 64 * 1024 * 1024 * 1024;
const HIST_SIGFIG: u8 = 3;

/// Response-size distribution of the counted entries.
/// Serialized next to the series so the summary cards can show it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SizePercentiles {
    pub min: u64,
    pub max: u64,
    pub mean: f64,
    pub p50: u64,
    pub p95: u64,
    pub p99: u64,
    pub count: u64,
}

impl SizePercentiles {
    /// Zero-byte responses are recorded as 1 byte; values above the
    /// histogram ceiling saturate.
    pub fn from_sizes(sizes: &[u64]) -> Self {
        if sizes.is_empty() {
            return Self::empty();
        }

        let Ok(mut hist) = Histogram::<u64>::new_with_bounds(HIST_LOW, HIST_HIGH, HIST_SIGFIG)
        else {
            return Self::empty();
        };
        for &size in sizes {
            hist.saturating_record(size.max(1));
        }

        Self {
            min: hist.min(),
            max: hist.max(),
            mean: hist.mean(),
            p50: hist.value_at_percentile(50.0),
            p95: hist.value_at_percentile(95.0),
            p99: hist.value_at_percentile(99.0),
            count: hist.len(),
        }
    }

    pub fn empty() -> Self {
        Self {
            min: 0,
            max: 0,
            mean: 0.0,
            p50: 0,
            p95: 0,
            p99: 0,
            count: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SizePercentiles;

    #[test]
    fn empty_input_is_all_zero() {
        assert_eq!(SizePercentiles::from_sizes(&[]), SizePercentiles::empty());
    }

    #[test]
    fn small_values_are_exact() {
        let sizes: Vec<u64> = (1..=100).collect();
        let p = SizePercentiles::from_sizes(&sizes);
        assert_eq!(p.count, 100);
        assert_eq!(p.min, 1);
        assert_eq!(p.max, 100);
        assert_eq!(p.p50, 50);
        assert_eq!(p.p99, 99);
    }
}
