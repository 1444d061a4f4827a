pub mod aggregator;
pub mod bucketer;
pub mod classify;
pub mod percentiles;
pub mod series;
pub mod stream;

pub use bucketer::BucketMode;
pub use classify::StatusClass;
pub use series::{build_series, Bucket, RunReport, Series, Summary};

use serde::{Deserialize, Serialize};

/// One request recorded in the access log.
/// This is the "read" side — sources produce these, the pipeline consumes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// ISO 8601 with offset, e.g. "2024-01-05T14:03:11+00:00"
    pub timestamp: String,
    /// YYYY-MM-DD
    pub date: String,
    pub ip: String,
    pub method: Option<String>,
    pub path: Option<String>,
    pub query: Option<String>,
    pub protocol: Option<String>,
    pub status_code: u16,
    /// Bytes sent, 0 when nginx logged "-"
    pub response_size: u64,
    pub referer: Option<String>,
    pub user_agent: Option<String>,
}

impl LogEntry {
    /// Minimal entry with only the fields the pipeline reads.
    pub fn new(timestamp: impl Into<String>, status_code: u16, response_size: u64) -> Self {
        let timestamp = timestamp.into();
        let date = timestamp.get(..10).unwrap_or_default().to_string();
        Self {
            timestamp,
            date,
            ip: String::new(),
            method: None,
            path: None,
            query: None,
            protocol: None,
            status_code,
            response_size,
            referer: None,
            user_agent: None,
        }
    }
}
