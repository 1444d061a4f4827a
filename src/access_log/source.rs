use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Duration, FixedOffset, SubsecRound, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use super::directory::{resolve, DirectoryError};
use super::parser::{parse_line, ParseError};
use crate::analytics::LogEntry;

// ─── Constants ───────────────────────────────────────────────────

/// Only the tail of a large access log is parsed.
pub const DEFAULT_TAIL_BYTES: u64 = 10 * 1024 * 1024;
/// Most recent entries returned per fetch.
pub const DEFAULT_MAX_ENTRIES: usize = 1000;

// ─── Public types ────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error("failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What to fetch. Unset fields fall back to the source's defaults.
#[derive(Debug, Clone, Default)]
pub struct FetchQuery {
    /// File name inside the log directory; the configured access log when unset
    pub log_name: Option<String>,
    pub limit: Option<usize>,
}

/// Where raw entries come from. Aggregation never talks to files or the
/// network itself; handlers fetch through this and hand the list over.
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Entries newest first. A missing log is an empty list, not an error.
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<LogEntry>, SourceError>;
}

// ─── File source ─────────────────────────────────────────────────

/// Reads the tail of an access log in the nginx log directory.
#[derive(Debug, Clone)]
pub struct FileSource {
    pub dir: PathBuf,
    pub access_log: String,
    pub tail_bytes: u64,
    pub max_entries: usize,
}

impl FileSource {
    pub fn new(dir: impl Into<PathBuf>, access_log: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            access_log: access_log.into(),
            tail_bytes: DEFAULT_TAIL_BYTES,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }

    async fn read_tail(&self, path: &Path) -> Result<String, SourceError> {
        let read_err = |source| SourceError::Read {
            path: path.to_path_buf(),
            source,
        };

        let mut file = tokio::fs::File::open(path).await.map_err(read_err)?;
        let len = file.metadata().await.map_err(read_err)?.len();

        let mut bytes = Vec::with_capacity(len.min(self.tail_bytes) as usize);
        let seeked = len > self.tail_bytes;
        if seeked {
            tracing::info!(
                path = %path.display(),
                len,
                tail_bytes = self.tail_bytes,
                "access log is large, parsing only its tail"
            );
            file.seek(SeekFrom::Start(len - self.tail_bytes))
                .await
                .map_err(read_err)?;
        }
        file.read_to_end(&mut bytes).await.map_err(read_err)?;

        let text = String::from_utf8_lossy(&bytes).into_owned();
        if !seeked {
            return Ok(text);
        }
        // First line of a seeked chunk is almost certainly partial
        Ok(match text.split_once('\n') {
            Some((_, rest)) => rest.to_string(),
            None => String::new(),
        })
    }
}

#[async_trait]
impl LogSource for FileSource {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<LogEntry>, SourceError> {
        let name = query.log_name.as_deref().unwrap_or(&self.access_log);
        let path = resolve(&self.dir, name)?;

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::warn!(path = %path.display(), "access log not found");
            return Ok(Vec::new());
        }

        let text = self.read_tail(&path).await?;
        let limit = query.limit.unwrap_or(self.max_entries);
        let entries = parse_recent(&text, limit);

        tracing::info!(
            path = %path.display(),
            entries = entries.len(),
            limit,
            "parsed access log"
        );
        Ok(entries)
    }
}

/// Walks `text` from the last line backwards and keeps up to `limit`
/// parseable entries, newest first.
pub fn parse_recent(text: &str, limit: usize) -> Vec<LogEntry> {
    let mut entries = Vec::with_capacity(limit.min(1024));

    for line in text.lines().rev() {
        if entries.len() >= limit {
            break;
        }
        match parse_line(line) {
            Ok(entry) => entries.push(entry),
            Err(ParseError::NoMatch) => {
                if !line.trim().is_empty() {
                    tracing::debug!(line, "line did not match the combined format");
                }
            }
            Err(e) => tracing::warn!(error = %e, "skipping access log line"),
        }
    }

    // Lines are not guaranteed to be written in time order
    entries.sort_by_cached_key(|e| {
        std::cmp::Reverse(DateTime::parse_from_rfc3339(&e.timestamp).ok())
    });
    entries
}

// ─── Demo source ─────────────────────────────────────────────────

const DEMO_IPS: &[&str] = &[
    "203.0.113.7",
    "203.0.113.24",
    "198.51.100.3",
    "198.51.100.88",
    "192.0.2.14",
    "192.0.2.201",
];

const DEMO_PATHS: &[&str] = &[
    "/",
    "/index.html",
    "/api/items",
    "/api/items/42",
    "/login",
    "/static/app.js",
    "/static/site.css",
    "/favicon.ico",
    "/wp-login.php",
];

const DEMO_AGENTS: &[&str] = &[
    "Mozilla/5.0 (X11; Linux x86_64; rv:124.0) Gecko/20100101 Firefox/124.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_4) AppleWebKit/605.1.15 Safari/605.1.15",
    "curl/8.4.0",
    "Go-http-client/1.1",
];

/// Seeded synthetic traffic, for running the dashboard without nginx.
#[derive(Debug, Clone)]
pub struct DemoSource {
    pub seed: u64,
    pub entries: usize,
    /// Traffic is spread evenly-ish over this many hours before `anchor`
    pub hours: i64,
    pub anchor: DateTime<FixedOffset>,
}

impl DemoSource {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            entries: DEFAULT_MAX_ENTRIES,
            hours: 48,
            anchor: Utc::now().trunc_subsecs(0).fixed_offset(),
        }
    }

    pub fn generate(&self, limit: usize) -> Vec<LogEntry> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let span_secs = (self.hours * 3600).max(1);
        let count = self.entries.min(limit);

        let mut entries: Vec<LogEntry> = (0..count)
            .map(|_| {
                let ts = self.anchor - Duration::seconds(rng.gen_range(0..span_secs));
                demo_entry(&mut rng, ts)
            })
            .collect();

        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries
    }
}

fn demo_entry(rng: &mut StdRng, ts: DateTime<FixedOffset>) -> LogEntry {
    // Mostly 2xx, a tail of redirects and errors
    let status_code = match rng.gen_range(0u8..100) {
        0..=74 => 200,
        75..=79 => 304,
        80..=84 => 301,
        85..=93 => 404,
        94..=96 => 403,
        97 => 502,
        _ => 500,
    };
    let response_size = match status_code {
        304 => 0,
        200 => rng.gen_range(200..250_000),
        _ => rng.gen_range(100..2_000),
    };

    let mut entry = LogEntry::new(ts.to_rfc3339(), status_code, response_size);
    entry.date = ts.date_naive().to_string();
    entry.ip = DEMO_IPS[rng.gen_range(0..DEMO_IPS.len())].to_string();
    entry.method = Some(if rng.gen_bool(0.85) { "GET" } else { "POST" }.to_string());
    entry.path = Some(DEMO_PATHS[rng.gen_range(0..DEMO_PATHS.len())].to_string());
    entry.protocol = Some("HTTP/1.1".to_string());
    entry.user_agent = Some(DEMO_AGENTS[rng.gen_range(0..DEMO_AGENTS.len())].to_string());
    entry
}

#[async_trait]
impl LogSource for DemoSource {
    async fn fetch(&self, query: &FetchQuery) -> Result<Vec<LogEntry>, SourceError> {
        Ok(self.generate(query.limit.unwrap_or(self.entries)))
    }
}
