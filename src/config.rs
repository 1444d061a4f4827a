use std::path::PathBuf;
use std::str::FromStr;

use crate::access_log::source::{DEFAULT_MAX_ENTRIES, DEFAULT_TAIL_BYTES};
use crate::analytics::bucketer::DEFAULT_BATCH_SIZE;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub log_dir: PathBuf,
    pub access_log: String,
    pub max_entries: usize,
    pub tail_bytes: u64,
    pub default_batch_size: usize,
    pub stream_interval_ms: u64,
    pub static_dir: PathBuf,
    /// Serve seeded synthetic traffic instead of reading `access_log`
    pub demo_mode: bool,
    /// Bearer token for `/api/*`; auth is off when unset
    pub api_token: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5423".to_string(),
            log_dir: PathBuf::from("/var/log/nginx"),
            access_log: "access.log".to_string(),
            max_entries: DEFAULT_MAX_ENTRIES,
            tail_bytes: DEFAULT_TAIL_BYTES,
            default_batch_size: DEFAULT_BATCH_SIZE,
            stream_interval_ms: 5_000,
            static_dir: PathBuf::from("static"),
            demo_mode: false,
            api_token: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(d.bind_addr),
            log_dir: std::env::var("NGINX_LOG_DIR").map(PathBuf::from).unwrap_or(d.log_dir),
            access_log: std::env::var("ACCESS_LOG_NAME").unwrap_or(d.access_log),
            max_entries: parsed("MAX_ENTRIES", d.max_entries),
            tail_bytes: parsed("TAIL_BYTES", d.tail_bytes),
            default_batch_size: parsed("DEFAULT_BATCH_SIZE", d.default_batch_size).max(1),
            stream_interval_ms: parsed("STREAM_INTERVAL_MS", d.stream_interval_ms).max(250),
            static_dir: std::env::var("STATIC_DIR").map(PathBuf::from).unwrap_or(d.static_dir),
            demo_mode: flag("DEMO_MODE", d.demo_mode),
            api_token: std::env::var("API_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }
}

fn parsed<T: FromStr + Copy>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "ignoring unparsable setting");
            default
        }),
        Err(_) => default,
    }
}

fn flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(raw) => parse_flag(&raw).unwrap_or_else(|| {
            tracing::warn!(key, value = %raw, "ignoring unparsable flag");
            default
        }),
        Err(_) => default,
    }
}

/// `1/true/yes/on` and `0/false/no/off`, any case.
fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn flag_spellings() {
        for on in ["1", "true", "TRUE", "yes", " on "] {
            assert_eq!(parse_flag(on), Some(true), "{on}");
        }
        for off in ["0", "false", "No", "off"] {
            assert_eq!(parse_flag(off), Some(false), "{off}");
        }
        assert_eq!(parse_flag("maybe"), None);
        assert_eq!(parse_flag(""), None);
    }
}
