use std::sync::OnceLock;

use chrono::DateTime;
use regex::Regex;

use crate::analytics::LogEntry;

/// nginx `$time_local`, e.g. "05/Jan/2024:14:03:11 +0000"
const TIME_LOCAL_FORMAT: &str = "%d/%b/%Y:%H:%M:%S %z";

/// nginx "combined" log format:
/// `$remote_addr - $remote_user [$time_local] "$request" $status $body_bytes_sent "$http_referer" "$http_user_agent"`
const COMBINED_PATTERN: &str = concat!(
    r#"^(?P<ip>\S+)\s+\S+\s+\S+\s+"#,
    r#"\[(?P<timestamp>[^\]]+)\]\s+"#,
    r#""(?P<request>[^"]*)"\s+"#,
    r#"(?P<status>\d{3})\s+"#,
    r#"(?P<size>\d+|-)\s+"#,
    r#""(?P<referer>[^"]*)"\s+"#,
    r#""(?P<user_agent>[^"]*)""#,
);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line does not match the combined log format")]
    NoMatch,
    #[error("invalid timestamp '{0}'")]
    Timestamp(String),
    #[error("invalid status code '{0}'")]
    Status(String),
}

fn combined() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(COMBINED_PATTERN).expect("combined log pattern is valid"))
}

/// Parses one access-log line into a structured entry.
pub fn parse_line(line: &str) -> Result<LogEntry, ParseError> {
    let caps = combined().captures(line).ok_or(ParseError::NoMatch)?;

    let raw_ts = &caps["timestamp"];
    let ts = DateTime::parse_from_str(raw_ts, TIME_LOCAL_FORMAT)
        .map_err(|_| ParseError::Timestamp(raw_ts.to_string()))?;

    let raw_status = &caps["status"];
    let status_code: u16 = raw_status
        .parse()
        .map_err(|_| ParseError::Status(raw_status.to_string()))?;

    let response_size = match &caps["size"] {
        "-" => 0,
        digits => digits.parse().unwrap_or_else(|_| {
            tracing::warn!(size = digits, "response size out of range, using 0");
            0
        }),
    };

    let (method, path, query, protocol) = split_request(&caps["request"]);

    Ok(LogEntry {
        timestamp: ts.to_rfc3339(),
        date: ts.date_naive().to_string(),
        ip: caps["ip"].to_string(),
        method,
        path,
        query,
        protocol,
        status_code,
        response_size,
        referer: dash_to_none(&caps["referer"]),
        user_agent: dash_to_none(&caps["user_agent"]),
    })
}

type RequestParts = (Option<String>, Option<String>, Option<String>, Option<String>);

/// `"GET /a?b=1 HTTP/1.1"` → method, path, query, protocol.
/// Anything that is not three space-separated parts keeps the entry
/// with all four empty.
fn split_request(request: &str) -> RequestParts {
    let parts: Vec<&str> = request.splitn(3, ' ').collect();
    let [method, target, protocol] = parts.as_slice() else {
        tracing::debug!(request, "malformed request line");
        return (None, None, None, None);
    };

    let (path, query) = match target.split_once('?') {
        Some((p, q)) => (p, (!q.is_empty()).then(|| q.to_string())),
        None => (*target, None),
    };

    (
        Some(method.to_string()),
        Some(path.to_string()),
        query,
        Some(protocol.to_string()),
    )
}

fn dash_to_none(v: &str) -> Option<String> {
    match v {
        "-" | "" => None,
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LINE: &str = r#"203.0.113.7 - - [05/Jan/2024:14:03:11 +0100] "GET /api/items?page=2 HTTP/1.1" 200 5120 "https://example.com/" "curl/8.4.0""#;

    #[test]
    fn parses_a_combined_line() {
        let e = parse_line(LINE).unwrap();
        assert_eq!(e.ip, "203.0.113.7");
        assert_eq!(e.timestamp, "2024-01-05T14:03:11+01:00");
        assert_eq!(e.date, "2024-01-05");
        assert_eq!(e.method.as_deref(), Some("GET"));
        assert_eq!(e.path.as_deref(), Some("/api/items"));
        assert_eq!(e.query.as_deref(), Some("page=2"));
        assert_eq!(e.protocol.as_deref(), Some("HTTP/1.1"));
        assert_eq!(e.status_code, 200);
        assert_eq!(e.response_size, 5120);
        assert_eq!(e.referer.as_deref(), Some("https://example.com/"));
        assert_eq!(e.user_agent.as_deref(), Some("curl/8.4.0"));
    }

    #[test]
    fn dash_size_and_referer() {
        let line = r#"10.0.0.1 - alice [05/Jan/2024:14:03:11 +0000] "HEAD / HTTP/1.0" 304 - "-" "-""#;
        let e = parse_line(line).unwrap();
        assert_eq!(e.response_size, 0);
        assert_eq!(e.referer, None);
        assert_eq!(e.user_agent, None);
        assert_eq!(e.query, None);
    }

    #[test]
    fn malformed_request_keeps_the_entry() {
        let line = r#"10.0.0.1 - - [05/Jan/2024:14:03:11 +0000] "\x16\x03\x01" 400 150 "-" "-""#;
        let e = parse_line(line).unwrap();
        assert_eq!(e.status_code, 400);
        assert_eq!(e.method, None);
        assert_eq!(e.path, None);
    }

    #[test]
    fn bad_timestamp_is_rejected() {
        let line = r#"10.0.0.1 - - [yesterday] "GET / HTTP/1.1" 200 1 "-" "-""#;
        assert_eq!(
            parse_line(line),
            Err(ParseError::Timestamp("yesterday".into()))
        );
    }

    #[test]
    fn non_matching_line() {
        assert_eq!(parse_line("hello world"), Err(ParseError::NoMatch));
        assert_eq!(parse_line(""), Err(ParseError::NoMatch));
    }
}
