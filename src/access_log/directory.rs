use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("invalid log name '{0}'")]
    InvalidName(String),
    #[error("log file '{0}' not found")]
    NotFound(String),
    #[error("log directory {0:?} not found")]
    MissingDir(PathBuf),
    #[error("i/o error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One file in the nginx log directory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogInfo {
    pub name: String,
    pub size_bytes: u64,
    /// Seconds since the Unix epoch
    pub last_modified: f64,
}

/// Joins `name` onto `dir`, accepting only a single plain file name.
pub fn resolve(dir: &Path, name: &str) -> Result<PathBuf, DirectoryError> {
    let mut parts = Path::new(name).components();
    match (parts.next(), parts.next()) {
        (Some(Component::Normal(_)), None) if !name.starts_with('.') => Ok(dir.join(name)),
        _ => Err(DirectoryError::InvalidName(name.to_string())),
    }
}

fn io_err(path: &Path) -> impl Fn(std::io::Error) -> DirectoryError + '_ {
    move |source| DirectoryError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Regular, non-hidden files in `dir`, sorted by name.
pub async fn list_logs(dir: &Path) -> Result<Vec<LogInfo>, DirectoryError> {
    if !tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        tracing::warn!(dir = %dir.display(), "nginx log directory not found");
        return Ok(Vec::new());
    }

    let mut logs = Vec::new();
    let mut rd = tokio::fs::read_dir(dir).await.map_err(io_err(dir))?;
    while let Some(dent) = rd.next_entry().await.map_err(io_err(dir))? {
        let name = dent.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = dent.path();
        let meta = dent.metadata().await.map_err(io_err(&path))?;
        if !meta.is_file() {
            continue;
        }
        let last_modified = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0);

        logs.push(LogInfo {
            name,
            size_bytes: meta.len(),
            last_modified,
        });
    }

    logs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(logs)
}

async fn existing_file(dir: &Path, name: &str) -> Result<PathBuf, DirectoryError> {
    if !tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Err(DirectoryError::MissingDir(dir.to_path_buf()));
    }
    let path = resolve(dir, name)?;
    match tokio::fs::metadata(&path).await {
        Ok(m) if m.is_file() => Ok(path),
        _ => Err(DirectoryError::NotFound(name.to_string())),
    }
}

/// Last `tail` lines of a log, or the whole file when `tail` is `None`.
pub async fn read_tail(dir: &Path, name: &str, tail: Option<usize>) -> Result<String, DirectoryError> {
    let path = existing_file(dir, name).await?;
    let bytes = tokio::fs::read(&path).await.map_err(io_err(&path))?;
    let text = String::from_utf8_lossy(&bytes);

    let Some(n) = tail else {
        return Ok(text.into_owned());
    };

    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    let mut out = lines[start..].join("\n");
    if !out.is_empty() {
        out.push('\n');
    }
    Ok(out)
}

pub async fn delete_log(dir: &Path, name: &str) -> Result<(), DirectoryError> {
    let path = existing_file(dir, name).await?;
    tokio::fs::remove_file(&path).await.map_err(io_err(&path))?;
    tracing::info!(path = %path.display(), "deleted log file");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_plain_names_resolve() {
        let dir = Path::new("/var/log/nginx");
        assert_eq!(
            resolve(dir, "access.log").unwrap(),
            PathBuf::from("/var/log/nginx/access.log")
        );
        for bad in ["../etc/passwd", "/etc/passwd", "a/b.log", "..", ".", "", ".hidden"] {
            assert!(
                matches!(resolve(dir, bad), Err(DirectoryError::InvalidName(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn list_tail_and_delete() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::write(tmp.path().join("access.log"), "one\ntwo\nthree\n").unwrap();
        std::fs::write(tmp.path().join("error.log"), "").unwrap();
        std::fs::write(tmp.path().join(".keep"), "").unwrap();
        std::fs::create_dir(tmp.path().join("old")).unwrap();

        let logs = list_logs(tmp.path()).await.unwrap();
        let names: Vec<_> = logs.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, vec!["access.log", "error.log"]);
        assert_eq!(logs[0].size_bytes, 14);

        assert_eq!(read_tail(tmp.path(), "access.log", Some(2)).await.unwrap(), "two\nthree\n");
        assert_eq!(
            read_tail(tmp.path(), "access.log", None).await.unwrap(),
            "one\ntwo\nthree\n"
        );

        delete_log(tmp.path(), "error.log").await.unwrap();
        assert!(matches!(
            delete_log(tmp.path(), "error.log").await,
            Err(DirectoryError::NotFound(_))
        ));
        assert!(matches!(
            read_tail(tmp.path(), "old", None).await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let logs = list_logs(Path::new("/definitely/not/here")).await.unwrap();
        assert!(logs.is_empty());
    }
}
