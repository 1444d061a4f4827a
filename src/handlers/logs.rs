use axum::{
    extract::{Path, Query, State},
    http::header,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::access_log::{directory, FetchQuery, LogInfo};
use crate::analytics::LogEntry;
use crate::AppState;

use super::{AppError, LogActionStatus};

// ─── Request types ───────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TailQuery {
    /// Lines from the end; 0 or negative returns the whole file
    #[serde(default = "default_tail")]
    pub tail: i64,
}

fn default_tail() -> i64 {
    100
}

#[derive(Debug, Default, Deserialize)]
pub struct StructuredQuery {
    pub log: Option<String>,
    pub limit: Option<usize>,
}

// ─── GET /api/logs ───────────────────────────────────────────────

pub async fn list_logs(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<LogInfo>>, AppError> {
    Ok(Json(directory::list_logs(&state.config.log_dir).await?))
}

// ─── GET /api/logs/:name ─────────────────────────────────────────

pub async fn get_log(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    Query(q): Query<TailQuery>,
) -> Result<impl IntoResponse, AppError> {
    let tail = usize::try_from(q.tail).ok().filter(|n| *n > 0);
    let content = directory::read_tail(&state.config.log_dir, &name, tail).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], content))
}

// ─── DELETE /api/logs/:name ──────────────────────────────────────

pub async fn delete_log(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<LogActionStatus>, AppError> {
    directory::delete_log(&state.config.log_dir, &name).await?;
    Ok(Json(LogActionStatus {
        success: true,
        message: format!("Log file '{name}' deleted successfully."),
        log_name: name,
        action: "deleted".into(),
    }))
}

// ─── GET /api/logs/structured ────────────────────────────────────

pub async fn structured_logs(
    State(state): State<Arc<AppState>>,
    Query(q): Query<StructuredQuery>,
) -> Result<Json<Vec<LogEntry>>, AppError> {
    let entries = state
        .source
        .fetch(&FetchQuery {
            log_name: q.log,
            limit: q.limit,
        })
        .await?;
    Ok(Json(entries))
}
