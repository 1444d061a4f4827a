use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::access_log::FetchQuery;
use crate::analytics::bucketer::auto_span_hours;
use crate::analytics::{build_series, BucketMode, LogEntry, Series};
use crate::AppState;

use super::AppError;

// ─── Request types ───────────────────────────────────────────────

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesQuery {
    /// "hour" (default) or "batch"
    pub mode: Option<String>,
    pub batch_size: Option<usize>,
    /// 1..=24 or "auto"; hour mode only
    pub span_hours: Option<String>,
    pub log: Option<String>,
    pub limit: Option<usize>,
}

/// Validated mode, before any entries are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeRequest {
    Hour(Option<u32>),
    AutoHour,
    Batch(usize),
}

impl ModeRequest {
    /// Turns the query into a mode, rejecting values the pipeline can't use.
    pub fn from_query(q: &SeriesQuery, default_batch: usize) -> Result<Self, AppError> {
        match q.mode.as_deref().unwrap_or("hour") {
            "hour" | "hourly" => match q.span_hours.as_deref() {
                None => Ok(Self::Hour(None)),
                Some("auto") => Ok(Self::AutoHour),
                Some(raw) => match raw.parse::<u32>() {
                    Ok(n @ 1..=24) => Ok(Self::Hour(Some(n))),
                    _ => Err(AppError::BadRequest(format!(
                        "span_hours must be 1..=24 or \"auto\", got '{raw}'"
                    ))),
                },
            },
            "batch" => match q.batch_size.unwrap_or(default_batch) {
                0 => Err(AppError::BadRequest("batch_size must be at least 1".into())),
                n => Ok(Self::Batch(n)),
            },
            other => Err(AppError::BadRequest(format!(
                "unknown mode '{other}', expected 'hour' or 'batch'"
            ))),
        }
    }

    pub fn resolve(self, entries: &[LogEntry]) -> BucketMode {
        match self {
            Self::Hour(span) => BucketMode::Hour {
                span_hours: span.unwrap_or(1),
            },
            Self::AutoHour => BucketMode::Hour {
                span_hours: auto_span_hours(entries),
            },
            Self::Batch(size) => BucketMode::batch(size),
        }
    }
}

/// Fetches entries and runs the aggregation pipeline over them.
/// The pipeline only runs when the fetch succeeded.
pub async fn compute_series(
    state: &AppState,
    q: &SeriesQuery,
    mode: ModeRequest,
) -> Result<Series, AppError> {
    let entries = state
        .source
        .fetch(&FetchQuery {
            log_name: q.log.clone(),
            limit: q.limit,
        })
        .await?;

    Ok(build_series(&entries, mode.resolve(&entries)))
}

// ─── GET /api/logs/series ────────────────────────────────────────

pub async fn get_series(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SeriesQuery>,
) -> Result<Json<Series>, AppError> {
    let mode = ModeRequest::from_query(&q, state.config.default_batch_size)?;
    Ok(Json(compute_series(&state, &q, mode).await?))
}
