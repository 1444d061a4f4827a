pub mod logs;
pub mod series;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::access_log::{DirectoryError, SourceError};

// ─── Shared response envelope ────────────────────────────────────

/// Result of a mutating action on a log file.
#[derive(Debug, Clone, Serialize)]
pub struct LogActionStatus {
    pub success: bool,
    pub message: String,
    pub log_name: String,
    pub action: String,
}

// ─── Unified error type ──────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("missing or invalid bearer token")]
    Unauthorized,
    #[error("{0}")]
    Internal(String),
}

impl From<DirectoryError> for AppError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::InvalidName(_) => Self::BadRequest(e.to_string()),
            DirectoryError::NotFound(_) | DirectoryError::MissingDir(_) => {
                Self::NotFound(e.to_string())
            }
            DirectoryError::Io { .. } => {
                tracing::error!(error = %e, "log directory i/o failed");
                Self::Internal("could not access log file, check permissions".into())
            }
        }
    }
}

impl From<SourceError> for AppError {
    fn from(e: SourceError) -> Self {
        match e {
            SourceError::Directory(inner) => inner.into(),
            SourceError::Read { .. } => {
                tracing::error!(error = %e, "log source failed");
                Self::Internal("could not read access log".into())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error":  self.to_string(),
            "status": status.as_u16(),
        });

        (status, Json(body)).into_response()
    }
}

// ─── GET /api/health ─────────────────────────────────────────────

pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
