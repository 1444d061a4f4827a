use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::handlers::AppError;
use crate::AppState;

/// Source of the token `/api/*` callers must present.
/// `None` turns authentication off.
pub trait CredentialProvider: Send + Sync {
    fn expected_token(&self) -> Option<String>;
}

/// Token fixed at startup (from `API_TOKEN`).
#[derive(Debug, Clone, Default)]
pub struct StaticToken(pub Option<String>);

impl CredentialProvider for StaticToken {
    fn expected_token(&self) -> Option<String> {
        self.0.clone()
    }
}

/// Rejects requests without `Authorization: Bearer <token>` matching the
/// provider's token.
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.credentials.expected_token() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    if provided != Some(expected.as_str()) {
        tracing::debug!(path = %request.uri().path(), "rejected request without valid token");
        return AppError::Unauthorized.into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::{CredentialProvider, StaticToken};

    #[test]
    fn static_token_hands_back_its_value() {
        let provider: Box<dyn CredentialProvider> = Box::new(StaticToken(Some("abc".into())));
        assert_eq!(provider.expected_token().as_deref(), Some("abc"));
        assert_eq!(StaticToken::default().expected_token(), None);
    }
}
