use axum::{
    middleware as axum_mw,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use crate::analytics::stream;
use crate::handlers;
use crate::middleware::{auth, timing};
use crate::AppState;

/// Builds the full Axum `Router` with all routes, middleware, and static serving.
pub fn create_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        // ── Log files ───────────────────────────────────────────
        .route("/api/logs", get(handlers::logs::list_logs))
        .route(
            "/api/logs/:name",
            get(handlers::logs::get_log).delete(handlers::logs::delete_log),
        )
        // ── Structured entries & aggregation ────────────────────
        .route(
            "/api/logs/structured",
            get(handlers::logs::structured_logs),
        )
        .route("/api/logs/series", get(handlers::series::get_series))
        .route("/api/logs/series/stream", get(stream::series_stream))
        // ── Everything above needs a token (when one is set) ────
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    let static_dir = state.config.static_dir.clone();

    Router::new()
        .route("/api/health", get(handlers::health))
        .merge(api)
        // ── Provide shared state to all routes above ────────────
        .with_state(state)
        // ── Serve the dashboard's static files ──────────────────
        .fallback_service(ServeDir::new(static_dir))
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(axum_mw::from_fn(timing::timing_middleware))
        .layer(CorsLayer::permissive())
}
