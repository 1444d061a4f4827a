use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use nginx_log_observatory::access_log::{DemoSource, FileSource, LogSource};
use nginx_log_observatory::config::AppConfig;
use nginx_log_observatory::middleware::auth::StaticToken;
use nginx_log_observatory::{server, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // ── 1. Configuration ─────────────────────────────────────────
    let cfg = AppConfig::from_env();

    // ── 2. Pick the entry source ─────────────────────────────────
    let source: Arc<dyn LogSource> = if cfg.demo_mode {
        tracing::info!("demo mode: serving synthetic access-log traffic");
        Arc::new(DemoSource::new(42))
    } else {
        tracing::info!(
            dir = %cfg.log_dir.display(),
            access_log = %cfg.access_log,
            "reading nginx access log"
        );
        Arc::new(FileSource {
            tail_bytes: cfg.tail_bytes,
            max_entries: cfg.max_entries,
            ..FileSource::new(&cfg.log_dir, &cfg.access_log)
        })
    };

    if cfg.api_token.is_none() {
        tracing::warn!("API_TOKEN is not set, /api routes are unauthenticated");
    }

    // ── 3. Build shared state ────────────────────────────────────
    let bind_addr = cfg.bind_addr.clone();
    let state = Arc::new(AppState {
        credentials: Arc::new(StaticToken(cfg.api_token.clone())),
        source,
        config: cfg,
    });

    // ── 4. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state);

    // ── 5. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    tracing::info!(addr = %bind_addr, "listening");
    tracing::info!("series  → /api/logs/series?mode=hour|batch");
    tracing::info!("stream  → /api/logs/series/stream");

    axum::serve(listener, app).await.context("server exited with error")?;
    Ok(())
}
