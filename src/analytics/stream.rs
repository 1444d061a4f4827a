use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

use crate::handlers::series::{compute_series, ModeRequest, SeriesQuery};
use crate::handlers::AppError;
use crate::AppState;

/// `tokio::time::interval` rejects a zero period.
const MIN_STREAM_INTERVAL_MS: u64 = 50;

// ─── GET /api/logs/series/stream ─────────────────────────────────
/// Server-Sent Events endpoint.
/// Re-reads the log and pushes a fresh `Series` every
/// `stream_interval_ms`. Takes the same query as `/api/logs/series`.

pub async fn series_stream(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SeriesQuery>,
) -> Result<Sse<ReceiverStream<Result<Event, Infallible>>>, AppError> {
    // Bad parameters fail the request instead of every tick
    let mode = ModeRequest::from_query(&q, state.config.default_batch_size)?;
    let period = Duration::from_millis(
        state
            .config
            .stream_interval_ms
            .max(MIN_STREAM_INTERVAL_MS),
    );

    let (tx, rx) = mpsc::channel(4);

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;

            let event = match compute_series(&state, &q, mode).await {
                Ok(series) => {
                    let json = serde_json::to_string(&series).unwrap_or_default();
                    Event::default().event("series").data(json)
                }
                Err(e) => Event::default().event("error").data(e.to_string()),
            };

            if tx.send(Ok(event)).await.is_err() {
                tracing::debug!("series stream client went away");
                break;
            }
        }
    });

    Ok(Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    ))
}
