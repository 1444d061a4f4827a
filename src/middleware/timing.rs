use axum::{extract::Request, middleware::Next, response::Response};
use std::time::Instant;

use crate::analytics::StatusClass;

/// Adds `X-Response-Time-Us` and `Server-Timing` headers and logs one line
/// per API request, at a level picked from the status class.
pub async fn timing_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let start = Instant::now();
    let mut response = next.run(req).await;
    let elapsed = start.elapsed();
    let us = elapsed.as_micros() as u64;

    if let Ok(val) = us.to_string().parse() {
        response.headers_mut().insert("X-Response-Time-Us", val);
    }
    let server_timing = format!("total;dur={:.3}", elapsed.as_secs_f64() * 1000.0);
    if let Ok(val) = server_timing.parse() {
        response.headers_mut().insert("Server-Timing", val);
    }

    // Static files and SSE streams are noise
    if !path.starts_with("/api/") || path.ends_with("/stream") {
        return response;
    }

    let status = response.status().as_u16();
    match StatusClass::from_code(status) {
        Some(StatusClass::ServerError) => tracing::error!(%method, %path, status, us, "request"),
        Some(StatusClass::ClientError) => tracing::warn!(%method, %path, status, us, "request"),
        _ => tracing::info!(%method, %path, status, us, "request"),
    }

    response
}
