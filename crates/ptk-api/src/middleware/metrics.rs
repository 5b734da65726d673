//! # Request Metrics
//!
//! Every request is recorded through the `metrics` facade as
//! `ptk_http_requests_total{method, status}` and
//! `ptk_http_request_duration_seconds{method}`. When a Prometheus recorder
//! is installed, `/metrics` exports them next to the pipeline's counters.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub async fn metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let started = Instant::now();

    let response = next.run(request).await;

    ::metrics::histogram!("ptk_http_request_duration_seconds", "method" => method.clone())
        .record(started.elapsed().as_secs_f64());
    ::metrics::counter!(
        "ptk_http_requests_total",
        "method" => method,
        "status" => response.status().as_u16().to_string()
    )
    .increment(1);

    response
}

pub fn router() -> Router<AppState> {
    Router::new().route("/metrics", get(render))
}

/// GET /metrics — Prometheus text exposition.
async fn render(State(state): State<AppState>) -> Response {
    match &state.prometheus {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}
