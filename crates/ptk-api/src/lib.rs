//! # ptk-api — HTTP Transport for the Tokenization Pipeline
//!
//! ## API Surface
//!
//! | Prefix | Module | Domain |
//! |---|---|---|
//! | `/v1/submissions/*` | [`routes::submissions`] | Intake, verify, progress, stage results |
//! | `/v1/registry/*` | [`routes::registry`] | Registry entries and claims |
//! | `/openapi.json` | [`openapi`] | Generated OpenAPI spec |
//! | `/metrics` | [`middleware::metrics`] | Prometheus exposition |
//! | `/health/*` | this module | Liveness and readiness probes |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! TraceLayer → MetricsMiddleware → Handler
//! ```

pub mod error;
pub mod extractors;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let api = Router::new()
        .merge(routes::submissions::router())
        .merge(routes::registry::router())
        .merge(openapi::router())
        .merge(middleware::metrics::router())
        .layer(from_fn(middleware::metrics::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let health = Router::new()
        .route("/health/liveness", axum::routing::get(liveness))
        .route("/health/readiness", axum::routing::get(readiness));

    Router::new().merge(health).merge(api)
}

/// Liveness probe: 200 while the process runs.
async fn liveness() -> &'static str {
    "ok"
}

/// Readiness probe: the stores are in memory, so ready once started.
async fn readiness() -> &'static str {
    "ready"
}
