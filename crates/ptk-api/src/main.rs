//! # ptk-api — Binary Entry Point
//!
//! Starts the Axum HTTP server. Configuration comes from the environment:
//! `PORT`, `RUST_LOG`, `PTK_LOG_FORMAT`, `PTK_PIPELINE_CONFIG`,
//! `PTK_ORACLE_URL` and friends.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusBuilder;
use ptk_api::state::{AppConfig, AppState};
use ptk_oracle::{HttpOracle, OracleAdapter, OracleConfig, StubOracle};
use ptk_pipeline::{Orchestrator, PipelineConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = AppConfig::from_env();
    let pipeline = PipelineConfig::from_env().map_err(|e| {
        tracing::error!("Pipeline configuration rejected: {e}");
        e
    })?;

    let oracle: Arc<dyn OracleAdapter> = if std::env::var_os("PTK_ORACLE_URL").is_some() {
        let oracle_config = OracleConfig::from_env()?;
        tracing::info!(base_url = %oracle_config.base_url, "HTTP oracle configured");
        Arc::new(HttpOracle::new(oracle_config)?)
    } else {
        tracing::warn!("PTK_ORACLE_URL not set, using the deterministic stub oracle");
        Arc::new(StubOracle::new())
    };

    let orchestrator = Orchestrator::new(pipeline, oracle);
    let mut state = AppState::with_orchestrator(config.clone(), orchestrator);
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => state = state.with_prometheus(handle),
        Err(e) => tracing::warn!("Prometheus recorder not installed: {e}"),
    }

    let app = ptk_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("ptk-api listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let json = std::env::var("PTK_LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
