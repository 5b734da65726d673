//! # Application State
//!
//! Shared state for the Axum application. The orchestrator owns every
//! submission, run and registry entry; cloning the state shares them.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;
use ptk_oracle::StubOracle;
use ptk_pipeline::{Orchestrator, PipelineConfig};

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

impl AppConfig {
    /// Read `PORT`, falling back to 8080.
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);
        Self { port }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub orchestrator: Orchestrator,
    /// Renders `/metrics`. `None` when no Prometheus recorder is installed.
    pub prometheus: Option<PrometheusHandle>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .field("orchestrator", &self.orchestrator)
            .field("prometheus", &self.prometheus.is_some())
            .finish()
    }
}

impl AppState {
    /// Development state: default pipeline config over the stub oracle.
    pub fn new() -> Self {
        let orchestrator =
            Orchestrator::new(PipelineConfig::default(), Arc::new(StubOracle::new()));
        Self::with_orchestrator(AppConfig::default(), orchestrator)
    }

    pub fn with_orchestrator(config: AppConfig, orchestrator: Orchestrator) -> Self {
        Self {
            config,
            orchestrator,
            prometheus: None,
        }
    }

    pub fn with_prometheus(mut self, handle: PrometheusHandle) -> Self {
        self.prometheus = Some(handle);
        self
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
