//! # ptk-pipeline — Verification Orchestration
//!
//! Owns submissions and their verification runs, drives the scoring
//! engines in order, and hands eligible assets to the registry.
//!
//! ```text
//! submit ──▶ SubmissionRecord (pending)
//! verify ──▶ Orchestrator ──▶ oracle ─▶ market ─▶ fraud ─▶ consensus
//!                                                            │
//!                                   eligible ──▶ Registry::admit
//! ```
//!
//! Collaborators are injected as trait objects, so each orchestrator owns
//! its own engines and concurrent orchestrators never share state.

pub mod config;
pub mod error;
pub mod model;
pub mod orchestrator;
pub mod store;

pub use config::{ConfigError, PipelineConfig, CONFIG_ENV};
pub use error::PipelineError;
pub use model::{
    FullResult, Progress, RunStatus, StageOutcome, StageResult, StageSummary, SubmissionRecord,
    VerificationRun, VerifyOutcome,
};
pub use orchestrator::Orchestrator;
pub use store::Store;
