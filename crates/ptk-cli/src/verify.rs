//! # Verify Subcommand
//!
//! Runs submission, verification and (when eligible) registry admission in
//! one process against the deterministic stub oracle, then prints the
//! outcome as JSON. Nothing is persisted.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use ptk_core::AssetSubmission;
use ptk_oracle::StubOracle;
use ptk_pipeline::{Orchestrator, PipelineConfig, PipelineError};
use serde_json::json;

use crate::load_submission;

/// Arguments for the `ptk verify` subcommand.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Submission file (JSON or YAML).
    #[arg(value_name = "FILE")]
    pub path: PathBuf,

    /// Seed for the comparable sample, for reproducible market analysis.
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Execute the verify subcommand.
///
/// Returns exit code: 0 when eligible, 1 when rejected or invalid, 2 when
/// every collaborator failed.
pub fn run_verify(args: &VerifyArgs, config_path: Option<&Path>) -> Result<u8> {
    let mut config = match config_path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("failed to load pipeline config {}", path.display()))?,
        None => PipelineConfig::from_env().context("failed to load pipeline config")?,
    };
    if let Some(seed) = args.seed {
        config.market.comparable_seed = Some(seed);
    }

    let submission = load_submission(&args.path)?;
    let orchestrator = Orchestrator::new(config, Arc::new(StubOracle::new()));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start async runtime")?;

    runtime.block_on(verify_in_process(&orchestrator, submission))
}

async fn verify_in_process(orchestrator: &Orchestrator, submission: AssetSubmission) -> Result<u8> {
    let record = match orchestrator.submit(submission) {
        Ok(record) => record,
        Err(PipelineError::Validation(err)) => {
            print_json(&json!({ "valid": false, "violations": err.violations }))?;
            return Ok(1);
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(submission_id = %record.id, "submission stored, verifying");

    match orchestrator.verify(&record.id).await {
        Ok(outcome) => {
            let entry = match outcome.asset_id {
                Some(asset_id) => Some(orchestrator.registry_entry(&asset_id)?),
                None => None,
            };
            let run = orchestrator.run(&record.id)?;
            print_json(&json!({
                "outcome": outcome,
                "stages": run.stage_results,
                "registryEntry": entry,
            }))?;
            Ok(if outcome.eligible { 0 } else { 1 })
        }
        Err(PipelineError::CollaboratorFailure(reason)) => {
            tracing::error!("{reason}");
            Ok(2)
        }
        Err(e) => Err(e.into()),
    }
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
