//! # Verification Orchestrator
//!
//! Drives one submission through
//!
//! ```text
//! pending ──verify──▶ running ──oracle──▶ market──▶ fraud──▶ consensus ──▶ eligible | rejected
//! ```
//!
//! ## Exactly-once runs
//!
//! The `pending → running` step is a single read-validate-update under the
//! submission store's write lock. Exactly one caller wins it; every other
//! verify call, concurrent or later, gets `AlreadyProcessed` and never
//! touches the run. The run record is created inside that same write, so
//! a `running` submission always has a run to report progress from.
//!
//! Once claimed, the stages execute on their own Tokio task. A caller that
//! stops waiting (a dropped HTTP request, an outer timeout) does not stop
//! the run; it still reaches a terminal status.
//!
//! ## Degraded mode
//!
//! Each collaborator call is bounded by `stage_timeout_ms`. An error or a
//! timeout is recorded as a failed [`StageResult`] and the run moves on;
//! consensus always runs and the submission always reaches a terminal
//! status. Only when all three evidence stages failed does `verify` report
//! `CollaboratorFailure`, after the rejection has been recorded.
//!
//! Different submissions share no lock beyond the brief store writes, so
//! their runs proceed in parallel.

use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use ptk_core::{AssetId, AssetSubmission, SubmissionId};
use ptk_engines::{
    ConsensusAggregator, ConsensusResult, FraudDetector, FraudEngine, MarketAnalyzer,
    MarketEngine,
};
use ptk_oracle::OracleAdapter;
use ptk_registry::{Admission, Claim, Registry, RegistryEntry};
use ptk_state::{LogEntry, Stage, SubmissionStatus};

use crate::config::PipelineConfig;
use crate::error::PipelineError;
use crate::model::{
    FullResult, Progress, RunStatus, StageOutcome, StageResult, SubmissionRecord,
    VerificationRun, VerifyOutcome,
};
use crate::store::Store;

#[derive(Clone)]
pub struct Orchestrator {
    config: PipelineConfig,
    oracle: Arc<dyn OracleAdapter>,
    market: Arc<dyn MarketAnalyzer>,
    fraud: Arc<dyn FraudDetector>,
    consensus: ConsensusAggregator,
    registry: Registry,
    submissions: Store<SubmissionId, SubmissionRecord>,
    runs: Store<SubmissionId, VerificationRun>,
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("oracle", &self.oracle.adapter_name())
            .field("submissions", &self.submissions.len())
            .field("runs", &self.runs.len())
            .field("registry", &self.registry.len())
            .finish()
    }
}

impl Orchestrator {
    /// An orchestrator over the in-process engines built from `config`.
    pub fn new(config: PipelineConfig, oracle: Arc<dyn OracleAdapter>) -> Self {
        let market = Arc::new(MarketEngine::from_config(config.market.clone()));
        let fraud = Arc::new(FraudEngine::with_baseline_rules(config.fraud.clone()));
        Self {
            consensus: ConsensusAggregator::new(config.consensus.clone()),
            registry: Registry::new(config.tokenization.clone()),
            config,
            oracle,
            market,
            fraud,
            submissions: Store::new(),
            runs: Store::new(),
        }
    }

    pub fn with_market(mut self, market: Arc<dyn MarketAnalyzer>) -> Self {
        self.market = market;
        self
    }

    pub fn with_fraud(mut self, fraud: Arc<dyn FraudDetector>) -> Self {
        self.fraud = fraud;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // ── Submissions ─────────────────────────────────────────────────────

    /// Validate and store a submission as `pending`.
    pub fn submit(&self, submission: AssetSubmission) -> Result<SubmissionRecord, PipelineError> {
        submission.validate()?;
        let record = SubmissionRecord::new(submission);
        self.submissions.insert(record.id, record.clone());
        tracing::info!(
            submission_id = %record.id,
            category = %record.submission.category,
            "submission accepted"
        );
        Ok(record)
    }

    pub fn submission(&self, id: &SubmissionId) -> Result<SubmissionRecord, PipelineError> {
        self.submissions
            .get(id)
            .ok_or_else(|| PipelineError::not_found("submission", id))
    }

    /// All submissions, oldest first.
    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        let mut all = self.submissions.list();
        all.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        all
    }

    // ── Verification ────────────────────────────────────────────────────

    pub async fn verify(&self, id: &SubmissionId) -> Result<VerifyOutcome, PipelineError> {
        let submission = self.claim_run(id)?;
        let this = self.clone();
        let id = *id;
        tokio::spawn(async move { this.execute(&id, submission).await })
            .await
            .map_err(|e| {
                PipelineError::Internal(format!("verification task for {id} failed: {e}"))
            })?
    }

    async fn execute(
        &self,
        id: &SubmissionId,
        submission: AssetSubmission,
    ) -> Result<VerifyOutcome, PipelineError> {
        let started = Instant::now();
        tracing::info!(submission_id = %id, "verification started");

        let oracle_report = self
            .run_stage(id, Stage::Oracle, self.oracle.verify(*id, &submission))
            .await;
        self.record(id, Stage::Oracle, oracle_report.clone().map(StageOutcome::Oracle));
        let oracle_report = oracle_report.ok();
        let signals = oracle_report.as_ref().map(|r| &r.signals);

        let market_report = self
            .run_stage(id, Stage::Market, self.market.analyze_market(&submission, signals))
            .await;
        self.record(id, Stage::Market, market_report.clone().map(StageOutcome::Market));
        let market_report = market_report.ok();

        let fraud_report = self
            .run_stage(id, Stage::Fraud, self.fraud.detect_fraud(&submission, signals))
            .await;
        self.record(id, Stage::Fraud, fraud_report.clone().map(StageOutcome::Fraud));
        let fraud_report = fraud_report.ok();

        self.set_stage(id, Stage::Consensus);
        let mut consensus = self.consensus.aggregate(
            oracle_report.as_ref(),
            market_report.as_ref(),
            fraud_report.as_ref(),
        );

        let mut admission_error = None;
        let asset_id = if consensus.eligible {
            match self.registry.admit(Admission {
                submission_id: *id,
                submission: &submission,
                consensus: &consensus,
                market: market_report.as_ref(),
                fraud: fraud_report.as_ref(),
            }) {
                Ok(entry) => Some(entry.asset_id),
                Err(e) => {
                    tracing::error!(submission_id = %id, error = %e, "registry admission failed");
                    consensus.eligible = false;
                    consensus.rejection_reason = Some(format!("registry admission failed: {e}"));
                    admission_error = Some(e);
                    None
                }
            }
        } else {
            None
        };

        let eligible = asset_id.is_some();
        let terminal = if eligible {
            SubmissionStatus::Eligible
        } else {
            SubmissionStatus::Rejected
        };
        self.finalize(id, &consensus, asset_id, terminal)?;

        let outcome = terminal.as_str();
        metrics::counter!("ptk_verifications_total", "outcome" => outcome).increment(1);
        tracing::info!(
            submission_id = %id,
            outcome,
            confidence = consensus.confidence,
            degraded = consensus.degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "verification complete"
        );

        if let Some(e) = admission_error {
            return Err(PipelineError::Internal(e.to_string()));
        }
        if oracle_report.is_none() && market_report.is_none() && fraud_report.is_none() {
            return Err(PipelineError::CollaboratorFailure(format!(
                "every evidence stage failed for submission {id}"
            )));
        }

        Ok(VerifyOutcome {
            submission_id: *id,
            eligible,
            status: terminal,
            consensus,
            asset_id,
        })
    }

    /// Move the submission from `pending` to `running` and open its run.
    ///
    /// The run store lock nests inside the submission store lock here and
    /// nowhere the other way round.
    fn claim_run(&self, id: &SubmissionId) -> Result<AssetSubmission, PipelineError> {
        self.submissions
            .try_update(id, |rec| {
                if rec.status != SubmissionStatus::Pending {
                    return Err(PipelineError::AlreadyProcessed {
                        id: id.to_string(),
                        status: rec.status,
                    });
                }
                let mut status = rec.status;
                let record = status
                    .transition(SubmissionStatus::Running)
                    .map_err(|e| PipelineError::Internal(e.to_string()))?;
                let mut run = VerificationRun::start(*id);
                run.logs.push(LogEntry::info(Stage::Oracle, "Verification started"));
                if !self.runs.insert_new(*id, run) {
                    return Err(PipelineError::Internal(format!(
                        "verification run for {id} already exists"
                    )));
                }
                rec.status = status;
                rec.transition_log.push(record);
                Ok(rec.submission.clone())
            })
            .ok_or_else(|| PipelineError::not_found("submission", id))?
    }

    async fn run_stage<T, E, F>(&self, id: &SubmissionId, stage: Stage, call: F) -> Result<T, String>
    where
        E: Display,
        F: Future<Output = Result<T, E>>,
    {
        self.set_stage(id, stage);
        let timeout = self.config.stage_timeout();
        let started = Instant::now();
        let result = match tokio::time::timeout(timeout, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(e.to_string()),
            Err(_) => Err(format!("timed out after {} ms", timeout.as_millis())),
        };
        let elapsed_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => tracing::debug!(submission_id = %id, %stage, elapsed_ms, "stage complete"),
            Err(error) => {
                metrics::counter!("ptk_stage_failures_total", "stage" => stage.as_str())
                    .increment(1);
                tracing::warn!(
                    submission_id = %id,
                    %stage,
                    elapsed_ms,
                    %error,
                    "stage failed, continuing in degraded mode"
                );
            }
        }
        result
    }

    fn set_stage(&self, id: &SubmissionId, stage: Stage) {
        self.runs.update(id, |run| {
            run.current_stage = Some(stage);
            run.logs.push(LogEntry::info(stage, format!("Running {stage} stage")));
        });
    }

    /// Append a stage result and its log line in one store write.
    fn record(&self, id: &SubmissionId, stage: Stage, outcome: Result<StageOutcome, String>) {
        let outcome = outcome.unwrap_or_else(|error| StageOutcome::Failed { error });
        let score = match &outcome {
            StageOutcome::Oracle(r) => self.consensus.oracle_subscore(r),
            StageOutcome::Market(r) => self.consensus.market_subscore(r),
            StageOutcome::Fraud(r) => self.consensus.fraud_subscore(r),
            StageOutcome::Failed { .. } => 0.0,
        };
        let score = if score.is_finite() {
            score.clamp(0.0, 100.0)
        } else {
            0.0
        };
        let log = match &outcome {
            StageOutcome::Failed { error } => {
                LogEntry::error(stage, format!("{stage} stage failed: {error}"))
            }
            _ => LogEntry::success(stage, format!("{stage} stage complete (score {score:.1})")),
        };
        self.runs.update(id, |run| {
            let sequence = run.stage_results.len();
            run.stage_results.push(StageResult {
                stage,
                outcome,
                score,
                sequence,
                recorded_at: Utc::now(),
            });
            run.logs.push(log);
        });
    }

    fn finalize(
        &self,
        id: &SubmissionId,
        consensus: &ConsensusResult,
        asset_id: Option<AssetId>,
        terminal: SubmissionStatus,
    ) -> Result<(), PipelineError> {
        self.runs.update(id, |run| {
            let verdict = match (&consensus.rejection_reason, asset_id) {
                (_, Some(asset)) => LogEntry::success(
                    Stage::Consensus,
                    format!(
                        "Eligible with confidence {:.1}; registered as asset {asset}",
                        consensus.confidence
                    ),
                ),
                (Some(reason), None) => LogEntry::warning(
                    Stage::Consensus,
                    format!("Rejected with confidence {:.1}: {reason}", consensus.confidence),
                ),
                (None, None) => LogEntry::error(
                    Stage::Consensus,
                    "Eligible but registry admission failed",
                ),
            };
            run.logs.push(verdict);
            run.consensus = Some(consensus.clone());
            run.asset_id = asset_id;
            run.status = RunStatus::Complete;
            run.current_stage = None;
            run.completed_at = Some(Utc::now());
        });

        self.submissions
            .try_update(id, |rec| {
                rec.status.transition(terminal).map(|record| {
                    rec.transition_log.push(record);
                })
            })
            .ok_or_else(|| PipelineError::not_found("submission", id))?
            .map_err(|e| PipelineError::Internal(e.to_string()))
    }

    // ── Progress & results ──────────────────────────────────────────────

    pub fn progress(&self, id: &SubmissionId) -> Result<Progress, PipelineError> {
        let record = self.submission(id)?;
        if record.status == SubmissionStatus::Pending {
            return Ok(Progress::pending(*id, record.status));
        }
        Ok(match self.runs.get(id) {
            Some(run) => Progress::of_run(&run, record.status),
            None => Progress::pending(*id, record.status),
        })
    }

    /// The run for a submission, once verification has started.
    pub fn run(&self, id: &SubmissionId) -> Result<VerificationRun, PipelineError> {
        self.submission(id)?;
        self.runs
            .get(id)
            .ok_or_else(|| PipelineError::not_found("verification run", id))
    }

    /// The result of one evidence stage, once it has executed.
    pub fn stage_result(
        &self,
        id: &SubmissionId,
        stage: Stage,
    ) -> Result<StageResult, PipelineError> {
        if stage == Stage::Consensus {
            return Err(PipelineError::Internal(
                "consensus is not an evidence stage".to_string(),
            ));
        }
        self.run(id)?
            .result(stage)
            .cloned()
            .ok_or_else(|| PipelineError::not_found("stage result", format!("{id}/{stage}")))
    }

    pub fn consensus_result(
        &self,
        id: &SubmissionId,
    ) -> Result<ConsensusResult, PipelineError> {
        self.run(id)?
            .consensus
            .ok_or_else(|| PipelineError::not_found("consensus result", id))
    }

    /// Submission and completed run together.
    pub fn full_result(&self, id: &SubmissionId) -> Result<FullResult, PipelineError> {
        let run = self.run(id)?;
        if run.status != RunStatus::Complete {
            return Err(PipelineError::not_found("full result", id));
        }
        Ok(FullResult {
            submission: self.submission(id)?,
            run,
        })
    }

    // ── Registry ────────────────────────────────────────────────────────

    pub fn registry_entries(&self) -> Vec<RegistryEntry> {
        self.registry.list()
    }

    pub fn registry_entry(&self, asset_id: &AssetId) -> Result<RegistryEntry, PipelineError> {
        self.registry
            .get(asset_id)
            .ok_or_else(|| PipelineError::not_found("registry entry", asset_id))
    }

    pub fn claim(
        &self,
        asset_id: &AssetId,
        claimant_id: &str,
        tokens: u64,
    ) -> Result<Claim, PipelineError> {
        let result = self.registry.claim(asset_id, claimant_id, tokens);
        let outcome = match &result {
            Ok(_) => "accepted",
            Err(_) => "refused",
        };
        metrics::counter!("ptk_claims_total", "outcome" => outcome).increment(1);
        result.map_err(PipelineError::from)
    }
}
