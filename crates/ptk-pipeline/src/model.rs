//! # Pipeline Records
//!
//! - [`SubmissionRecord`]: a stored submission with its lifecycle status.
//! - [`VerificationRun`]: the single run owned by a submission, holding an
//!   append-only sequence of [`StageResult`]s and the progress log.
//! - [`Progress`]: the polling view of a run.

use chrono::{DateTime, Utc};
use ptk_core::{AssetId, AssetSubmission, SubmissionId};
use ptk_engines::{ConsensusResult, FraudReport, MarketReport};
use ptk_oracle::OracleReport;
use ptk_state::{LogEntry, Stage, SubmissionStatus, TransitionRecord};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionRecord {
    pub id: SubmissionId,
    #[serde(flatten)]
    pub submission: AssetSubmission,
    pub status: SubmissionStatus,
    pub created_at: DateTime<Utc>,
    pub transition_log: Vec<TransitionRecord>,
}

impl SubmissionRecord {
    pub fn new(submission: AssetSubmission) -> Self {
        Self {
            id: SubmissionId::new(),
            submission,
            status: SubmissionStatus::Pending,
            created_at: Utc::now(),
            transition_log: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Complete,
}

/// What a stage produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum StageOutcome {
    Oracle(OracleReport),
    Market(MarketReport),
    Fraud(FraudReport),
    /// The collaborator errored or timed out.
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResult {
    pub stage: Stage,
    pub outcome: StageOutcome,
    /// Sub-score in `[0, 100]` as consensus will weigh it; 0 when failed.
    pub score: f64,
    /// Position in the run, from 0.
    pub sequence: usize,
    pub recorded_at: DateTime<Utc>,
}

impl StageResult {
    pub fn failed(&self) -> bool {
        matches!(self.outcome, StageOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationRun {
    pub submission_id: SubmissionId,
    pub status: RunStatus,
    /// Stage in flight, `None` before the first stage and after completion.
    pub current_stage: Option<Stage>,
    pub stage_results: Vec<StageResult>,
    pub logs: Vec<LogEntry>,
    pub consensus: Option<ConsensusResult>,
    pub asset_id: Option<AssetId>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl VerificationRun {
    pub fn start(submission_id: SubmissionId) -> Self {
        Self {
            submission_id,
            status: RunStatus::Running,
            current_stage: None,
            stage_results: Vec::new(),
            logs: Vec::new(),
            consensus: None,
            asset_id: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn result(&self, stage: Stage) -> Option<&StageResult> {
        self.stage_results.iter().find(|r| r.stage == stage)
    }

    pub fn oracle_report(&self) -> Option<&OracleReport> {
        self.stage_results.iter().find_map(|r| match &r.outcome {
            StageOutcome::Oracle(report) => Some(report),
            _ => None,
        })
    }

    pub fn market_report(&self) -> Option<&MarketReport> {
        self.stage_results.iter().find_map(|r| match &r.outcome {
            StageOutcome::Market(report) => Some(report),
            _ => None,
        })
    }

    pub fn fraud_report(&self) -> Option<&FraudReport> {
        self.stage_results.iter().find_map(|r| match &r.outcome {
            StageOutcome::Fraud(report) => Some(report),
            _ => None,
        })
    }

    /// Name shown as the furthest stage reached.
    pub fn stage_label(&self) -> &'static str {
        match (self.status, self.current_stage) {
            (RunStatus::Complete, _) => "complete",
            (RunStatus::Running, Some(stage)) => stage.as_str(),
            (RunStatus::Running, None) => "starting",
        }
    }
}

/// One line of the per-stage summary in [`Progress`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageSummary {
    pub stage: Stage,
    pub succeeded: bool,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub submission_id: SubmissionId,
    /// `pending` before verification, the in-flight stage while running,
    /// `complete` afterwards.
    pub current_stage: String,
    pub status: SubmissionStatus,
    pub logs: Vec<LogEntry>,
    pub stages: Vec<StageSummary>,
}

impl Progress {
    pub fn pending(submission_id: SubmissionId, status: SubmissionStatus) -> Self {
        Self {
            submission_id,
            current_stage: "pending".to_string(),
            status,
            logs: Vec::new(),
            stages: Vec::new(),
        }
    }

    pub fn of_run(run: &VerificationRun, status: SubmissionStatus) -> Self {
        Self {
            submission_id: run.submission_id,
            current_stage: run.stage_label().to_string(),
            status,
            logs: run.logs.clone(),
            stages: run
                .stage_results
                .iter()
                .map(|r| StageSummary {
                    stage: r.stage,
                    succeeded: !r.failed(),
                    score: r.score,
                })
                .collect(),
        }
    }
}

/// Result of a completed verify call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub submission_id: SubmissionId,
    pub eligible: bool,
    pub status: SubmissionStatus,
    pub consensus: ConsensusResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asset_id: Option<AssetId>,
}

/// Everything known about one verified submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FullResult {
    pub submission: SubmissionRecord,
    pub run: VerificationRun,
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptk_core::submission::fixtures::office_tower;

    #[test]
    fn new_record_is_pending() {
        let rec = SubmissionRecord::new(office_tower());
        assert_eq!(rec.status, SubmissionStatus::Pending);
        assert!(rec.transition_log.is_empty());
    }

    #[test]
    fn record_flattens_submission() {
        let json = serde_json::to_value(SubmissionRecord::new(office_tower())).unwrap();
        assert_eq!(json["status"], "pending");
        assert_eq!(json["claimedValue"], 75_000_000.0);
        assert!(json.get("submission").is_none());
    }

    #[test]
    fn stage_label_follows_run() {
        let mut run = VerificationRun::start(SubmissionId::new());
        assert_eq!(run.stage_label(), "starting");
        run.current_stage = Some(Stage::Market);
        assert_eq!(run.stage_label(), "market");
        run.status = RunStatus::Complete;
        assert_eq!(run.stage_label(), "complete");
    }

    #[test]
    fn failed_outcome_wire_format() {
        let r = StageResult {
            stage: Stage::Oracle,
            outcome: StageOutcome::Failed {
                error: "timeout".into(),
            },
            score: 0.0,
            sequence: 0,
            recorded_at: Utc::now(),
        };
        assert!(r.failed());
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["outcome"]["kind"], "failed");
        assert_eq!(json["outcome"]["payload"]["error"], "timeout");
    }

    #[test]
    fn pending_progress_has_stable_shape() {
        let p = Progress::pending(SubmissionId::new(), SubmissionStatus::Pending);
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(json["currentStage"], "pending");
        assert_eq!(json["logs"], serde_json::json!([]));
    }
}
