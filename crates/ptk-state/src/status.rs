//! # Submission Lifecycle State Machine
//!
//! ```text
//! PENDING ──verify──▶ RUNNING ──consensus──▶ ELIGIBLE
//!                              └───────────▶ REJECTED
//! ```
//!
//! `ELIGIBLE` and `REJECTED` are terminal. There are no backward edges and
//! no way to skip `RUNNING`; [`SubmissionStatus::transition`] is the only
//! way to move between states and it consults [`valid_transitions`].
//!
//! [`valid_transitions`]: SubmissionStatus::valid_transitions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    /// Accepted at intake, never verified.
    Pending,
    /// A verification run owns the submission.
    Running,
    /// Consensus admitted the asset. Terminal.
    Eligible,
    /// Consensus refused the asset. Terminal.
    Rejected,
}

impl SubmissionStatus {
    /// The canonical string name of this state.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Eligible => "eligible",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a canonical state name. Returns `None` for anything else.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "pending" => Some(Self::Pending),
            "running" => Some(Self::Running),
            "eligible" => Some(Self::Eligible),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Eligible | Self::Rejected)
    }

    /// States reachable in one step from this one.
    pub fn valid_transitions(&self) -> &'static [SubmissionStatus] {
        match self {
            Self::Pending => &[Self::Running],
            Self::Running => &[Self::Eligible, Self::Rejected],
            Self::Eligible | Self::Rejected => &[],
        }
    }

    /// Move to `to`, returning the audit record for the step.
    pub fn transition(
        &mut self,
        to: SubmissionStatus,
    ) -> Result<TransitionRecord, TransitionError> {
        if self.is_terminal() {
            return Err(TransitionError::AlreadyTerminal { state: *self });
        }
        if !self.valid_transitions().contains(&to) {
            return Err(TransitionError::InvalidTransition {
                from: *self,
                to,
                reason: format!(
                    "{} may only move to [{}]",
                    self,
                    self.valid_transitions()
                        .iter()
                        .map(|s| s.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            });
        }
        let record = TransitionRecord {
            from_state: *self,
            to_state: to,
            timestamp: Utc::now(),
        };
        *self = to;
        Ok(record)
    }
}

impl std::fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One applied status change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub from_state: SubmissionStatus,
    pub to_state: SubmissionStatus,
    pub timestamp: DateTime<Utc>,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("invalid transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: SubmissionStatus,
        to: SubmissionStatus,
        reason: String,
    },

    #[error("submission is in terminal state {state}")]
    AlreadyTerminal { state: SubmissionStatus },
}
