//! # Verification Stages
//!
//! The fixed order in which a verification run consults its collaborators.
//! Consensus always runs last, after every evidence stage has produced a
//! result or a recorded failure.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Oracle,
    Market,
    Fraud,
    Consensus,
}

impl Stage {
    /// Evidence stages in execution order.
    pub const EVIDENCE: [Stage; 3] = [Stage::Oracle, Stage::Market, Stage::Fraud];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oracle => "oracle",
            Self::Market => "market",
            Self::Fraud => "fraud",
            Self::Consensus => "consensus",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "oracle" => Some(Self::Oracle),
            "market" => Some(Self::Market),
            "fraud" => Some(Self::Fraud),
            "consensus" => Some(Self::Consensus),
            _ => None,
        }
    }

    /// The stage that follows this one, or `None` after consensus.
    pub fn next(&self) -> Option<Stage> {
        match self {
            Self::Oracle => Some(Self::Market),
            Self::Market => Some(Self::Fraud),
            Self::Fraud => Some(Self::Consensus),
            Self::Consensus => None,
        }
    }

    /// Zero-based position in the run.
    pub fn index(&self) -> usize {
        match self {
            Self::Oracle => 0,
            Self::Market => 1,
            Self::Fraud => 2,
            Self::Consensus => 3,
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
