//! # Progress Log
//!
//! Human-readable lines shown to a submitter while their verification runs.
//! These are separate from `tracing` output, which is for operators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stage::Stage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
    Success,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub stage: Stage,
    pub message: String,
    pub level: LogLevel,
}

impl LogEntry {
    pub fn new(stage: Stage, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            stage,
            message: message.into(),
            level,
        }
    }

    pub fn info(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, LogLevel::Info, message)
    }

    pub fn warning(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, LogLevel::Warning, message)
    }

    pub fn error(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, LogLevel::Error, message)
    }

    pub fn success(stage: Stage, message: impl Into<String>) -> Self {
        Self::new(stage, LogLevel::Success, message)
    }
}
