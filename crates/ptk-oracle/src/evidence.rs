//! # Oracle Evidence and Reports
//!
//! Each corroborating source yields one [`Evidence`] item with a confidence
//! in `[0, 1]`. Evidence is grouped by category and a category's score is the
//! mean confidence of its items:
//!
//! | Category | Sources |
//! |---|---|
//! | existence | satellite imagery, activity signals |
//! | ownership | property registry |
//! | activity | activity signals |
//!
//! Alongside the scores, the report carries the raw corroborating values
//! that the market and fraud engines compare claims against.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What a category of evidence speaks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceCategory {
    Existence,
    Ownership,
    Activity,
}

/// One corroborating observation from one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// e.g. "Satellite Imagery", "Property Registry".
    pub source: String,
    #[serde(default)]
    pub raw_data: serde_json::Value,
    /// Short finding, e.g. "Built structure visible at coordinates".
    pub derived_signal: String,
    pub confidence: f64,
    pub explanation: String,
}

/// Evidence for one category with its aggregated score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryResult {
    pub category: EvidenceCategory,
    pub score: f64,
    pub evidences: Vec<Evidence>,
}

impl CategoryResult {
    /// Aggregate evidence into a category score (mean confidence).
    ///
    /// Confidences are clamped into `[0, 1]` first; an empty or entirely
    /// non-finite evidence list scores 0.
    pub fn aggregate(category: EvidenceCategory, evidences: Vec<Evidence>) -> Self {
        let confidences: Vec<f64> = evidences
            .iter()
            .map(|e| e.confidence)
            .filter(|c| c.is_finite())
            .map(|c| c.clamp(0.0, 1.0))
            .collect();
        let score = if confidences.is_empty() {
            0.0
        } else {
            confidences.iter().sum::<f64>() / confidences.len() as f64
        };
        Self {
            category,
            score,
            evidences,
        }
    }
}

/// Raw corroborating values. `None` means the oracle had no observation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleSignals {
    /// Footprint estimated from imagery, same unit as the claimed size.
    #[serde(default)]
    pub estimated_size: Option<f64>,
    /// Independent valuation, same currency as the claimed value.
    #[serde(default)]
    pub estimated_value: Option<f64>,
    /// Whether the registry record matches the claimed owner.
    #[serde(default)]
    pub registry_valid: Option<bool>,
    /// Whether referenced title documents could be fetched and matched.
    #[serde(default)]
    pub documents_verified: Option<bool>,
}

/// Everything the oracle stage produced for one submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OracleReport {
    pub results: Vec<CategoryResult>,
    pub signals: OracleSignals,
    pub verified_at: DateTime<Utc>,
}

impl OracleReport {
    pub fn new(results: Vec<CategoryResult>, signals: OracleSignals) -> Self {
        Self {
            results,
            signals,
            verified_at: Utc::now(),
        }
    }

    /// Build a report from per-source evidence using the standard grouping.
    pub fn from_sources(
        satellite: Evidence,
        registry: Evidence,
        activity: Evidence,
        signals: OracleSignals,
    ) -> Self {
        let existence =
            CategoryResult::aggregate(EvidenceCategory::Existence, vec![satellite, activity.clone()]);
        let ownership = CategoryResult::aggregate(EvidenceCategory::Ownership, vec![registry]);
        let activity = CategoryResult::aggregate(EvidenceCategory::Activity, vec![activity]);
        Self::new(vec![existence, ownership, activity], signals)
    }

    /// Score of a category, 0 when the category is absent.
    pub fn score(&self, category: EvidenceCategory) -> f64 {
        self.results
            .iter()
            .find(|r| r.category == category)
            .map(|r| r.score)
            .unwrap_or(0.0)
    }

    pub fn existence_score(&self) -> f64 {
        self.score(EvidenceCategory::Existence)
    }

    pub fn ownership_score(&self) -> f64 {
        self.score(EvidenceCategory::Ownership)
    }

    pub fn activity_score(&self) -> f64 {
        self.score(EvidenceCategory::Activity)
    }

    /// Mean of the three category scores, in `[0, 1]`.
    pub fn overall_score(&self) -> f64 {
        (self.existence_score() + self.ownership_score() + self.activity_score()) / 3.0
    }
}
