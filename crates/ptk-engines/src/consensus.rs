//! # Consensus Aggregator
//!
//! Combines the three evidence stages into one confidence score and an
//! eligibility verdict.
//!
//! Each stage contributes a sub-score in `[0, 100]`:
//!
//! | Stage | Sub-score |
//! |---|---|
//! | oracle | `100 × overallScore` (mean of existence, ownership, activity) |
//! | market | `100 × clamp(1 − valuationGap / valuationTolerance, 0, 1)` |
//! | fraud | `100 − fraudLikelihood` |
//!
//! `confidence = clip(Σ weight × subscore, 0, 100)` and
//! `eligible = confidence ≥ eligibilityThreshold ∧ fraud.passed`.
//!
//! The fraud condition is a veto, not a vote: a failed fraud check forces
//! rejection whatever the confidence. A stage that produced no output
//! contributes zero. When the fraud stage itself is missing, the veto
//! applies as if the check had failed.

use chrono::{DateTime, Utc};
use ptk_oracle::OracleReport;
use ptk_state::Stage;
use serde::{Deserialize, Serialize};

use crate::fraud::FraudReport;
use crate::market::MarketReport;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusWeights {
    pub oracle: f64,
    pub market: f64,
    pub fraud: f64,
}

impl Default for ConsensusWeights {
    fn default() -> Self {
        Self {
            oracle: 0.4,
            market: 0.3,
            fraud: 0.3,
        }
    }
}

impl ConsensusWeights {
    pub fn for_stage(&self, stage: Stage) -> f64 {
        match stage {
            Stage::Oracle => self.oracle,
            Stage::Market => self.market,
            Stage::Fraud => self.fraud,
            Stage::Consensus => 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusConfig {
    pub weights: ConsensusWeights,
    /// Minimum confidence for eligibility (inclusive).
    pub eligibility_threshold: f64,
    /// Valuation gap at which the market sub-score reaches zero.
    pub valuation_tolerance: f64,
}

impl Default for ConsensusConfig {
    fn default() -> Self {
        Self {
            weights: ConsensusWeights::default(),
            eligibility_threshold: 60.0,
            valuation_tolerance: 0.5,
        }
    }
}

impl ConsensusConfig {
    pub fn validate(&self) -> Result<(), String> {
        let w = &self.weights;
        for (name, value) in [
            ("consensus.weights.oracle", w.oracle),
            ("consensus.weights.market", w.market),
            ("consensus.weights.fraud", w.fraud),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        if w.oracle + w.market + w.fraud <= 0.0 {
            return Err("consensus.weights must not all be zero".to_string());
        }
        if !(0.0..=100.0).contains(&self.eligibility_threshold) {
            return Err(format!(
                "consensus.eligibility_threshold must be within [0, 100], got {}",
                self.eligibility_threshold
            ));
        }
        if !(self.valuation_tolerance.is_finite() && self.valuation_tolerance > 0.0) {
            return Err(format!(
                "consensus.valuation_tolerance must be positive, got {}",
                self.valuation_tolerance
            ));
        }
        Ok(())
    }
}

/// One stage's share of the confidence score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusFactor {
    pub stage: Stage,
    /// False when the stage failed or timed out.
    pub available: bool,
    pub subscore: f64,
    pub weight: f64,
    pub contribution: f64,
}

/// An eligibility condition and whether it held.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleCheck {
    pub rule: String,
    pub threshold: f64,
    /// `None` when the input was never produced.
    pub actual: Option<f64>,
    pub passed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsensusResult {
    pub eligible: bool,
    pub confidence: f64,
    pub factors: Vec<ConsensusFactor>,
    pub rules: Vec<RuleCheck>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    /// At least one evidence stage was missing.
    pub degraded: bool,
    pub decided_at: DateTime<Utc>,
}

impl ConsensusResult {
    pub fn factor(&self, stage: Stage) -> Option<&ConsensusFactor> {
        self.factors.iter().find(|f| f.stage == stage)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsensusAggregator {
    config: ConsensusConfig,
}

impl ConsensusAggregator {
    pub fn new(config: ConsensusConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ConsensusConfig {
        &self.config
    }

    pub fn aggregate(
        &self,
        oracle: Option<&OracleReport>,
        market: Option<&MarketReport>,
        fraud: Option<&FraudReport>,
    ) -> ConsensusResult {
        let weights = &self.config.weights;
        let subscores = [
            (Stage::Oracle, oracle.map(|o| self.oracle_subscore(o))),
            (Stage::Market, market.map(|m| self.market_subscore(m))),
            (Stage::Fraud, fraud.map(|f| self.fraud_subscore(f))),
        ];

        let factors: Vec<ConsensusFactor> = subscores
            .into_iter()
            .map(|(stage, score)| {
                let subscore = score
                    .filter(|s| s.is_finite())
                    .map(|s| s.clamp(0.0, 100.0))
                    .unwrap_or(0.0);
                let weight = weights.for_stage(stage);
                ConsensusFactor {
                    stage,
                    available: score.is_some(),
                    subscore,
                    weight,
                    contribution: weight * subscore,
                }
            })
            .collect();

        let confidence = factors
            .iter()
            .map(|f| f.contribution)
            .sum::<f64>()
            .clamp(0.0, 100.0);
        let degraded = factors.iter().any(|f| !f.available);

        let threshold = self.config.eligibility_threshold;
        let confidence_check = RuleCheck {
            rule: "confidence_threshold".to_string(),
            threshold,
            actual: Some(confidence),
            passed: confidence >= threshold,
        };
        let fraud_check = RuleCheck {
            rule: "fraud_veto".to_string(),
            threshold: fraud.map(|f| f.threshold).unwrap_or(0.0),
            actual: fraud.map(|f| f.fraud_likelihood),
            passed: fraud.is_some_and(|f| f.passed),
        };

        let mut reasons = Vec::new();
        if !confidence_check.passed {
            reasons.push(format!(
                "confidence {confidence:.2} below threshold {threshold}"
            ));
        }
        if !fraud_check.passed {
            reasons.push(match fraud {
                Some(f) => format!(
                    "fraud likelihood {:.2} exceeds threshold {}",
                    f.fraud_likelihood, f.threshold
                ),
                None => "fraud check unavailable".to_string(),
            });
        }

        let eligible = reasons.is_empty();
        ConsensusResult {
            eligible,
            confidence,
            factors,
            rules: vec![confidence_check, fraud_check],
            rejection_reason: (!eligible).then(|| reasons.join("; ")),
            degraded,
            decided_at: Utc::now(),
        }
    }

    pub fn oracle_subscore(&self, oracle: &OracleReport) -> f64 {
        100.0 * oracle.overall_score()
    }

    pub fn market_subscore(&self, market: &MarketReport) -> f64 {
        let gap = market.valuation_gap.max(0.0);
        100.0 * (1.0 - gap / self.config.valuation_tolerance).clamp(0.0, 1.0)
    }

    pub fn fraud_subscore(&self, fraud: &FraudReport) -> f64 {
        100.0 - fraud.fraud_likelihood
    }
}
