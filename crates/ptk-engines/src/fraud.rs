//! # Fraud Detection Engine
//!
//! An open registry of independent [`FraudRule`]s. Each rule looks at the
//! submission (and the oracle's corroborating signals, when the oracle
//! stage produced any) and emits zero or one [`Anomaly`]. Aggregation does
//! not know which rules exist:
//!
//! ```text
//! fraudLikelihood = min(Σ contributionScore × scoreScale, 100)
//! passed          = fraudLikelihood ≤ threshold
//! ```
//!
//! ## Determinism
//!
//! Rules are held in a `BTreeMap` keyed by rule id, so evaluation order and
//! the order of anomalies in the report are the same on every run.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use ptk_core::AssetSubmission;
use ptk_oracle::OracleSignals;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::rules;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Anomaly {
    #[serde(rename = "type")]
    pub anomaly_type: String,
    pub severity: Severity,
    pub detail: String,
    pub contribution_score: f64,
}

/// What a rule may look at.
#[derive(Debug, Clone, Copy)]
pub struct FraudContext<'a> {
    pub submission: &'a AssetSubmission,
    pub signals: Option<&'a OracleSignals>,
}

pub trait FraudRule: Send + Sync {
    /// Stable identifier, used as the registry key.
    fn id(&self) -> &str;

    fn evaluate(&self, ctx: &FraudContext<'_>) -> Option<Anomaly>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FraudConfig {
    /// Highest likelihood that still passes (inclusive).
    pub threshold: f64,
    /// Multiplier from summed contribution to the 0-100 likelihood.
    pub score_scale: f64,
    /// Expected yield above this is implausible, percent.
    pub max_plausible_yield: f64,
    /// Size above which the asset counts as large.
    pub large_asset_size: f64,
    /// Yield a large asset may not exceed, percent.
    pub large_asset_max_yield: f64,
    /// Relative claimed-vs-oracle value difference that is anomalous.
    pub value_divergence: f64,
    /// Relative claimed-vs-oracle size difference that is anomalous.
    pub size_divergence: f64,
}

impl Default for FraudConfig {
    fn default() -> Self {
        Self {
            threshold: 5.0,
            score_scale: 10.0,
            max_plausible_yield: 20.0,
            large_asset_size: 50_000.0,
            large_asset_max_yield: 15.0,
            value_divergence: 0.3,
            size_divergence: 0.25,
        }
    }
}

impl FraudConfig {
    pub fn validate(&self) -> Result<(), String> {
        let checks = [
            ("fraud.threshold", self.threshold),
            ("fraud.score_scale", self.score_scale),
            ("fraud.max_plausible_yield", self.max_plausible_yield),
            ("fraud.large_asset_size", self.large_asset_size),
            ("fraud.large_asset_max_yield", self.large_asset_max_yield),
            ("fraud.value_divergence", self.value_divergence),
            ("fraud.size_divergence", self.size_divergence),
        ];
        for (name, value) in checks {
            if !(value.is_finite() && value >= 0.0) {
                return Err(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FraudReport {
    pub fraud_likelihood: f64,
    pub anomaly_count: usize,
    pub anomalies: Vec<Anomaly>,
    pub passed: bool,
    pub threshold: f64,
    pub rules_evaluated: usize,
}

pub struct FraudEngine {
    rules: BTreeMap<String, Arc<dyn FraudRule>>,
    config: FraudConfig,
}

impl std::fmt::Debug for FraudEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FraudEngine")
            .field("rules", &self.rules.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl FraudEngine {
    /// An engine with no rules. Every submission passes until rules are
    /// registered.
    pub fn new(config: FraudConfig) -> Self {
        Self {
            rules: BTreeMap::new(),
            config,
        }
    }

    /// An engine pre-loaded with the baseline rule set.
    pub fn with_baseline_rules(config: FraudConfig) -> Self {
        let mut engine = Self::new(config.clone());
        for rule in rules::baseline(&config) {
            engine.register(rule);
        }
        engine
    }

    /// Add a rule, replacing (and returning) any rule with the same id.
    pub fn register(&mut self, rule: Arc<dyn FraudRule>) -> Option<Arc<dyn FraudRule>> {
        self.rules.insert(rule.id().to_string(), rule)
    }

    pub fn unregister(&mut self, rule_id: &str) -> Option<Arc<dyn FraudRule>> {
        self.rules.remove(rule_id)
    }

    pub fn rule_ids(&self) -> Vec<&str> {
        self.rules.keys().map(String::as_str).collect()
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn config(&self) -> &FraudConfig {
        &self.config
    }

    pub fn detect(
        &self,
        submission: &AssetSubmission,
        signals: Option<&OracleSignals>,
    ) -> FraudReport {
        let ctx = FraudContext { submission, signals };
        let anomalies: Vec<Anomaly> = self
            .rules
            .values()
            .filter_map(|rule| rule.evaluate(&ctx))
            .collect();

        let total: f64 = anomalies
            .iter()
            .map(|a| a.contribution_score)
            .filter(|s| s.is_finite() && *s > 0.0)
            .sum();
        let fraud_likelihood = (total * self.config.score_scale).clamp(0.0, 100.0);

        for a in &anomalies {
            tracing::debug!(
                anomaly = %a.anomaly_type,
                severity = ?a.severity,
                contribution = a.contribution_score,
                "fraud anomaly"
            );
        }

        FraudReport {
            fraud_likelihood,
            anomaly_count: anomalies.len(),
            anomalies,
            passed: fraud_likelihood <= self.config.threshold,
            threshold: self.config.threshold,
            rules_evaluated: self.rules.len(),
        }
    }
}

/// Fraud detection as a pipeline collaborator.
#[async_trait]
pub trait FraudDetector: Send + Sync {
    async fn detect_fraud(
        &self,
        submission: &AssetSubmission,
        signals: Option<&OracleSignals>,
    ) -> Result<FraudReport, EngineError>;
}

#[async_trait]
impl FraudDetector for FraudEngine {
    async fn detect_fraud(
        &self,
        submission: &AssetSubmission,
        signals: Option<&OracleSignals>,
    ) -> Result<FraudReport, EngineError> {
        Ok(self.detect(submission, signals))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptk_core::submission::fixtures::office_tower;

    struct Always(&'static str, f64);

    impl FraudRule for Always {
        fn id(&self) -> &str {
            self.0
        }

        fn evaluate(&self, _ctx: &FraudContext<'_>) -> Option<Anomaly> {
            Some(Anomaly {
                anomaly_type: self.0.to_string(),
                severity: Severity::Low,
                detail: "always fires".to_string(),
                contribution_score: self.1,
            })
        }
    }

    #[test]
    fn clean_submission_passes_baseline() {
        let engine = FraudEngine::with_baseline_rules(FraudConfig::default());
        let report = engine.detect(&office_tower(), None);
        assert_eq!(report.anomaly_count, 0);
        assert_eq!(report.fraud_likelihood, 0.0);
        assert!(report.passed);
        assert_eq!(report.rules_evaluated, engine.rule_count());
    }

    #[test]
    fn empty_engine_passes_everything() {
        let mut sub = office_tower();
        sub.financials.expected_yield = 99.0;
        let report = FraudEngine::new(FraudConfig::default()).detect(&sub, None);
        assert!(report.passed);
        assert_eq!(report.rules_evaluated, 0);
    }

    #[test]
    fn likelihood_is_scaled_sum() {
        let mut engine = FraudEngine::new(FraudConfig::default());
        engine.register(Arc::new(Always("a", 0.3)));
        engine.register(Arc::new(Always("b", 0.2)));
        let report = engine.detect(&office_tower(), None);
        assert!((report.fraud_likelihood - 5.0).abs() < 1e-9);
        // Threshold is inclusive.
        assert!(report.passed);

        engine.register(Arc::new(Always("c", 0.01)));
        let report = engine.detect(&office_tower(), None);
        assert!(!report.passed);
    }

    #[test]
    fn likelihood_is_capped_at_100() {
        let mut engine = FraudEngine::new(FraudConfig::default());
        engine.register(Arc::new(Always("huge", 50.0)));
        assert_eq!(engine.detect(&office_tower(), None).fraud_likelihood, 100.0);
    }

    #[test]
    fn register_replaces_and_unregister_removes() {
        let mut engine = FraudEngine::new(FraudConfig::default());
        assert!(engine.register(Arc::new(Always("x", 0.1))).is_none());
        assert!(engine.register(Arc::new(Always("x", 0.9))).is_some());
        assert_eq!(engine.rule_count(), 1);
        let report = engine.detect(&office_tower(), None);
        assert!((report.fraud_likelihood - 9.0).abs() < 1e-9);

        assert!(engine.unregister("x").is_some());
        assert!(engine.unregister("x").is_none());
        assert!(engine.detect(&office_tower(), None).passed);
    }

    #[test]
    fn anomalies_are_ordered_by_rule_id() {
        let mut engine = FraudEngine::new(FraudConfig::default());
        engine.register(Arc::new(Always("zeta", 0.1)));
        engine.register(Arc::new(Always("alpha", 0.1)));
        let types: Vec<_> = engine
            .detect(&office_tower(), None)
            .anomalies
            .into_iter()
            .map(|a| a.anomaly_type)
            .collect();
        assert_eq!(types, vec!["alpha", "zeta"]);
        assert_eq!(engine.rule_ids(), vec!["alpha", "zeta"]);
    }

    #[test]
    fn negative_contributions_are_ignored() {
        let mut engine = FraudEngine::new(FraudConfig::default());
        engine.register(Arc::new(Always("neg", -5.0)));
        engine.register(Arc::new(Always("pos", 0.2)));
        assert!((engine.detect(&office_tower(), None).fraud_likelihood - 2.0).abs() < 1e-9);
    }

    #[test]
    fn anomaly_wire_format() {
        let a = Anomaly {
            anomaly_type: "high_yield".into(),
            severity: Severity::High,
            detail: "d".into(),
            contribution_score: 0.3,
        };
        let json = serde_json::to_value(&a).unwrap();
        assert_eq!(json["type"], "high_yield");
        assert_eq!(json["severity"], "high");
        assert_eq!(json["contributionScore"], 0.3);
    }

    #[test]
    fn config_rejects_negative_threshold() {
        let cfg = FraudConfig {
            threshold: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate().unwrap_err().contains("fraud.threshold"));
    }
}
