//! # Baseline Fraud Rules
//!
//! | Rule id | Fires when | Severity | Contribution |
//! |---|---|---|---|
//! | `high_yield` | expected yield > max plausible yield | high | 0.3 |
//! | `large_asset_high_yield` | size > large-asset size and yield > large-asset max yield | medium | 0.2 |
//! | `occupancy_inconsistency` | occupancy contradicts rent and tenant count | medium | 0.2 |
//! | `value_divergence` | claimed value differs from oracle estimate by more than tolerance | high | 0.4 |
//! | `size_divergence` | claimed size differs from oracle footprint by more than tolerance | medium | 0.25 |
//! | `registry_mismatch` | oracle reports the registry record does not match | high | 0.6 |
//!
//! Oracle-dependent rules stay silent when the oracle produced no signal.

use std::sync::Arc;

use crate::fraud::{Anomaly, FraudConfig, FraudContext, FraudRule, Severity};

pub fn baseline(config: &FraudConfig) -> Vec<Arc<dyn FraudRule>> {
    vec![
        Arc::new(HighYield {
            max_yield: config.max_plausible_yield,
        }),
        Arc::new(LargeAssetHighYield {
            min_size: config.large_asset_size,
            max_yield: config.large_asset_max_yield,
        }),
        Arc::new(OccupancyInconsistency),
        Arc::new(ValueDivergence {
            tolerance: config.value_divergence,
        }),
        Arc::new(SizeDivergence {
            tolerance: config.size_divergence,
        }),
        Arc::new(RegistryMismatch),
    ]
}

fn anomaly(kind: &str, severity: Severity, score: f64, detail: String) -> Anomaly {
    Anomaly {
        anomaly_type: kind.to_string(),
        severity,
        detail,
        contribution_score: score,
    }
}

/// Relative difference of `claimed` from a positive `reference`.
fn divergence(claimed: f64, reference: f64) -> Option<f64> {
    (reference.is_finite() && reference > 0.0).then(|| (claimed - reference).abs() / reference)
}

#[derive(Debug, Clone)]
pub struct HighYield {
    pub max_yield: f64,
}

impl FraudRule for HighYield {
    fn id(&self) -> &str {
        "high_yield"
    }

    fn evaluate(&self, ctx: &FraudContext<'_>) -> Option<Anomaly> {
        let y = ctx.submission.financials.expected_yield;
        (y > self.max_yield).then(|| {
            anomaly(
                self.id(),
                Severity::High,
                0.3,
                format!("expected yield {y}% exceeds plausible maximum {}%", self.max_yield),
            )
        })
    }
}

/// Yields compress as assets get larger; a large asset promising a high
/// yield is suspicious even when the yield alone would not be.
#[derive(Debug, Clone)]
pub struct LargeAssetHighYield {
    pub min_size: f64,
    pub max_yield: f64,
}

impl FraudRule for LargeAssetHighYield {
    fn id(&self) -> &str {
        "large_asset_high_yield"
    }

    fn evaluate(&self, ctx: &FraudContext<'_>) -> Option<Anomaly> {
        let size = ctx.submission.specifications.size;
        let y = ctx.submission.financials.expected_yield;
        (size > self.min_size && y > self.max_yield).then(|| {
            anomaly(
                self.id(),
                Severity::Medium,
                0.2,
                format!(
                    "asset of size {size} claims {y}% yield; assets above {} rarely exceed {}%",
                    self.min_size, self.max_yield
                ),
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct OccupancyInconsistency;

impl FraudRule for OccupancyInconsistency {
    fn id(&self) -> &str {
        "occupancy_inconsistency"
    }

    fn evaluate(&self, ctx: &FraudContext<'_>) -> Option<Anomaly> {
        let fin = &ctx.submission.financials;
        let earning = fin.current_rent > 0.0 || fin.tenant_count > 0;
        let detail = if fin.occupancy_rate <= 0.0 && earning {
            format!(
                "asset reported vacant but collects rent {} from {} tenant(s)",
                fin.current_rent, fin.tenant_count
            )
        } else if fin.occupancy_rate > 0.0 && !earning {
            format!(
                "asset reported {}% occupied but has no rent and no tenants",
                fin.occupancy_rate
            )
        } else {
            return None;
        };
        Some(anomaly(self.id(), Severity::Medium, 0.2, detail))
    }
}

#[derive(Debug, Clone)]
pub struct ValueDivergence {
    pub tolerance: f64,
}

impl FraudRule for ValueDivergence {
    fn id(&self) -> &str {
        "value_divergence"
    }

    fn evaluate(&self, ctx: &FraudContext<'_>) -> Option<Anomaly> {
        let estimate = ctx.signals?.estimated_value?;
        let claimed = ctx.submission.claimed_value;
        let d = divergence(claimed, estimate)?;
        (d > self.tolerance).then(|| {
            anomaly(
                self.id(),
                Severity::High,
                0.4,
                format!(
                    "claimed value {claimed} differs from oracle estimate {estimate} by {:.1}%",
                    d * 100.0
                ),
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct SizeDivergence {
    pub tolerance: f64,
}

impl FraudRule for SizeDivergence {
    fn id(&self) -> &str {
        "size_divergence"
    }

    fn evaluate(&self, ctx: &FraudContext<'_>) -> Option<Anomaly> {
        let footprint = ctx.signals?.estimated_size?;
        let claimed = ctx.submission.specifications.size;
        let d = divergence(claimed, footprint)?;
        (d > self.tolerance).then(|| {
            anomaly(
                self.id(),
                Severity::Medium,
                0.25,
                format!(
                    "claimed size {claimed} differs from observed footprint {footprint} by {:.1}%",
                    d * 100.0
                ),
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct RegistryMismatch;

impl FraudRule for RegistryMismatch {
    fn id(&self) -> &str {
        "registry_mismatch"
    }

    fn evaluate(&self, ctx: &FraudContext<'_>) -> Option<Anomaly> {
        match ctx.signals?.registry_valid {
            Some(false) => Some(anomaly(
                self.id(),
                Severity::High,
                0.6,
                "registry record does not match the claimed owner".to_string(),
            )),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fraud::FraudEngine;
    use ptk_core::submission::fixtures::office_tower;
    use ptk_oracle::OracleSignals;

    fn engine() -> FraudEngine {
        FraudEngine::with_baseline_rules(FraudConfig::default())
    }

    fn types(report: &crate::fraud::FraudReport) -> Vec<&str> {
        report
            .anomalies
            .iter()
            .map(|a| a.anomaly_type.as_str())
            .collect()
    }

    #[test]
    fn baseline_has_six_rules() {
        assert_eq!(engine().rule_count(), 6);
    }

    #[test]
    fn high_yield_alone_still_passes() {
        let mut sub = office_tower();
        sub.financials.expected_yield = 25.0;
        let report = engine().detect(&sub, None);
        assert_eq!(types(&report), vec!["high_yield"]);
        assert!((report.fraud_likelihood - 3.0).abs() < 1e-9);
        assert!(report.passed);
    }

    #[test]
    fn yield_at_limit_is_not_anomalous() {
        let mut sub = office_tower();
        sub.financials.expected_yield = 20.0;
        assert_eq!(engine().detect(&sub, None).anomaly_count, 0);
    }

    #[test]
    fn large_asset_with_high_yield() {
        let mut sub = office_tower();
        sub.specifications.size = 60_000.0;
        sub.financials.expected_yield = 16.0;
        let report = engine().detect(&sub, None);
        assert_eq!(types(&report), vec!["large_asset_high_yield"]);
        assert!((report.fraud_likelihood - 2.0).abs() < 1e-9);
    }

    #[test]
    fn large_asset_with_implausible_yield_trips_both() {
        let mut sub = office_tower();
        sub.specifications.size = 60_000.0;
        sub.financials.expected_yield = 22.0;
        let report = engine().detect(&sub, None);
        assert_eq!(types(&report), vec!["high_yield", "large_asset_high_yield"]);
        assert!((report.fraud_likelihood - 5.0).abs() < 1e-9);
        assert!(report.passed);
    }

    #[test]
    fn vacant_asset_collecting_rent() {
        let mut sub = office_tower();
        sub.financials.occupancy_rate = 0.0;
        let report = engine().detect(&sub, None);
        assert_eq!(types(&report), vec!["occupancy_inconsistency"]);
    }

    #[test]
    fn occupied_asset_without_income() {
        let mut sub = office_tower();
        sub.financials.current_rent = 0.0;
        sub.financials.tenant_count = 0;
        let report = engine().detect(&sub, None);
        assert_eq!(types(&report), vec!["occupancy_inconsistency"]);
    }

    #[test]
    fn value_divergence_uses_oracle_estimate() {
        let sub = office_tower();
        let close = OracleSignals {
            estimated_value: Some(70_000_000.0),
            ..Default::default()
        };
        assert_eq!(engine().detect(&sub, Some(&close)).anomaly_count, 0);

        let far = OracleSignals {
            estimated_value: Some(40_000_000.0),
            ..Default::default()
        };
        let report = engine().detect(&sub, Some(&far));
        assert_eq!(types(&report), vec!["value_divergence"]);
        assert!((report.fraud_likelihood - 4.0).abs() < 1e-9);
    }

    #[test]
    fn size_divergence_uses_oracle_footprint() {
        let sub = office_tower();
        let signals = OracleSignals {
            estimated_size: Some(15_000.0),
            ..Default::default()
        };
        let report = engine().detect(&sub, Some(&signals));
        assert_eq!(types(&report), vec!["size_divergence"]);
    }

    #[test]
    fn registry_mismatch_fails_on_its_own() {
        let signals = OracleSignals {
            registry_valid: Some(false),
            ..Default::default()
        };
        let report = engine().detect(&office_tower(), Some(&signals));
        assert_eq!(types(&report), vec!["registry_mismatch"]);
        assert!(!report.passed);
    }

    #[test]
    fn oracle_rules_are_silent_without_signals() {
        let mut sub = office_tower();
        sub.claimed_value = 1.0;
        assert_eq!(engine().detect(&sub, None).anomaly_count, 0);
        assert_eq!(
            engine()
                .detect(&sub, Some(&OracleSignals::default()))
                .anomaly_count,
            0
        );
    }

    #[test]
    fn zero_estimate_is_ignored() {
        let signals = OracleSignals {
            estimated_value: Some(0.0),
            estimated_size: Some(0.0),
            ..Default::default()
        };
        assert_eq!(engine().detect(&office_tower(), Some(&signals)).anomaly_count, 0);
    }
}
