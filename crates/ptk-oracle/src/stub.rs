//! # Stub Oracle
//!
//! Deterministic oracle for development and tests. Every submission gets the
//! same three evidence items with fixed confidences:
//!
//! | Source | Confidence |
//! |---|---|
//! | Satellite Imagery | 0.92 |
//! | Property Registry | 0.88 |
//! | Activity Signals | 0.78 |
//!
//! Unless overridden with [`StubOracle::with_signals`], the corroborating
//! signals echo the submission: the satellite footprint equals the claimed
//! size, the registry is valid when registry ids were supplied, and
//! documents are verified when document URLs were supplied. No valuation
//! estimate is produced.

use std::time::Duration;

use async_trait::async_trait;
use ptk_core::{AssetSubmission, SubmissionId};
use serde_json::json;

use crate::adapter::OracleAdapter;
use crate::error::OracleError;
use crate::evidence::{Evidence, OracleReport, OracleSignals};

pub const SATELLITE_CONFIDENCE: f64 = 0.92;
pub const REGISTRY_CONFIDENCE: f64 = 0.88;
pub const ACTIVITY_CONFIDENCE: f64 = 0.78;

#[derive(Debug, Clone, Default)]
pub struct StubOracle {
    signals: Option<OracleSignals>,
    failure: Option<String>,
    delay: Option<Duration>,
}

impl StubOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer with these signals instead of echoing the submission.
    pub fn with_signals(mut self, signals: OracleSignals) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Fail every request with `OracleError::Unavailable`.
    pub fn failing(mut self, reason: impl Into<String>) -> Self {
        self.failure = Some(reason.into());
        self
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn echo_signals(submission: &AssetSubmission) -> OracleSignals {
        OracleSignals {
            estimated_size: Some(submission.specifications.size),
            estimated_value: None,
            registry_valid: Some(!submission.registry_ids.is_empty()),
            documents_verified: Some(!submission.document_urls.is_empty()),
        }
    }
}

#[async_trait]
impl OracleAdapter for StubOracle {
    async fn verify(
        &self,
        id: SubmissionId,
        submission: &AssetSubmission,
    ) -> Result<OracleReport, OracleError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(reason) = &self.failure {
            return Err(OracleError::Unavailable {
                reason: reason.clone(),
            });
        }

        let loc = &submission.location;
        let (lat, lng) = (loc.coordinates.lat, loc.coordinates.lng);
        let registry_id = submission
            .registry_ids
            .first()
            .cloned()
            .unwrap_or_default();
        tracing::debug!(submission_id = %id, city = %loc.city, "stub oracle answering");

        let satellite = Evidence {
            source: "Satellite Imagery".to_string(),
            raw_data: json!({
                "coordinates": {"lat": lat, "lng": lng},
                "resolution": "50cm/pixel",
            }),
            derived_signal: "Built structure visible at coordinates".to_string(),
            confidence: SATELLITE_CONFIDENCE,
            explanation: format!(
                "Imagery shows a built-up structure at [{lat}, {lng}]."
            ),
        };
        let registry = Evidence {
            source: "Property Registry".to_string(),
            raw_data: json!({
                "registryId": registry_id,
                "jurisdiction": format!("{}, {}", loc.city, loc.country),
            }),
            derived_signal: "Registry record found matching owner".to_string(),
            confidence: REGISTRY_CONFIDENCE,
            explanation: format!(
                "Registry record {registry_id} lists {} as holder.",
                submission.spv.spv_name
            ),
        };
        let activity = Evidence {
            source: "Activity Signals".to_string(),
            raw_data: json!({
                "address": loc.address,
                "signals": ["commercial zoning", "active power usage"],
            }),
            derived_signal: "Active commercial zone".to_string(),
            confidence: ACTIVITY_CONFIDENCE,
            explanation: "Sustained utility usage and footfall at the address.".to_string(),
        };

        let signals = self
            .signals
            .clone()
            .unwrap_or_else(|| Self::echo_signals(submission));
        Ok(OracleReport::from_sources(satellite, registry, activity, signals))
    }

    fn adapter_name(&self) -> &str {
        "StubOracle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ptk_core::submission::fixtures::office_tower;

    #[tokio::test]
    async fn fixed_confidences() {
        let report = StubOracle::new()
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap();
        assert!((report.existence_score() - 0.85).abs() < 1e-12);
        assert!((report.ownership_score() - 0.88).abs() < 1e-12);
        assert!((report.activity_score() - 0.78).abs() < 1e-12);
    }

    #[tokio::test]
    async fn echoes_submission_by_default() {
        let sub = office_tower();
        let report = StubOracle::new()
            .verify(SubmissionId::new(), &sub)
            .await
            .unwrap();
        assert_eq!(report.signals.estimated_size, Some(sub.specifications.size));
        assert_eq!(report.signals.registry_valid, Some(true));
        assert_eq!(report.signals.documents_verified, Some(true));
        assert_eq!(report.signals.estimated_value, None);
    }

    #[tokio::test]
    async fn missing_registry_ids_mean_invalid_registry() {
        let mut sub = office_tower();
        sub.registry_ids.clear();
        let report = StubOracle::new()
            .verify(SubmissionId::new(), &sub)
            .await
            .unwrap();
        assert_eq!(report.signals.registry_valid, Some(false));
    }

    #[tokio::test]
    async fn overridden_signals_are_returned() {
        let signals = OracleSignals {
            estimated_value: Some(1.0),
            ..Default::default()
        };
        let report = StubOracle::new()
            .with_signals(signals.clone())
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap();
        assert_eq!(report.signals, signals);
    }

    #[tokio::test]
    async fn failing_stub_errors() {
        let err = StubOracle::new()
            .failing("down for maintenance")
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Unavailable { .. }));
        assert!(err.to_string().contains("down for maintenance"));
    }
}
