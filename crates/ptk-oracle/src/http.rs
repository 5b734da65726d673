//! # HTTP Oracle Adapter
//!
//! Talks to an oracle network over JSON:
//!
//! ```text
//! POST {base_url}/verify
//! { "submissionId": "...", "submission": { ...AssetSubmission... } }
//! → 200 OracleReport
//! ```

use std::time::{Duration, Instant};

use async_trait::async_trait;
use ptk_core::{AssetSubmission, SubmissionId};
use serde::Serialize;
use url::Url;

use crate::adapter::OracleAdapter;
use crate::error::OracleError;
use crate::evidence::OracleReport;

/// Connection settings for [`HttpOracle`].
///
/// Custom `Debug` redacts the API token.
#[derive(Clone)]
pub struct OracleConfig {
    pub base_url: Url,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

impl std::fmt::Debug for OracleConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OracleConfig")
            .field("base_url", &self.base_url)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl OracleConfig {
    /// Load configuration from environment variables.
    ///
    /// - `PTK_ORACLE_URL` (required)
    /// - `PTK_ORACLE_TOKEN` (optional bearer token)
    /// - `PTK_ORACLE_TIMEOUT_SECS` (default: 10)
    pub fn from_env() -> Result<Self, OracleError> {
        let raw = std::env::var("PTK_ORACLE_URL").map_err(|_| OracleError::NotConfigured {
            reason: "PTK_ORACLE_URL is not set".to_string(),
        })?;
        let base_url = Url::parse(&raw).map_err(|e| OracleError::NotConfigured {
            reason: format!("PTK_ORACLE_URL is not a URL: {e}"),
        })?;
        Ok(Self {
            base_url,
            api_token: std::env::var("PTK_ORACLE_TOKEN").ok(),
            timeout_secs: std::env::var("PTK_ORACLE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
        })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    submission_id: SubmissionId,
    submission: &'a AssetSubmission,
}

#[derive(Debug, Clone)]
pub struct HttpOracle {
    http: reqwest::Client,
    verify_url: Url,
    api_token: Option<String>,
}

impl HttpOracle {
    pub fn new(config: OracleConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OracleError::NotConfigured {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        // `join` replaces the last path segment unless the base ends in '/'.
        let mut base = config.base_url.clone();
        if !base.path().ends_with('/') {
            let dir = format!("{}/", base.path());
            base.set_path(&dir);
        }
        let verify_url = base
            .join("verify")
            .map_err(|e| OracleError::NotConfigured {
                reason: format!("cannot derive verify URL: {e}"),
            })?;
        Ok(Self {
            http,
            verify_url,
            api_token: config.api_token,
        })
    }
}

#[async_trait]
impl OracleAdapter for HttpOracle {
    async fn verify(
        &self,
        id: SubmissionId,
        submission: &AssetSubmission,
    ) -> Result<OracleReport, OracleError> {
        let started = Instant::now();
        let mut req = self.http.post(self.verify_url.clone()).json(&VerifyRequest {
            submission_id: id,
            submission,
        });
        if let Some(token) = &self.api_token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await.map_err(|e| {
            if e.is_timeout() {
                OracleError::Timeout {
                    elapsed_ms: started.elapsed().as_millis() as u64,
                }
            } else {
                OracleError::Unavailable {
                    reason: e.to_string(),
                }
            }
        })?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(OracleError::Unavailable {
                reason: format!("oracle returned {status}"),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(OracleError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let report = resp
            .json::<OracleReport>()
            .await
            .map_err(|e| OracleError::InvalidResponse {
                reason: e.to_string(),
            })?;
        tracing::debug!(
            submission_id = %id,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "oracle report received"
        );
        Ok(report)
    }

    fn adapter_name(&self) -> &str {
        "HttpOracle"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{Evidence, OracleSignals};
    use ptk_core::submission::fixtures::office_tower;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> OracleConfig {
        OracleConfig {
            base_url: Url::parse(&format!("{}/", server.uri())).unwrap(),
            api_token: Some("t0k3n".to_string()),
            timeout_secs: 5,
        }
    }

    fn sample_report() -> OracleReport {
        let ev = |s: &str, c: f64| Evidence {
            source: s.to_string(),
            raw_data: serde_json::Value::Null,
            derived_signal: "ok".to_string(),
            confidence: c,
            explanation: String::new(),
        };
        OracleReport::from_sources(
            ev("Satellite", 0.9),
            ev("Registry", 0.8),
            ev("Activity", 0.7),
            OracleSignals {
                estimated_value: Some(70_000_000.0),
                ..Default::default()
            },
        )
    }

    #[test]
    fn debug_redacts_token() {
        let cfg = OracleConfig {
            base_url: Url::parse("http://oracle.local/").unwrap(),
            api_token: Some("secret".to_string()),
            timeout_secs: 1,
        };
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("secret"));
        assert!(dbg.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn decodes_report() {
        let server = MockServer::start().await;
        let report = sample_report();
        Mock::given(method("POST"))
            .and(path("/verify"))
            .and(header("authorization", "Bearer t0k3n"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&report))
            .mount(&server)
            .await;

        let oracle = HttpOracle::new(config_for(&server)).unwrap();
        let got = oracle
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap();
        assert_eq!(got.signals.estimated_value, Some(70_000_000.0));
        assert!((got.ownership_score() - 0.8).abs() < 1e-12);
    }

    #[tokio::test]
    async fn base_path_without_trailing_slash_is_kept() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/verify"))
            .respond_with(ResponseTemplate::new(200).set_body_json(sample_report()))
            .expect(1)
            .mount(&server)
            .await;

        let config = OracleConfig {
            base_url: Url::parse(&format!("{}/api", server.uri())).unwrap(),
            ..config_for(&server)
        };
        let oracle = HttpOracle::new(config).unwrap();
        assert!(oracle.verify_url.as_str().ends_with("/api/verify"));
        oracle
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn server_error_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;
        let oracle = HttpOracle::new(config_for(&server)).unwrap();
        let err = oracle
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn client_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad coordinates"))
            .mount(&server)
            .await;
        let oracle = HttpOracle::new(config_for(&server)).unwrap();
        let err = oracle
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap_err();
        match err {
            OracleError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad coordinates");
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;
        let oracle = HttpOracle::new(config_for(&server)).unwrap();
        let err = oracle
            .verify(SubmissionId::new(), &office_tower())
            .await
            .unwrap_err();
        assert!(matches!(err, OracleError::InvalidResponse { .. }));
    }
}
