use async_trait::async_trait;
use ptk_core::{AssetSubmission, SubmissionId};

use crate::error::OracleError;
use crate::evidence::OracleReport;

/// Source of corroborating evidence for a submission.
///
/// Implementations must be `Send + Sync` so one adapter can be shared by
/// every concurrent verification run behind an `Arc`. The trait is
/// object-safe so the backend can be chosen at startup.
#[async_trait]
pub trait OracleAdapter: Send + Sync {
    /// Gather evidence for `submission`.
    async fn verify(
        &self,
        id: SubmissionId,
        submission: &AssetSubmission,
    ) -> Result<OracleReport, OracleError>;

    /// Human-readable adapter name for logs (e.g. "StubOracle").
    fn adapter_name(&self) -> &str;
}
