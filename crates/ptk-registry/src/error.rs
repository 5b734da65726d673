use ptk_core::{AssetId, CanonicalizationError, SubmissionId};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    /// Only submissions with an eligible consensus may be admitted.
    #[error("submission {submission_id} is not eligible for tokenization")]
    NotEligible { submission_id: SubmissionId },

    #[error("submission {submission_id} is already registered as asset {asset_id}")]
    AlreadyRegistered {
        submission_id: SubmissionId,
        asset_id: AssetId,
    },

    #[error("no registry entry for asset {asset_id}")]
    InvalidAsset { asset_id: AssetId },

    #[error("requested {requested} tokens but only {available} are available")]
    InsufficientSupply { requested: u64, available: u64 },

    #[error("invalid claim: {reason}")]
    InvalidClaim { reason: String },

    #[error("fingerprint computation failed: {0}")]
    Fingerprint(#[from] CanonicalizationError),
}
