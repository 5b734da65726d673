use ptk_core::ValidationError;
use ptk_registry::RegistryError;
use ptk_state::SubmissionStatus;
use thiserror::Error;

/// Outcome taxonomy of pipeline operations.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The caller sent something that can be fixed and resent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    /// Verification was already started for this submission.
    #[error("submission {id} was already processed (status: {status})")]
    AlreadyProcessed { id: String, status: SubmissionStatus },

    #[error("requested {requested} tokens but only {available} are available")]
    InsufficientSupply { requested: u64, available: u64 },

    #[error("invalid asset: {0}")]
    InvalidAsset(String),

    /// Every collaborator failed; the run was finalized without evidence.
    #[error("all verification collaborators failed: {0}")]
    CollaboratorFailure(String),

    /// Never shown to clients.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}

impl From<RegistryError> for PipelineError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::InsufficientSupply {
                requested,
                available,
            } => Self::InsufficientSupply {
                requested,
                available,
            },
            RegistryError::InvalidAsset { asset_id } => {
                Self::InvalidAsset(format!("no registry entry for asset {asset_id}"))
            }
            RegistryError::InvalidClaim { reason } => {
                Self::Validation(ValidationError::single("claim", reason))
            }
            other => Self::Internal(other.to_string()),
        }
    }
}
