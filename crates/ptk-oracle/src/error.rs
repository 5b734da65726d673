use thiserror::Error;

/// Errors from oracle adapters.
#[derive(Error, Debug)]
pub enum OracleError {
    /// The oracle network is unreachable or answered with a 5xx status.
    #[error("oracle unavailable: {reason}")]
    Unavailable { reason: String },

    /// The oracle did not answer within the configured deadline.
    #[error("oracle request timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The oracle answered, but not with a report we can read.
    #[error("invalid oracle response: {reason}")]
    InvalidResponse { reason: String },

    /// The oracle rejected the request (4xx).
    #[error("oracle rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Adapter configuration is missing or malformed.
    #[error("oracle not configured: {reason}")]
    NotConfigured { reason: String },
}
