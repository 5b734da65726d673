use thiserror::Error;

/// Errors from market and fraud engines.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// The comparable provider had nothing for this location.
    #[error("no comparables available for {location}")]
    NoComparables { location: String },

    /// Inputs produced a valuation that cannot be divided by.
    #[error("degenerate valuation: {reason}")]
    DegenerateValuation { reason: String },

    /// A remote engine could not be reached.
    #[error("{engine} engine unavailable: {reason}")]
    Unavailable { engine: String, reason: String },
}
