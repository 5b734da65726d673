//! # Error Hierarchy
//!
//! Structured error types for the foundational layer, built with `thiserror`.
//! No `Box<dyn Error>`, no `.unwrap()` outside tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single violated field invariant.
///
/// `field` is the camelCase JSON path of the offending value
/// (e.g. `financials.occupancyRate`), matching the wire format so clients
/// can map the violation straight back to their payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Submission validation failure carrying every violated field.
///
/// Never empty when returned from a validator: a validator with no
/// violations returns `Ok(())` instead.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{} invalid field(s): {}", .violations.len(), join_violations(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    /// Build an error from a single violation.
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            violations: vec![FieldViolation::new(field, message)],
        }
    }

    /// Whether the named field appears among the violations.
    pub fn has_field(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// NaN and infinities have no JSON representation.
    #[error("non-finite number cannot be canonicalized: {0}")]
    NonFinite(f64),

    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_lists_every_field() {
        let err = ValidationError {
            violations: vec![
                FieldViolation::new("claimedValue", "must be greater than 0"),
                FieldViolation::new("location.coordinates.lat", "must be within [-90, 90]"),
            ],
        };
        let msg = err.to_string();
        assert!(msg.starts_with("2 invalid field(s)"));
        assert!(msg.contains("claimedValue: must be greater than 0"));
        assert!(msg.contains("location.coordinates.lat"));
    }

    #[test]
    fn has_field_matches_exact_path() {
        let err = ValidationError::single("financials.expectedYield", "out of range");
        assert!(err.has_field("financials.expectedYield"));
        assert!(!err.has_field("expectedYield"));
    }

    #[test]
    fn field_violation_serializes_camel_paths() {
        let v = FieldViolation::new("financials.occupancyRate", "must be within [0, 100]");
        let json = serde_json::to_value(&v).unwrap();
        assert_eq!(json["field"], "financials.occupancyRate");
    }
}
