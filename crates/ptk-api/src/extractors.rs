//! # Custom Extractors & Validation
//!
//! Provides the [`Validate`] trait for request DTOs and helpers to extract
//! and validate JSON bodies in handlers.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::Path;
use axum::Json;
use ptk_core::{AssetSubmission, ValidationError};

use crate::error::AppError;

/// Request types that check business rules beyond what serde enforces.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

impl Validate for AssetSubmission {
    fn validate(&self) -> Result<(), ValidationError> {
        AssetSubmission::validate(self)
    }
}

/// Extract a JSON body.
///
/// Broken JSON syntax or a missing content type is a 400; JSON that parses
/// but does not fit the target type is a 422 with the serde message as the
/// field detail.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    result.map(|Json(v)| v).map_err(|err| match err {
        JsonRejection::JsonDataError(e) => {
            AppError::Validation(ValidationError::single("body", e.body_text()))
        }
        other => AppError::BadRequest(other.body_text()),
    })
}

/// Extract path parameters, so a malformed identifier gets the JSON error
/// body instead of axum's plain-text rejection.
pub fn extract_path<T>(result: Result<Path<T>, PathRejection>) -> Result<T, AppError> {
    result
        .map(|Path(v)| v)
        .map_err(|err| AppError::BadRequest(err.body_text()))
}

/// Extract a JSON body and validate it using the [`Validate`] trait.
pub fn extract_validated_json<T: Validate>(
    result: Result<Json<T>, JsonRejection>,
) -> Result<T, AppError> {
    let value = extract_json(result)?;
    value.validate()?;
    Ok(value)
}
