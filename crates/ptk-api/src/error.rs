//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps [`PipelineError`] to HTTP status codes and JSON bodies of the form
//! `{"error": {"code", "message", "details?"}}`. Internal error details are
//! logged, never returned.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ptk_core::ValidationError;
use ptk_pipeline::PipelineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "NOT_FOUND", "VALIDATION_ERROR").
    pub code: String,
    pub message: String,
    /// Field violations for 422 responses, otherwise absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Object>)]
    pub details: Option<serde_json::Value>,
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Field invariants violated (422).
    #[error("{0}")]
    Validation(ValidationError),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Verification already started or finished (409).
    #[error("{0}")]
    AlreadyProcessed(String),

    /// Claim exceeds the tokens still available (409).
    #[error("{0}")]
    InsufficientSupply(String),

    /// Claim against an asset that is not in the registry (404).
    #[error("{0}")]
    InvalidAsset(String),

    /// Every verification collaborator failed (502).
    #[error("{0}")]
    CollaboratorFailure(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::AlreadyProcessed(_) => (StatusCode::CONFLICT, "ALREADY_PROCESSED"),
            Self::InsufficientSupply(_) => (StatusCode::CONFLICT, "INSUFFICIENT_SUPPLY"),
            Self::InvalidAsset(_) => (StatusCode::NOT_FOUND, "INVALID_ASSET"),
            Self::CollaboratorFailure(_) => (StatusCode::BAD_GATEWAY, "COLLABORATOR_FAILURE"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn details(&self) -> Option<serde_json::Value> {
        match self {
            Self::Validation(err) => serde_json::to_value(&err.violations).ok(),
            _ => None,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details: self.details(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err)
    }
}

impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(e) => Self::Validation(e),
            e @ PipelineError::NotFound { .. } => Self::NotFound(e.to_string()),
            e @ PipelineError::AlreadyProcessed { .. } => Self::AlreadyProcessed(e.to_string()),
            e @ PipelineError::InsufficientSupply { .. } => {
                Self::InsufficientSupply(e.to_string())
            }
            PipelineError::InvalidAsset(msg) => Self::InvalidAsset(msg),
            e @ PipelineError::CollaboratorFailure(_) => Self::CollaboratorFailure(e.to_string()),
            PipelineError::Internal(msg) => Self::Internal(msg),
        }
    }
}
