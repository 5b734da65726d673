//! # Submission Routes
//!
//! Intake, verification trigger, progress polling and per-stage results.
//! Verification runs inline: `POST /verify` returns once the run is
//! finalized, while concurrent pollers read `/progress`.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ptk_core::{AssetSubmission, SubmissionId};
use ptk_pipeline::{Progress, SubmissionRecord, VerifyOutcome};
use ptk_state::{Stage, SubmissionStatus};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json};
use crate::state::AppState;

// ── Response DTOs ───────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedSubmission {
    #[schema(value_type = String, format = Uuid)]
    pub submission_id: SubmissionId,
    #[schema(value_type = String, example = "pending")]
    pub status: SubmissionStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionList {
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<SubmissionRecord>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/v1/submissions",
            post(create_submission).get(list_submissions),
        )
        .route("/v1/submissions/{id}", get(get_submission))
        .route("/v1/submissions/{id}/verify", post(verify_submission))
        .route("/v1/submissions/{id}/progress", get(get_progress))
        .route(
            "/v1/submissions/{id}/results/{stage}",
            get(get_stage_result),
        )
}

/// POST /v1/submissions — Validate and store a submission.
#[utoipa::path(
    post,
    path = "/v1/submissions",
    request_body = serde_json::Value,
    responses(
        (status = 201, description = "Submission accepted", body = CreatedSubmission),
        (status = 400, description = "Malformed JSON", body = crate::error::ErrorBody),
        (status = 422, description = "Field invariants violated", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
pub(crate) async fn create_submission(
    State(state): State<AppState>,
    body: Result<Json<AssetSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedSubmission>), AppError> {
    let submission = extract_validated_json(body)?;
    let record = state.orchestrator.submit(submission)?;
    Ok((
        StatusCode::CREATED,
        Json(CreatedSubmission {
            submission_id: record.id,
            status: record.status,
        }),
    ))
}

/// GET /v1/submissions — List submissions, oldest first.
#[utoipa::path(
    get,
    path = "/v1/submissions",
    responses((status = 200, description = "All submissions", body = SubmissionList)),
    tag = "submissions"
)]
pub(crate) async fn list_submissions(State(state): State<AppState>) -> Json<SubmissionList> {
    let data = state.orchestrator.submissions();
    Json(SubmissionList {
        count: data.len(),
        data,
    })
}

/// GET /v1/submissions/{id}
#[utoipa::path(
    get,
    path = "/v1/submissions/{id}",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Submission found", body = serde_json::Value),
        (status = 400, description = "Malformed submission ID", body = crate::error::ErrorBody),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
pub(crate) async fn get_submission(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<SubmissionRecord>, AppError> {
    let id = SubmissionId::from(extract_path(path)?);
    Ok(Json(state.orchestrator.submission(&id)?))
}

/// POST /v1/submissions/{id}/verify — Run the verification pipeline once.
#[utoipa::path(
    post,
    path = "/v1/submissions/{id}/verify",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Verification finished", body = serde_json::Value),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
        (status = 409, description = "Verification already started", body = crate::error::ErrorBody),
        (status = 502, description = "Every collaborator failed", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
pub(crate) async fn verify_submission(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<VerifyOutcome>, AppError> {
    let id = SubmissionId::from(extract_path(path)?);
    Ok(Json(state.orchestrator.verify(&id).await?))
}

/// GET /v1/submissions/{id}/progress
#[utoipa::path(
    get,
    path = "/v1/submissions/{id}/progress",
    params(("id" = Uuid, Path, description = "Submission ID")),
    responses(
        (status = 200, description = "Current stage and progress log", body = serde_json::Value),
        (status = 404, description = "Submission not found", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
pub(crate) async fn get_progress(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Progress>, AppError> {
    let id = SubmissionId::from(extract_path(path)?);
    Ok(Json(state.orchestrator.progress(&id)?))
}

/// GET /v1/submissions/{id}/results/{stage}
///
/// `stage` is one of `oracle`, `market`, `fraud`, `consensus` or `full`.
#[utoipa::path(
    get,
    path = "/v1/submissions/{id}/results/{stage}",
    params(
        ("id" = Uuid, Path, description = "Submission ID"),
        ("stage" = String, Path, description = "oracle | market | fraud | consensus | full"),
    ),
    responses(
        (status = 200, description = "Stage result", body = serde_json::Value),
        (status = 400, description = "Unknown stage name", body = crate::error::ErrorBody),
        (status = 404, description = "Stage has not executed yet", body = crate::error::ErrorBody),
    ),
    tag = "submissions"
)]
pub(crate) async fn get_stage_result(
    State(state): State<AppState>,
    path: Result<Path<(Uuid, String)>, PathRejection>,
) -> Result<Response, AppError> {
    let (id, stage) = extract_path(path)?;
    let id = SubmissionId::from(id);
    let orchestrator = &state.orchestrator;
    if stage == "full" {
        return Ok(Json(orchestrator.full_result(&id)?).into_response());
    }
    match Stage::from_name(&stage) {
        Some(Stage::Consensus) => Ok(Json(orchestrator.consensus_result(&id)?).into_response()),
        Some(evidence) => Ok(Json(orchestrator.stage_result(&id, evidence)?).into_response()),
        None => Err(AppError::BadRequest(format!(
            "unknown stage '{stage}', expected oracle, market, fraud, consensus or full"
        ))),
    }
}
