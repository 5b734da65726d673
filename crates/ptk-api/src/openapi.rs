//! # OpenAPI Specification Assembly
//!
//! Assembles the utoipa-documented routes into one OpenAPI spec served at
//! `/openapi.json`.

use axum::routing::get;
use axum::{Json, Router};
use utoipa::OpenApi;

use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Property Tokenization Verification API",
        version = "0.1.0",
        description = "Submission intake, multi-stage verification with consensus, and the registry of tokenizable assets.",
        license(name = "AGPL-3.0-or-later")
    ),
    paths(
        // Submissions
        crate::routes::submissions::create_submission,
        crate::routes::submissions::list_submissions,
        crate::routes::submissions::get_submission,
        crate::routes::submissions::verify_submission,
        crate::routes::submissions::get_progress,
        crate::routes::submissions::get_stage_result,
        // Registry
        crate::routes::registry::list_entries,
        crate::routes::registry::get_entry,
        crate::routes::registry::claim_tokens,
    ),
    components(schemas(
        crate::error::ErrorBody,
        crate::error::ErrorDetail,
        crate::routes::submissions::CreatedSubmission,
        crate::routes::submissions::SubmissionList,
        crate::routes::registry::ClaimRequest,
        crate::routes::registry::ClaimResponse,
        crate::routes::registry::RegistryList,
    )),
    tags(
        (name = "submissions", description = "Submission intake and verification"),
        (name = "registry", description = "Tokenizable assets and claims"),
    )
)]
pub struct ApiDoc;

pub fn router() -> Router<AppState> {
    Router::new().route("/openapi.json", get(openapi_json))
}

/// GET /openapi.json
async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
