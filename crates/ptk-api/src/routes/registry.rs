//! # Registry Routes
//!
//! Read access to tokenizable assets and the claim operation. Claims on one
//! asset are serialized by the registry; different assets never contend.

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use ptk_core::{AssetId, ValidationError};
use ptk_registry::{Claim, RegistryEntry};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AppError;
use crate::extractors::{extract_path, extract_validated_json, Validate};
use crate::state::AppState;

// ── Request/Response DTOs ───────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRequest {
    pub claimant_id: String,
    pub tokens_to_acquire: u64,
}

impl Validate for ClaimRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.claimant_id.trim().is_empty() {
            return Err(ValidationError::single("claimantId", "must not be empty"));
        }
        if self.tokens_to_acquire == 0 {
            return Err(ValidationError::single(
                "tokensToAcquire",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClaimResponse {
    #[schema(value_type = Object)]
    pub claim: Claim,
    /// Tokens left on the asset right after this claim was recorded.
    pub available_tokens: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegistryList {
    pub count: usize,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<RegistryEntry>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/registry", get(list_entries))
        .route("/v1/registry/{asset_id}", get(get_entry))
        .route("/v1/registry/{asset_id}/claim", post(claim_tokens))
}

/// GET /v1/registry — All tokenizable assets, in admission order.
#[utoipa::path(
    get,
    path = "/v1/registry",
    responses((status = 200, description = "Registry entries", body = RegistryList)),
    tag = "registry"
)]
pub(crate) async fn list_entries(State(state): State<AppState>) -> Json<RegistryList> {
    let data = state.orchestrator.registry_entries();
    Json(RegistryList {
        count: data.len(),
        data,
    })
}

/// GET /v1/registry/{asset_id}
#[utoipa::path(
    get,
    path = "/v1/registry/{asset_id}",
    params(("asset_id" = Uuid, Path, description = "Asset ID")),
    responses(
        (status = 200, description = "Registry entry", body = serde_json::Value),
        (status = 404, description = "Asset not found", body = crate::error::ErrorBody),
    ),
    tag = "registry"
)]
pub(crate) async fn get_entry(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<RegistryEntry>, AppError> {
    let asset_id = AssetId::from(extract_path(path)?);
    Ok(Json(state.orchestrator.registry_entry(&asset_id)?))
}

/// POST /v1/registry/{asset_id}/claim — Acquire tokens of an asset.
#[utoipa::path(
    post,
    path = "/v1/registry/{asset_id}/claim",
    params(("asset_id" = Uuid, Path, description = "Asset ID")),
    request_body = ClaimRequest,
    responses(
        (status = 201, description = "Claim recorded", body = ClaimResponse),
        (status = 404, description = "Asset not in the registry", body = crate::error::ErrorBody),
        (status = 409, description = "Not enough tokens available", body = crate::error::ErrorBody),
        (status = 422, description = "Invalid claim", body = crate::error::ErrorBody),
    ),
    tag = "registry"
)]
pub(crate) async fn claim_tokens(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ClaimResponse>), AppError> {
    let asset_id = AssetId::from(extract_path(path)?);
    let req = extract_validated_json(body)?;
    let claim = state
        .orchestrator
        .claim(&asset_id, &req.claimant_id, req.tokens_to_acquire)?;
    Ok((
        StatusCode::CREATED,
        Json(ClaimResponse {
            available_tokens: claim.available_after,
            claim,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_request_rejects_empty_claimant() {
        let req = ClaimRequest {
            claimant_id: "  ".into(),
            tokens_to_acquire: 5,
        };
        assert!(req.validate().unwrap_err().has_field("claimantId"));
    }

    #[test]
    fn claim_request_rejects_zero_tokens() {
        let req = ClaimRequest {
            claimant_id: "investor-1".into(),
            tokens_to_acquire: 0,
        };
        assert!(req.validate().unwrap_err().has_field("tokensToAcquire"));
    }

    #[test]
    fn claim_request_is_camel_case() {
        let req: ClaimRequest =
            serde_json::from_str(r#"{"claimantId":"inv","tokensToAcquire":3}"#).unwrap();
        assert_eq!(req.tokens_to_acquire, 3);
        assert!(req.validate().is_ok());
    }
}
