//! # Integration Tests for ptk-api
//!
//! Drives the full router with `oneshot`: health probes, submission intake
//! and validation, verification and its idempotency, progress polling,
//! stage results, registry reads and claims, and OpenAPI generation.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use ptk_core::submission::fixtures::office_tower;
use ptk_oracle::StubOracle;
use ptk_pipeline::{Orchestrator, PipelineConfig};
use serde_json::{json, Value};
use tower::ServiceExt;

use ptk_api::state::{AppConfig, AppState};

/// Helper: build the test app over a seeded pipeline and the stub oracle.
fn test_app() -> axum::Router {
    let mut config = PipelineConfig::default();
    config.market.comparable_seed = Some(7);
    let orchestrator = Orchestrator::new(config, Arc::new(StubOracle::new()));
    ptk_api::app(AppState::with_orchestrator(AppConfig::default(), orchestrator))
}

async fn body_string(response: axum::http::Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: axum::http::Response<Body>) -> Value {
    serde_json::from_str(&body_string(response).await).unwrap()
}

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> axum::http::Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.clone().oneshot(request).await.unwrap()
}

async fn create(app: &axum::Router, submission: Value) -> String {
    let response = send(app, "POST", "/v1/submissions", Some(submission)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["submissionId"]
        .as_str()
        .unwrap()
        .to_string()
}

fn tower_json() -> Value {
    serde_json::to_value(office_tower()).unwrap()
}

// -- Health Probes ------------------------------------------------------------

#[tokio::test]
async fn test_liveness_probe() {
    let response = send(&test_app(), "GET", "/health/liveness", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ok");
}

#[tokio::test]
async fn test_readiness_probe() {
    let response = send(&test_app(), "GET", "/health/readiness", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "ready");
}

// -- Submission Intake --------------------------------------------------------

#[tokio::test]
async fn test_create_submission_returns_pending() {
    let app = test_app();
    let response = send(&app, "POST", "/v1/submissions", Some(tower_json())).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "pending");

    let id = body["submissionId"].as_str().unwrap();
    let response = send(&app, "GET", &format!("/v1/submissions/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let record = body_json(response).await;
    assert_eq!(record["assetName"], "Prestige Tech Park Tower B");
}

#[tokio::test]
async fn test_list_submissions() {
    let app = test_app();
    create(&app, tower_json()).await;
    create(&app, tower_json()).await;
    let body = body_json(send(&app, "GET", "/v1/submissions", None).await).await;
    assert_eq!(body["count"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_out_of_range_yield_is_422_with_field_detail() {
    let app = test_app();
    let mut submission = tower_json();
    submission["financials"]["expectedYield"] = json!(150.0);
    let response = send(&app, "POST", "/v1/submissions", Some(submission)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    let fields: Vec<&str> = body["error"]["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|v| v["field"].as_str())
        .collect();
    assert!(fields.contains(&"financials.expectedYield"));

    let list = body_json(send(&app, "GET", "/v1/submissions", None).await).await;
    assert_eq!(list["count"], 0);
}

#[tokio::test]
async fn test_latitude_boundary_is_inclusive() {
    let app = test_app();
    let mut submission = tower_json();
    submission["location"]["coordinates"]["lat"] = json!(90.0);
    create(&app, submission.clone()).await;

    submission["location"]["coordinates"]["lat"] = json!(90.0001);
    let response = send(&app, "POST", "/v1/submissions", Some(submission)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let response = test_app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/v1/submissions")
                .header("content-type", "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_wrong_shape_is_422() {
    let response = send(
        &test_app(),
        "POST",
        "/v1/submissions",
        Some(json!({"assetName": "missing everything else"})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_submission_is_404() {
    let app = test_app();
    let id = uuid::Uuid::new_v4();
    for uri in [
        format!("/v1/submissions/{id}"),
        format!("/v1/submissions/{id}/progress"),
    ] {
        let response = send(&app, "GET", &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    let response = send(&app, "POST", &format!("/v1/submissions/{id}/verify"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_id_is_400_json() {
    let app = test_app();
    for (method, uri) in [
        ("GET", "/v1/submissions/not-a-uuid"),
        ("GET", "/v1/submissions/not-a-uuid/progress"),
        ("POST", "/v1/submissions/not-a-uuid/verify"),
        ("GET", "/v1/submissions/not-a-uuid/results/oracle"),
        ("GET", "/v1/registry/not-a-uuid"),
    ] {
        let response = send(&app, method, uri, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method} {uri}");
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "BAD_REQUEST", "{method} {uri}");
    }

    let response = send(
        &app,
        "POST",
        "/v1/registry/not-a-uuid/claim",
        Some(json!({"claimantId": "investor-1", "tokensToAcquire": 1})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"]["code"], "BAD_REQUEST");
}

// -- Verification -------------------------------------------------------------

#[tokio::test]
async fn test_dropped_verify_request_still_finishes() {
    let mut config = PipelineConfig::default();
    config.market.comparable_seed = Some(7);
    config.stage_timeout_ms = 10_000;
    let oracle = StubOracle::new().with_delay(Duration::from_millis(200));
    let orchestrator = Orchestrator::new(config, Arc::new(oracle));
    let app = ptk_api::app(AppState::with_orchestrator(AppConfig::default(), orchestrator));
    let id = create(&app, tower_json()).await;

    let verify_uri = format!("/v1/submissions/{id}/verify");
    let dropped = tokio::time::timeout(
        Duration::from_millis(20),
        send(&app, "POST", &verify_uri, None),
    )
    .await;
    assert!(dropped.is_err());

    tokio::time::sleep(Duration::from_millis(500)).await;
    let record = body_json(send(&app, "GET", &format!("/v1/submissions/{id}"), None).await).await;
    assert_eq!(record["status"], "eligible");
    let progress =
        body_json(send(&app, "GET", &format!("/v1/submissions/{id}/progress"), None).await).await;
    assert_eq!(progress["currentStage"], "complete");

    let response = send(&app, "POST", &verify_uri, None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_verify_is_eligible_and_registered() {
    let app = test_app();
    let id = create(&app, tower_json()).await;

    let response = send(&app, "POST", &format!("/v1/submissions/{id}/verify"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let outcome = body_json(response).await;
    assert_eq!(outcome["eligible"], true);
    assert_eq!(outcome["status"], "eligible");
    assert!(outcome["consensus"]["confidence"].as_f64().unwrap() >= 60.0);
    let asset_id = outcome["assetId"].as_str().unwrap().to_string();

    let entry = body_json(send(&app, "GET", &format!("/v1/registry/{asset_id}"), None).await).await;
    assert_eq!(entry["totalTokens"], 50_000);
    assert_eq!(entry["availableTokens"], 50_000);
    assert_eq!(entry["submissionId"], id.as_str());
}

#[tokio::test]
async fn test_second_verify_is_409_and_changes_nothing() {
    let app = test_app();
    let id = create(&app, tower_json()).await;
    let uri = format!("/v1/submissions/{id}/verify");
    assert_eq!(send(&app, "POST", &uri, None).await.status(), StatusCode::OK);

    let before = body_json(send(&app, "GET", &format!("/v1/submissions/{id}/progress"), None).await).await;
    let response = send(&app, "POST", &uri, None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "ALREADY_PROCESSED");
    let after = body_json(send(&app, "GET", &format!("/v1/submissions/{id}/progress"), None).await).await;
    assert_eq!(before, after);

    let registry = body_json(send(&app, "GET", "/v1/registry", None).await).await;
    assert_eq!(registry["count"], 1);
}

#[tokio::test]
async fn test_progress_before_and_after_verify() {
    let app = test_app();
    let id = create(&app, tower_json()).await;
    let progress_uri = format!("/v1/submissions/{id}/progress");

    let pending = body_json(send(&app, "GET", &progress_uri, None).await).await;
    assert_eq!(pending["currentStage"], "pending");
    assert_eq!(pending["logs"], json!([]));

    send(&app, "POST", &format!("/v1/submissions/{id}/verify"), None).await;
    let done = body_json(send(&app, "GET", &progress_uri, None).await).await;
    assert_eq!(done["currentStage"], "complete");
    assert_eq!(done["stages"].as_array().unwrap().len(), 3);
    assert!(!done["logs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_stage_results_404_until_executed() {
    let app = test_app();
    let id = create(&app, tower_json()).await;
    for stage in ["oracle", "market", "fraud", "consensus", "full"] {
        let response = send(&app, "GET", &format!("/v1/submissions/{id}/results/{stage}"), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{stage}");
    }

    send(&app, "POST", &format!("/v1/submissions/{id}/verify"), None).await;

    let oracle = body_json(send(&app, "GET", &format!("/v1/submissions/{id}/results/oracle"), None).await).await;
    assert_eq!(oracle["stage"], "oracle");
    assert_eq!(oracle["outcome"]["kind"], "oracle");

    let consensus =
        body_json(send(&app, "GET", &format!("/v1/submissions/{id}/results/consensus"), None).await).await;
    assert_eq!(consensus["eligible"], true);
    assert_eq!(consensus["factors"].as_array().unwrap().len(), 3);

    let full = body_json(send(&app, "GET", &format!("/v1/submissions/{id}/results/full"), None).await).await;
    assert_eq!(full["submission"]["status"], "eligible");
    assert_eq!(full["run"]["stageResults"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_unknown_stage_name_is_400() {
    let app = test_app();
    let id = create(&app, tower_json()).await;
    let response = send(&app, "GET", &format!("/v1/submissions/{id}/results/title"), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

// -- Registry & Claims --------------------------------------------------------

async fn registered_asset(app: &axum::Router) -> String {
    let id = create(app, tower_json()).await;
    let outcome = body_json(send(app, "POST", &format!("/v1/submissions/{id}/verify"), None).await).await;
    outcome["assetId"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_claim_reduces_supply() {
    let app = test_app();
    let asset_id = registered_asset(&app).await;
    let response = send(
        &app,
        "POST",
        &format!("/v1/registry/{asset_id}/claim"),
        Some(json!({"claimantId": "investor-1", "tokensToAcquire": 10_000})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["availableTokens"], 40_000);
    assert_eq!(body["claim"]["availableAfter"], 40_000);
    assert_eq!(body["claim"]["tokensAcquired"], 10_000);
    assert_eq!(body["claim"]["percentageExposure"], 20.0);
}

#[tokio::test]
async fn test_claim_beyond_supply_is_409() {
    let app = test_app();
    let asset_id = registered_asset(&app).await;
    let response = send(
        &app,
        "POST",
        &format!("/v1/registry/{asset_id}/claim"),
        Some(json!({"claimantId": "whale", "tokensToAcquire": 50_001})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["error"]["code"], "INSUFFICIENT_SUPPLY");

    let entry = body_json(send(&app, "GET", &format!("/v1/registry/{asset_id}"), None).await).await;
    assert_eq!(entry["availableTokens"], 50_000);
}

#[tokio::test]
async fn test_claim_unknown_asset_is_invalid_asset() {
    let response = send(
        &test_app(),
        "POST",
        &format!("/v1/registry/{}/claim", uuid::Uuid::new_v4()),
        Some(json!({"claimantId": "investor-1", "tokensToAcquire": 1})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["error"]["code"], "INVALID_ASSET");
}

#[tokio::test]
async fn test_claim_zero_tokens_is_422() {
    let app = test_app();
    let asset_id = registered_asset(&app).await;
    let response = send(
        &app,
        "POST",
        &format!("/v1/registry/{asset_id}/claim"),
        Some(json!({"claimantId": "investor-1", "tokensToAcquire": 0})),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_claims_never_oversell() {
    let app = test_app();
    let asset_id = registered_asset(&app).await;
    let uri = format!("/v1/registry/{asset_id}/claim");

    let mut handles = Vec::new();
    for i in 0..24 {
        let app = app.clone();
        let uri = uri.clone();
        handles.push(tokio::spawn(async move {
            send(
                &app,
                "POST",
                &uri,
                Some(json!({"claimantId": format!("investor-{i}"), "tokensToAcquire": 2_500})),
            )
            .await
        }));
    }
    let mut balances = Vec::new();
    for handle in handles {
        let response = handle.await.unwrap();
        if response.status() == StatusCode::CREATED {
            let body = body_json(response).await;
            assert_eq!(body["availableTokens"], body["claim"]["availableAfter"]);
            balances.push(body["availableTokens"].as_u64().unwrap());
        }
    }
    assert_eq!(balances.len(), 20);
    // Each accepted claim saw its own post-allocation balance.
    balances.sort_unstable();
    let expected: Vec<u64> = (0..20).map(|n| n * 2_500).collect();
    assert_eq!(balances, expected);

    let entry = body_json(send(&app, "GET", &uri.replace("/claim", ""), None).await).await;
    assert_eq!(entry["availableTokens"], 0);
    assert_eq!(entry["claimedTokens"], 50_000);
    assert_eq!(entry["claims"].as_array().unwrap().len(), 20);
}

// -- OpenAPI & Metrics --------------------------------------------------------

#[tokio::test]
async fn test_openapi_lists_routes() {
    let response = send(&test_app(), "GET", "/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let spec = body_json(response).await;
    let paths = spec["paths"].as_object().unwrap();
    assert!(paths.contains_key("/v1/submissions"));
    assert!(paths.contains_key("/v1/submissions/{id}/results/{stage}"));
    assert!(paths.contains_key("/v1/registry/{asset_id}/claim"));
}

#[tokio::test]
async fn test_metrics_without_recorder_is_503() {
    let response = send(&test_app(), "GET", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
