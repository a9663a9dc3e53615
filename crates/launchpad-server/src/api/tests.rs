use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, Response};
use launchpad_core::baseline_template;
use launchpad_pipeline::{fallback_angles, Pipeline, ViewRevision};
use tower::ServiceExt;
use uuid::Uuid;

use super::*;

fn app_with_limit(max_sessions: usize) -> Router {
    let pipeline = Arc::new(Pipeline::fallback_only(ViewRevision::new()));
    build_app(AppState::new(
        baseline_template(),
        pipeline,
        Duration::from_millis(400),
        Arc::new(SessionStore::new(max_sessions, Duration::from_secs(1800))),
    ))
}

fn test_app() -> Router {
    app_with_limit(16)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string())),
        None => builder.body(Body::empty()),
    }
    .expect("request");
    app.clone().oneshot(request).await.expect("response")
}

async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    serde_json::from_slice(&body).expect("json parse")
}

async fn create_session(app: &Router) -> String {
    let response = send(app, Method::POST, "/api/v1/sessions", None).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = json_body(response).await;
    json["data"]["id"].as_str().expect("session id").to_string()
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn api_error_not_found_maps_to_404() {
    let response = ApiError::new("req-1", "not_found", "missing").into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[test]
fn stage_failure_maps_to_internal_error() {
    let error = PipelineError::StageFailed {
        stage: "simulation",
        reason: "task panicked".into(),
    };
    let api_error = map_pipeline_error("req-1".into(), &error);
    assert_eq!(api_error.error.code, "internal_error");
    assert_eq!(
        api_error.into_response().status(),
        StatusCode::INTERNAL_SERVER_ERROR
    );
}

#[tokio::test]
async fn health_reports_fallback_mode() {
    let app = test_app();
    let response = send(&app, Method::GET, "/api/v1/health", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "ok");
    assert_eq!(json["data"]["backend"], "fallback");
    assert_eq!(json["data"]["sessions"], 0);
}

#[tokio::test]
async fn request_id_header_is_echoed() {
    let app = test_app();
    let request = Request::builder()
        .uri("/api/v1/health")
        .header("x-request-id", "req-abc")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");

    assert_eq!(
        response.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-abc")
    );
    let json = json_body(response).await;
    assert_eq!(json["meta"]["request_id"], "req-abc");
}

#[tokio::test]
async fn template_returns_baseline() {
    let app = test_app();
    let response = send(&app, Method::GET, "/api/v1/template", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let baseline = baseline_template();
    assert_eq!(json["data"]["hook"], baseline.hook.as_str());
    assert_eq!(
        json["data"]["steps"].as_array().map(Vec::len),
        Some(baseline.steps.len())
    );
}

#[tokio::test]
async fn channels_lists_catalog() {
    let app = test_app();
    let response = send(&app, Method::GET, "/api/v1/channels", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    let channels = json["data"].as_array().expect("data array");
    assert_eq!(channels.len(), 6);
    assert_eq!(channels[0]["channel"], "instagram");
    assert!(channels[0]["bestPractices"].is_array());
}

#[tokio::test]
async fn create_session_runs_initial_recalibration() {
    let app = test_app();
    let response = send(&app, Method::POST, "/api/v1/sessions", None).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers().contains_key(VIEW_REVISION_HEADER));
    let json = json_body(response).await;
    let data = &json["data"];
    assert!(data["id"].is_string());
    assert_eq!(data["phase"], "idle");
    assert_eq!(data["angles"].as_array().map(Vec::len), Some(3));
    assert_eq!(data["selectedAngle"]["hook"], fallback_angles()[0].hook.as_str());
    assert!(data["template"]["steps"][0]["confidence"].is_number());
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let app = test_app();
    for uri in [
        "/api/v1/sessions/not-a-uuid".to_string(),
        format!("/api/v1/sessions/{}", Uuid::new_v4()),
    ] {
        let response = send(&app, Method::GET, &uri, None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "not_found");
    }
}

#[tokio::test]
async fn session_can_be_read_and_deleted() {
    let app = test_app();
    let id = create_session(&app).await;
    let uri = format!("/api/v1/sessions/{id}");

    let response = send(&app, Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["id"], id.as_str());

    let response = send(&app, Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["data"]["deleted"], true);

    let response = send(&app, Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_inputs_schedules_recalibration() {
    let app = test_app();
    let id = create_session(&app).await;

    let response = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/sessions/{id}/inputs"),
        Some(serde_json::json!({ "persona": "Busy chef", "targetChannels": ["tiktok"] })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["template"]["persona"], "Busy chef");
    assert_eq!(
        json["data"]["template"]["targetChannels"],
        serde_json::json!(["tiktok"])
    );
    assert_eq!(json["data"]["phase"], "pendingDebounce");
}

#[tokio::test]
async fn empty_patch_is_rejected() {
    let app = test_app();
    let id = create_session(&app).await;

    let response = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/sessions/{id}/inputs"),
        Some(serde_json::json!({})),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "validation_error");
}

#[tokio::test]
async fn selecting_angle_redrafts_steps() {
    let app = test_app();
    let id = create_session(&app).await;
    let hook = fallback_angles()[2].hook.clone();

    let response = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{id}/angle"),
        Some(serde_json::json!({ "hook": hook })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["selectedAngle"]["hook"], hook.as_str());
    let description = json["data"]["template"]["steps"][0]["description"]
        .as_str()
        .expect("description");
    assert!(description.contains(&fallback_angles()[2].pattern));
}

#[tokio::test]
async fn selecting_unknown_angle_is_bad_request() {
    let app = test_app();
    let id = create_session(&app).await;

    let response = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{id}/angle"),
        Some(serde_json::json!({ "hook": "nope" })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"]["code"], "validation_error");
}

#[tokio::test]
async fn simulate_returns_projection() {
    let app = test_app();
    let id = create_session(&app).await;

    let response = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{id}/simulate"),
        None,
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["data"]["performanceScore"], 73);
    assert_eq!(
        json["data"]["channelBreakdown"].as_array().map(Vec::len),
        Some(baseline_template().target_channels.len())
    );
}

#[tokio::test]
async fn autopost_returns_receipt_and_bumps_revision() {
    let app = test_app();
    let id = create_session(&app).await;

    let response = send(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{id}/autopost"),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let json = json_body(response).await;
    assert_eq!(json["data"]["status"], "queued");
    assert_eq!(
        json["data"]["queueCount"],
        baseline_template().target_channels.len()
    );

    let response = send(&app, Method::GET, &format!("/api/v1/sessions/{id}"), None).await;
    assert_eq!(
        response
            .headers()
            .get(VIEW_REVISION_HEADER)
            .and_then(|v| v.to_str().ok()),
        Some("1")
    );
}

#[tokio::test]
async fn session_limit_returns_429_until_a_slot_frees() {
    let app = app_with_limit(1);
    let id = create_session(&app).await;

    let response = send(&app, Method::POST, "/api/v1/sessions", None).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(json_body(response).await["error"]["code"], "too_many_sessions");

    let response = send(&app, Method::DELETE, &format!("/api/v1/sessions/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    create_session(&app).await;
}
