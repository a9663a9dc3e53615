mod catalog;
mod sessions;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use launchpad_core::WorkflowTemplate;
use launchpad_pipeline::{Pipeline, PipelineError};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use crate::middleware::{request_id, RequestId};
use crate::store::SessionStore;

pub(crate) const VIEW_REVISION_HEADER: &str = "x-view-revision";

#[derive(Clone)]
pub struct AppState {
    pub baseline: Arc<WorkflowTemplate>,
    pub pipeline: Arc<Pipeline>,
    pub debounce: Duration,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    #[must_use]
    pub fn new(
        baseline: WorkflowTemplate,
        pipeline: Arc<Pipeline>,
        debounce: Duration,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            baseline: Arc::new(baseline),
            pipeline,
            debounce,
            sessions,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    backend: String,
    sessions: usize,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "too_many_sessions" => StatusCode::TOO_MANY_REQUESTS,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::Validation(message) => {
            ApiError::new(request_id, "validation_error", message.clone())
        }
        PipelineError::StageFailed { .. } => {
            tracing::error!(error = %error, "pipeline stage failed");
            ApiError::new(request_id, "internal_error", "pipeline stage failed")
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            header::CONTENT_TYPE,
            HeaderName::from_static("x-request-id"),
        ])
        .expose_headers([HeaderName::from_static(VIEW_REVISION_HEADER)])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/template", get(catalog::get_template))
        .route("/api/v1/channels", get(catalog::list_channels))
        .route("/api/v1/sessions", post(sessions::create_session))
        .route(
            "/api/v1/sessions/{id}",
            get(sessions::get_session).delete(sessions::delete_session),
        )
        .route(
            "/api/v1/sessions/{id}/inputs",
            patch(sessions::update_inputs),
        )
        .route("/api/v1/sessions/{id}/angle", post(sessions::select_angle))
        .route("/api/v1/sessions/{id}/simulate", post(sessions::simulate))
        .route("/api/v1/sessions/{id}/autopost", post(sessions::autopost))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let backend = state
        .pipeline
        .backend_name()
        .unwrap_or("fallback")
        .to_string();
    let sessions = state.sessions.len().await;
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            backend,
            sessions,
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
