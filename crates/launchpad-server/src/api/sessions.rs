//! Studio session handlers: one recalibration controller per session.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use launchpad_core::{AutopostReceipt, SimulationOutput, WorkflowTemplate};
use launchpad_pipeline::{InputPatch, RecalibrationController, SessionSnapshot};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta, VIEW_REVISION_HEADER};

#[derive(Debug, Deserialize)]
pub(super) struct SelectAngleRequest {
    pub hook: String,
}

#[derive(Debug, Serialize)]
pub(super) struct SessionData {
    pub id: Uuid,
    #[serde(flatten)]
    pub state: SessionSnapshot,
}

async fn resolve_session(
    state: &AppState,
    id: &str,
    request_id: &str,
) -> Result<(Uuid, Arc<RecalibrationController>), ApiError> {
    let not_found = || ApiError::new(request_id, "not_found", format!("session {id} not found"));
    let id = Uuid::parse_str(id).map_err(|_| not_found())?;
    let controller = state.sessions.get(&id).await.ok_or_else(not_found)?;
    Ok((id, controller))
}

fn session_response(
    state: &AppState,
    id: Uuid,
    controller: &RecalibrationController,
    request_id: String,
) -> impl IntoResponse {
    let revision = state.pipeline.revision().current();
    (
        [(VIEW_REVISION_HEADER, revision.to_string())],
        Json(ApiResponse {
            data: SessionData {
                id,
                state: controller.snapshot(),
            },
            meta: ResponseMeta::new(request_id),
        }),
    )
}

fn too_many_sessions(request_id: String) -> ApiError {
    ApiError::new(
        request_id,
        "too_many_sessions",
        "session limit reached; delete a session or retry later",
    )
}

/// POST /api/v1/sessions — start a session and run the first recalibration.
pub(super) async fn create_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.sessions.has_capacity().await {
        return Err(too_many_sessions(req_id.0));
    }

    let id = Uuid::new_v4();
    let controller = RecalibrationController::new(
        WorkflowTemplate::clone(&state.baseline),
        Arc::clone(&state.pipeline),
        state.debounce,
    );
    controller.refresh().await;
    if state
        .sessions
        .insert(id, Arc::clone(&controller))
        .await
        .is_err()
    {
        controller.shutdown();
        return Err(too_many_sessions(req_id.0));
    }
    tracing::info!(session_id = %id, "session created");

    Ok((
        StatusCode::CREATED,
        session_response(&state, id, &controller, req_id.0),
    ))
}

/// GET /api/v1/sessions/:id
pub(super) async fn get_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let (id, controller) = resolve_session(&state, &id, &req_id.0).await?;
    Ok(session_response(&state, id, &controller, req_id.0))
}

/// DELETE /api/v1/sessions/:id
pub(super) async fn delete_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let (id, _) = resolve_session(&state, &id, &req_id.0).await?;
    state.sessions.remove(&id).await;
    tracing::info!(session_id = %id, "session deleted");

    Ok(Json(ApiResponse {
        data: serde_json::json!({ "deleted": true }),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PATCH /api/v1/sessions/:id/inputs — sparse update; recalibration runs
/// after the debounce delay.
pub(super) async fn update_inputs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<InputPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let (id, controller) = resolve_session(&state, &id, &req_id.0).await?;
    if body.is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "provide at least one of persona, hook, contentFormat, targetChannels",
        ));
    }

    controller.update_inputs(body);
    Ok(session_response(&state, id, &controller, req_id.0))
}

/// POST /api/v1/sessions/:id/angle — select an angle and redraft now.
pub(super) async fn select_angle(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<SelectAngleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (id, controller) = resolve_session(&state, &id, &req_id.0).await?;
    controller
        .select_angle(&body.hook)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;
    Ok(session_response(&state, id, &controller, req_id.0))
}

/// POST /api/v1/sessions/:id/simulate
pub(super) async fn simulate(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SimulationOutput>>, ApiError> {
    let (_, controller) = resolve_session(&state, &id, &req_id.0).await?;
    let output = controller
        .simulate()
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: output,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/sessions/:id/autopost
pub(super) async fn autopost(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<ApiResponse<AutopostReceipt>>), ApiError> {
    let (_, controller) = resolve_session(&state, &id, &req_id.0).await?;
    let receipt = controller
        .autopost()
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: receipt,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
