use axum::{extract::State, Extension, Json};
use launchpad_core::{ChannelInfo, WorkflowTemplate, CATALOG};

use crate::middleware::RequestId;

use super::{ApiResponse, AppState, ResponseMeta};

/// GET /api/v1/template — the immutable baseline every session starts from.
pub(super) async fn get_template(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<WorkflowTemplate>> {
    Json(ApiResponse {
        data: WorkflowTemplate::clone(&state.baseline),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// GET /api/v1/channels
pub(super) async fn list_channels(
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<&'static [ChannelInfo]>> {
    Json(ApiResponse {
        data: &CATALOG,
        meta: ResponseMeta::new(req_id.0),
    })
}
