//! 诊断上报接口
//!
//! - POST /telemetry/not-found：404 视图挂载
//! - POST /telemetry/view-state：视图状态变化（空视图防抖检查）
//!
//! 上报是尽力而为，成功响应只表示已受理。

use api_contract::{ApiResponse, NotFoundRequest, ViewStateRequest};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use std::time::Duration;

use crate::AppState;
use crate::middleware::require_session;
use crate::utils::response::bad_request_error;

fn accepted() -> Response {
    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::success(serde_json::json!({ "accepted": true }))),
    )
        .into_response()
}

pub async fn report_not_found(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NotFoundRequest>,
) -> Response {
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    if req.path.trim().is_empty() {
        return bad_request_error("path required");
    }
    session.telemetry().report_not_found(&req.path);
    accepted()
}

pub async fn report_view_state(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<ViewStateRequest>,
) -> Response {
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    if req.path.trim().is_empty() {
        return bad_request_error("path required");
    }
    let threshold = req
        .threshold_seconds
        .map(Duration::from_secs)
        .unwrap_or(session.config().empty_view_threshold);
    session
        .telemetry()
        .report_if_empty_past_threshold(req.has_data, req.is_loading, threshold, &req.path);
    accepted()
}
