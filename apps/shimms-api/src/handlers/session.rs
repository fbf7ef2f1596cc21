//! 会话接口
//!
//! - POST /session：校验托管方 token，建立会话并加载角色
//! - GET /session：当前会话快照
//! - DELETE /session：登出，结束会话
//! - GET /session/capabilities/:capability：能力检查（未知能力视为不允许）
//! - POST /session/active-role：切换激活角色（被拒绝时 409 + 提示）
//! - POST /session/events：广播数据变更事件

use api_contract::{
    ApiResponse, CapabilityDto, PublishEventRequest, PublishEventResponse, SwitchRoleRequest,
    SwitchRoleResponse,
};
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::{EventKind, Role};
use shimms_auth::{Session, SwitchOutcome};
use tracing::info;

use crate::AppState;
use crate::middleware::{require_identity, require_session};
use crate::utils::response::{
    bad_request_error, rejection_response, session_not_found_error, session_to_dto,
};

#[derive(Debug, serde::Deserialize)]
pub struct CapabilityPath {
    pub capability: String,
}

pub async fn start_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    let session = Session::start(
        identity,
        state.deps.clone(),
        state.session_config.clone(),
    )
    .await;
    let session = state.sessions.insert(session).await;
    let active_sessions = state.sessions.len().await;
    info!(
        target: "shimms.api",
        identity_id = %session.context().identity.id,
        active_sessions,
        "session_registered"
    );
    (
        StatusCode::OK,
        Json(ApiResponse::success(session_to_dto(&session))),
    )
        .into_response()
}

pub async fn get_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    (
        StatusCode::OK,
        Json(ApiResponse::success(session_to_dto(&session))),
    )
        .into_response()
}

pub async fn end_session(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let identity = match require_identity(&state, &headers) {
        Ok(identity) => identity,
        Err(response) => return response,
    };
    if !state.sessions.remove(&identity.id).await {
        return session_not_found_error();
    }
    (
        StatusCode::OK,
        Json(ApiResponse::success(serde_json::json!({ "ended": true }))),
    )
        .into_response()
}

pub async fn check_capability(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<CapabilityPath>,
) -> Response {
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let allowed = session.role_store().can_named(&path.capability);
    (
        StatusCode::OK,
        Json(ApiResponse::success(CapabilityDto {
            capability: path.capability,
            allowed,
        })),
    )
        .into_response()
}

pub async fn switch_active_role(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SwitchRoleRequest>,
) -> Response {
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let role = match req.role.parse::<Role>() {
        Ok(role) => role,
        Err(err) => return bad_request_error(err.to_string()),
    };
    match session.switch_role(role).await {
        Ok(outcome) => {
            let previous_role = match outcome {
                SwitchOutcome::Unchanged(_) => None,
                SwitchOutcome::Switched { from, .. } => Some(from.as_str().to_string()),
            };
            (
                StatusCode::OK,
                Json(ApiResponse::success(SwitchRoleResponse {
                    active_role: outcome.active_role().as_str().to_string(),
                    changed: previous_role.is_some(),
                    previous_role,
                })),
            )
                .into_response()
        }
        Err(rejection) => rejection_response(&rejection),
    }
}

pub async fn publish_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PublishEventRequest>,
) -> Response {
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    let kind = match req.event_type.parse::<EventKind>() {
        Ok(kind) => kind,
        Err(err) => return bad_request_error(err.to_string()),
    };
    let delivered = session.bus().publish(kind, req.detail);
    info!(
        target: "shimms.api",
        identity_id = %session.context().identity.id,
        kind = kind.as_str(),
        delivered,
        "event_announced"
    );
    (
        StatusCode::OK,
        Json(ApiResponse::success(PublishEventResponse {
            event_type: kind.as_str().to_string(),
            delivered,
        })),
    )
        .into_response()
}
