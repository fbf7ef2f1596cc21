//! 健康检查与进程指标快照。
//!
//! - GET /health
//! - GET /metrics（需要 view_system_diagnostics 能力）

use api_contract::{ApiResponse, MetricsSnapshotDto};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use domain::Capability;
use shimms_telemetry::metrics;

use crate::AppState;
use crate::middleware::require_session;
use crate::utils::response::forbidden_error;

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

pub async fn get_metrics(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = match require_session(&state, &headers).await {
        Ok(session) => session,
        Err(response) => return response,
    };
    if !session.can(Capability::ViewSystemDiagnostics) {
        return forbidden_error();
    }

    let snapshot = metrics().snapshot();
    (
        StatusCode::OK,
        Json(ApiResponse::success(MetricsSnapshotDto {
            roles_loaded: snapshot.roles_loaded,
            roles_unknown: snapshot.roles_unknown,
            role_switch_succeeded: snapshot.role_switch_succeeded,
            role_switch_rejected: snapshot.role_switch_rejected,
            events_published: snapshot.events_published,
            listener_failures: snapshot.listener_failures,
            telemetry_reported: snapshot.telemetry_reported,
            telemetry_deduplicated: snapshot.telemetry_deduplicated,
            telemetry_delivery_failures: snapshot.telemetry_delivery_failures,
        })),
    )
        .into_response()
}
