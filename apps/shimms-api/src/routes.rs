//! 路由定义
//!
//! - 健康检查与指标：/health, /metrics
//! - 会话：/session（登录建立、查询、登出）
//! - 能力检查：/session/capabilities/:capability
//! - 角色切换：/session/active-role
//! - 数据变更广播：/session/events
//! - 诊断上报：/telemetry/not-found, /telemetry/view-state

use super::AppState;
use super::handlers::*;
use axum::{
    Router,
    routing::{get, post},
};

/// 创建 API 路由
///
/// 返回包含所有 API 端点的 Router，由调用方同时挂载到 / 和 /api/
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(get_metrics))
        .route(
            "/session",
            post(start_session).get(get_session).delete(end_session),
        )
        .route("/session/capabilities/:capability", get(check_capability))
        .route("/session/active-role", post(switch_active_role))
        .route("/session/events", post(publish_event))
        .route("/telemetry/not-found", post(report_not_found))
        .route("/telemetry/view-state", post(report_view_state))
}
