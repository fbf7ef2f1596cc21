//! HTTP 响应辅助函数和 DTO 转换
//!
//! - 错误响应：auth_error, forbidden_error, bad_request_error, session_not_found_error, rejection_response
//! - DTO 转换：session_to_dto
//!
//! 所有错误返回统一的 ApiResponse 格式。

use api_contract::{ApiError, ApiResponse, NoticeDto, SessionDto};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use domain::Capability;
use shimms_auth::{Session, SwitchRejection};

/// 认证错误响应
pub fn auth_error(status: StatusCode) -> Response {
    (
        status,
        Json(ApiResponse::<()>::error(
            "AUTH.UNAUTHORIZED",
            "unauthorized",
        )),
    )
        .into_response()
}

/// 禁止访问错误响应
pub fn forbidden_error() -> Response {
    (
        StatusCode::FORBIDDEN,
        Json(ApiResponse::<()>::error("AUTH.FORBIDDEN", "forbidden")),
    )
        .into_response()
}

/// 错误请求响应
pub fn bad_request_error(message: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::<()>::error("INVALID.REQUEST", message.into())),
    )
        .into_response()
}

/// 无活动会话
pub fn session_not_found_error() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::error(
            "SESSION.NOT_FOUND",
            "no active session",
        )),
    )
        .into_response()
}

/// 角色切换被拒绝：409 + 面向用户的提示
///
/// 响应体只携带提示文案；后端错误细节由切换器写入日志。
pub fn rejection_response(rejection: &SwitchRejection) -> Response {
    let notice = rejection.notice();
    let body = ApiResponse {
        success: false,
        data: Some(NoticeDto {
            code: notice.code.to_string(),
            message: notice.message.clone(),
        }),
        error: Some(ApiError {
            code: "SESSION.ROLE_SWITCH_REJECTED".to_string(),
            message: notice.message,
        }),
    };
    (StatusCode::CONFLICT, Json(body)).into_response()
}

/// Session 转 SessionDto
pub fn session_to_dto(session: &Session) -> SessionDto {
    let context = session.context();
    let roles = context
        .roles
        .known()
        .map(|roles| roles.to_strings())
        .unwrap_or_default();
    let capabilities = Capability::ALL
        .iter()
        .filter(|capability| context.can(**capability))
        .map(|capability| capability.as_str().to_string())
        .collect();
    SessionDto {
        identity_id: context.identity.id.clone(),
        email: context.identity.email.clone(),
        role_status: context.roles.status().to_string(),
        roles,
        active_role: context.active_role.map(|role| role.as_str().to_string()),
        capabilities,
        switch_state: session.switcher().state().as_str().to_string(),
    }
}
