//! 稳定的 DTO 与 API 响应契约。

use serde::{Deserialize, Serialize};

/// 标准 API 响应封装。
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

/// 失败响应的错误体。
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ApiError {
                code: code.into(),
                message: message.into(),
            }),
        }
    }
}

/// 会话快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionDto {
    pub identity_id: String,
    pub email: Option<String>,
    /// `loading` / `unknown` / `known`
    pub role_status: String,
    /// 按权限从高到低。
    pub roles: Vec<String>,
    pub active_role: Option<String>,
    /// 当前激活角色下允许的能力（角色未确定时为空）。
    pub capabilities: Vec<String>,
    pub switch_state: String,
}

/// 单项能力检查结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CapabilityDto {
    pub capability: String,
    pub allowed: bool,
}

/// 切换激活角色请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRoleRequest {
    pub role: String,
}

/// 切换激活角色响应体。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchRoleResponse {
    pub active_role: String,
    pub changed: bool,
    pub previous_role: Option<String>,
}

/// 面向用户的提示（切换被拒绝时返回）。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoticeDto {
    pub code: String,
    pub message: String,
}

/// 发布数据变更事件请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishEventRequest {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

/// 发布结果。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishEventResponse {
    pub event_type: String,
    pub delivered: usize,
}

/// 404 视图上报请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotFoundRequest {
    pub path: String,
}

/// 视图状态上报请求体。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewStateRequest {
    pub path: String,
    pub has_data: bool,
    pub is_loading: bool,
    #[serde(default)]
    pub threshold_seconds: Option<u64>,
}

/// 进程指标快照。
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshotDto {
    pub roles_loaded: u64,
    pub roles_unknown: u64,
    pub role_switch_succeeded: u64,
    pub role_switch_rejected: u64,
    pub events_published: u64,
    pub listener_failures: u64,
    pub telemetry_reported: u64,
    pub telemetry_deduplicated: u64,
    pub telemetry_delivery_failures: u64,
}
