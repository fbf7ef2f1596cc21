//! 追踪、请求 ID、进程指标与空视图/404 诊断上报。

mod view;

use std::sync::OnceLock;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing_subscriber::{EnvFilter, fmt};

pub use view::{ViewTelemetry, ViewTelemetryConfig};

/// 请求级追踪标识。
#[derive(Debug, Clone)]
pub struct RequestIds {
    pub request_id: String,
    pub trace_id: String,
}

/// 指标快照。
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
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

/// 进程级计数器。
pub struct TelemetryMetrics {
    roles_loaded: AtomicU64,
    roles_unknown: AtomicU64,
    role_switch_succeeded: AtomicU64,
    role_switch_rejected: AtomicU64,
    events_published: AtomicU64,
    listener_failures: AtomicU64,
    telemetry_reported: AtomicU64,
    telemetry_deduplicated: AtomicU64,
    telemetry_delivery_failures: AtomicU64,
}

impl TelemetryMetrics {
    pub fn new() -> Self {
        Self {
            roles_loaded: AtomicU64::new(0),
            roles_unknown: AtomicU64::new(0),
            role_switch_succeeded: AtomicU64::new(0),
            role_switch_rejected: AtomicU64::new(0),
            events_published: AtomicU64::new(0),
            listener_failures: AtomicU64::new(0),
            telemetry_reported: AtomicU64::new(0),
            telemetry_deduplicated: AtomicU64::new(0),
            telemetry_delivery_failures: AtomicU64::new(0),
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            roles_loaded: self.roles_loaded.load(Ordering::Relaxed),
            roles_unknown: self.roles_unknown.load(Ordering::Relaxed),
            role_switch_succeeded: self.role_switch_succeeded.load(Ordering::Relaxed),
            role_switch_rejected: self.role_switch_rejected.load(Ordering::Relaxed),
            events_published: self.events_published.load(Ordering::Relaxed),
            listener_failures: self.listener_failures.load(Ordering::Relaxed),
            telemetry_reported: self.telemetry_reported.load(Ordering::Relaxed),
            telemetry_deduplicated: self.telemetry_deduplicated.load(Ordering::Relaxed),
            telemetry_delivery_failures: self
                .telemetry_delivery_failures
                .load(Ordering::Relaxed),
        }
    }
}

impl Default for TelemetryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

static METRICS: OnceLock<TelemetryMetrics> = OnceLock::new();

/// 获取全局指标实例。
pub fn metrics() -> &'static TelemetryMetrics {
    METRICS.get_or_init(TelemetryMetrics::new)
}

/// 初始化 tracing（默认 info）。
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

/// 生成新的 request_id 与 trace_id。
pub fn new_request_ids() -> RequestIds {
    RequestIds {
        request_id: uuid::Uuid::new_v4().to_string(),
        trace_id: uuid::Uuid::new_v4().to_string(),
    }
}

/// 记录角色加载成功次数。
pub fn record_roles_loaded() {
    metrics().roles_loaded.fetch_add(1, Ordering::Relaxed);
}

/// 记录角色加载失败/超时（结果为 unknown）次数。
pub fn record_roles_unknown() {
    metrics().roles_unknown.fetch_add(1, Ordering::Relaxed);
}

/// 记录角色切换成功次数。
pub fn record_role_switch_succeeded() {
    metrics()
        .role_switch_succeeded
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录角色切换被拒绝次数。
pub fn record_role_switch_rejected() {
    metrics()
        .role_switch_rejected
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录事件发布次数（通用事件的二次广播单独计数）。
pub fn record_event_published() {
    metrics().events_published.fetch_add(1, Ordering::Relaxed);
}

/// 记录订阅者回调失败次数。
pub fn record_listener_failure() {
    metrics().listener_failures.fetch_add(1, Ordering::Relaxed);
}

/// 记录诊断记录投递成功次数。
pub fn record_telemetry_reported() {
    metrics().telemetry_reported.fetch_add(1, Ordering::Relaxed);
}

/// 记录因去重而跳过的诊断记录次数。
pub fn record_telemetry_deduplicated() {
    metrics()
        .telemetry_deduplicated
        .fetch_add(1, Ordering::Relaxed);
}

/// 记录诊断记录投递失败次数（含超时）。
pub fn record_telemetry_delivery_failure() {
    metrics()
        .telemetry_delivery_failures
        .fetch_add(1, Ordering::Relaxed);
}
