//! 空视图 / 404 诊断上报。
//!
//! - 空视图：视图在阈值时长后仍 `!has_data && !is_loading` 才上报（防抖，状态变化即取消）
//! - 404：挂载即上报
//! - 同一 `(kind, path)` 在会话内最多上报一次
//! - 投递单次尝试，失败只记日志，不影响调用方
//!
//! 所有操作需在 tokio 运行时上下文中调用。

use crate::{
    record_telemetry_deduplicated, record_telemetry_delivery_failure, record_telemetry_reported,
};
use domain::telemetry::dedupe_key;
use domain::{TelemetryKind, TelemetryRecord};
use serde_json::{Map, Value};
use shimms_storage::TelemetrySink;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, info, warn};

/// 诊断上报参数。
#[derive(Debug, Clone)]
pub struct ViewTelemetryConfig {
    pub enabled: bool,
    pub delivery_timeout: Duration,
}

impl Default for ViewTelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            delivery_timeout: Duration::from_secs(3),
        }
    }
}

struct PendingCheck {
    generation: u64,
    abort: AbortHandle,
}

struct Inner {
    sink: Arc<dyn TelemetrySink>,
    config: ViewTelemetryConfig,
    base_metadata: Map<String, Value>,
    reported: Mutex<HashSet<String>>,
    pending: Mutex<HashMap<String, PendingCheck>>,
    deliveries: Mutex<Vec<JoinHandle<()>>>,
    generation: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Inner {
    /// 占用去重键；已上报过返回 false。
    fn claim(&self, kind: TelemetryKind, path: &str) -> bool {
        let key = dedupe_key(kind, path);
        let fresh = lock(&self.reported).insert(key.clone());
        if !fresh {
            record_telemetry_deduplicated();
            debug!(target: "shimms.telemetry", dedupe_key = %key, "telemetry_deduplicated");
        }
        fresh
    }

    fn already_reported(&self, kind: TelemetryKind, path: &str) -> bool {
        lock(&self.reported).contains(&dedupe_key(kind, path))
    }

    fn build_record(
        &self,
        kind: TelemetryKind,
        path: &str,
        extra: Map<String, Value>,
    ) -> TelemetryRecord {
        let mut metadata = self.base_metadata.clone();
        metadata.extend(extra);
        TelemetryRecord::new(kind, path, Value::Object(metadata))
    }

    async fn deliver(&self, record: TelemetryRecord) {
        match tokio::time::timeout(self.config.delivery_timeout, self.sink.deliver(&record)).await {
            Ok(Ok(())) => {
                record_telemetry_reported();
                info!(
                    target: "shimms.telemetry",
                    kind = record.kind.as_str(),
                    path = %record.path,
                    "telemetry_reported"
                );
            }
            Ok(Err(err)) => {
                record_telemetry_delivery_failure();
                warn!(
                    target: "shimms.telemetry",
                    kind = record.kind.as_str(),
                    path = %record.path,
                    error = %err,
                    "telemetry_delivery_failed"
                );
            }
            Err(_) => {
                record_telemetry_delivery_failure();
                warn!(
                    target: "shimms.telemetry",
                    kind = record.kind.as_str(),
                    path = %record.path,
                    timeout_ms = self.config.delivery_timeout.as_millis() as u64,
                    "telemetry_delivery_timeout"
                );
            }
        }
    }

    fn spawn_delivery(inner: &Arc<Inner>, record: TelemetryRecord) {
        let task_inner = inner.clone();
        let handle = tokio::spawn(async move {
            task_inner.deliver(record).await;
        });
        let mut deliveries = lock(&inner.deliveries);
        deliveries.retain(|handle| !handle.is_finished());
        deliveries.push(handle);
    }

    fn cancel_pending(&self, path: &str) -> bool {
        match lock(&self.pending).remove(path) {
            Some(check) => {
                check.abort.abort();
                true
            }
            None => false,
        }
    }

    /// 仅当仍是同一轮检查时移除。
    fn finish_pending(&self, path: &str, generation: u64) {
        let mut pending = lock(&self.pending);
        if pending
            .get(path)
            .map(|check| check.generation == generation)
            .unwrap_or(false)
        {
            pending.remove(path);
        }
    }
}

/// 会话级诊断上报器（克隆共享同一状态）。
#[derive(Clone)]
pub struct ViewTelemetry {
    inner: Arc<Inner>,
}

impl ViewTelemetry {
    /// `base_metadata` 附加到每条记录（例如 identity_id）。
    pub fn new(
        sink: Arc<dyn TelemetrySink>,
        config: ViewTelemetryConfig,
        base_metadata: Map<String, Value>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                sink,
                config,
                base_metadata,
                reported: Mutex::new(HashSet::new()),
                pending: Mutex::new(HashMap::new()),
                deliveries: Mutex::new(Vec::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// 视图状态变化时调用。
    ///
    /// 每次调用都会取消该路径上待触发的检查；若当前为空且未加载，
    /// 重新布置一次 `threshold` 后的上报。
    pub fn report_if_empty_past_threshold(
        &self,
        has_data: bool,
        is_loading: bool,
        threshold: Duration,
        path: &str,
    ) {
        if !self.inner.config.enabled {
            return;
        }
        // 持锁完成取消与登记，计时任务的 finish_pending 必然排在登记之后。
        let mut pending = lock(&self.inner.pending);
        if let Some(previous) = pending.remove(path) {
            previous.abort.abort();
        }
        if has_data || is_loading {
            return;
        }
        if self.inner.already_reported(TelemetryKind::ViewEmpty, path) {
            return;
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let inner = self.inner.clone();
        let owned_path = path.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(threshold).await;
            inner.finish_pending(&owned_path, generation);
            if !inner.claim(TelemetryKind::ViewEmpty, &owned_path) {
                return;
            }
            let mut extra = Map::new();
            extra.insert(
                "thresholdSeconds".to_string(),
                Value::from(threshold.as_secs()),
            );
            let record = inner.build_record(TelemetryKind::ViewEmpty, &owned_path, extra);
            Inner::spawn_delivery(&inner, record);
        });
        pending.insert(
            path.to_string(),
            PendingCheck {
                generation,
                abort: timer.abort_handle(),
            },
        );
    }

    /// 视图卸载：取消待触发的空视图检查。
    pub fn clear_view(&self, path: &str) {
        if self.inner.cancel_pending(path) {
            debug!(target: "shimms.telemetry", path = %path, "view_check_cancelled");
        }
    }

    /// 404 视图挂载时立即上报。
    pub fn report_not_found(&self, path: &str) {
        if !self.inner.config.enabled {
            return;
        }
        if !self.inner.claim(TelemetryKind::NotFound, path) {
            return;
        }
        let record = self
            .inner
            .build_record(TelemetryKind::NotFound, path, Map::new());
        Inner::spawn_delivery(&self.inner, record);
    }

    /// 当前待触发的空视图检查数量。
    pub fn pending_checks(&self) -> usize {
        lock(&self.inner.pending).len()
    }

    /// 等待已发出的投递完成（不取消待触发检查），最长等待一个投递超时。
    pub async fn flush(&self) {
        let running: Vec<JoinHandle<()>> = lock(&self.inner.deliveries).drain(..).collect();
        let wait = async {
            for handle in running {
                let _ = handle.await;
            }
        };
        if tokio::time::timeout(self.inner.config.delivery_timeout, wait)
            .await
            .is_err()
        {
            warn!(target: "shimms.telemetry", "telemetry_flush_timeout");
        }
    }

    /// 会话结束：取消所有待触发检查，等待在途投递（有上限）。
    pub async fn shutdown(&self) {
        let cancelled: Vec<PendingCheck> = lock(&self.inner.pending)
            .drain()
            .map(|(_, check)| check)
            .collect();
        for check in &cancelled {
            check.abort.abort();
        }
        self.flush().await;
        debug!(
            target: "shimms.telemetry",
            cancelled = cancelled.len(),
            "view_telemetry_shutdown"
        );
    }
}
