//! 诊断记录内存 sink
//!
//! 记录所有投递成功的记录，支持注入失败。

use crate::error::StorageError;
use crate::traits::TelemetrySink;
use domain::TelemetryRecord;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 诊断记录内存 sink
pub struct InMemoryTelemetrySink {
    records: RwLock<Vec<TelemetryRecord>>,
    failing: AtomicBool,
    attempts: AtomicUsize,
}

impl InMemoryTelemetrySink {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            failing: AtomicBool::new(false),
            attempts: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 已接收记录（用于测试）
    pub fn records(&self) -> Vec<TelemetryRecord> {
        self.records.read().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.records.read().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 投递尝试次数，包含失败的尝试
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryTelemetrySink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TelemetrySink for InMemoryTelemetrySink {
    async fn deliver(&self, record: &TelemetryRecord) -> Result<(), StorageError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::new("telemetry sink unavailable"));
        }
        let mut records = self
            .records
            .write()
            .map_err(|_| StorageError::new("lock failed"))?;
        records.push(record.clone());
        Ok(())
    }
}
