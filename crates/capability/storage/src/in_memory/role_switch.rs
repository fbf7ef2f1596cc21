//! 角色切换校验内存实现
//!
//! 基于 InMemoryRoleGrantStore 的当前授权判断，可配置响应延迟以模拟慢请求。

use crate::error::StorageError;
use crate::in_memory::InMemoryRoleGrantStore;
use crate::traits::RoleSwitchValidator;
use crate::validation::ensure_identity;
use domain::Role;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// 角色切换校验内存实现
pub struct InMemoryRoleSwitchValidator {
    grants: Arc<InMemoryRoleGrantStore>,
    delay: Option<Duration>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryRoleSwitchValidator {
    pub fn new(grants: Arc<InMemoryRoleGrantStore>) -> Self {
        Self {
            grants,
            delay: None,
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// 每次校验前等待的时长
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 校验调用次数（用于测试）
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl RoleSwitchValidator for InMemoryRoleSwitchValidator {
    async fn validate_role_switch(
        &self,
        identity_id: &str,
        from: Role,
        to: Role,
    ) -> Result<bool, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ensure_identity(identity_id)?;
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::new("role switch validation unavailable"));
        }
        Ok(self.grants.holds(identity_id, from.as_str()) && self.grants.holds(identity_id, to.as_str()))
    }
}
