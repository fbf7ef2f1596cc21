//! 角色授权内存实现
//!
//! 功能：
//! - 按身份维护角色名列表（保持写入顺序）
//! - 支持运行中授予/撤销，模拟后端在会话期间变更授权
//! - 支持注入失败，模拟后端不可用

use crate::error::StorageError;
use crate::traits::RoleGrantStore;
use crate::validation::ensure_identity;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 角色授权内存存储
pub struct InMemoryRoleGrantStore {
    grants: RwLock<HashMap<String, Vec<String>>>,
    failing: AtomicBool,
    calls: AtomicUsize,
}

impl InMemoryRoleGrantStore {
    pub fn new() -> Self {
        Self {
            grants: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
        }
    }

    /// 创建包含一个身份授权的存储
    pub fn with_grants(identity_id: &str, roles: &[&str]) -> Self {
        let store = Self::new();
        for role in roles {
            store.grant(identity_id, role);
        }
        store
    }

    /// 授予角色（重复授予忽略）
    pub fn grant(&self, identity_id: &str, role: &str) {
        if let Ok(mut grants) = self.grants.write() {
            let roles = grants.entry(identity_id.to_string()).or_default();
            if !roles.iter().any(|existing| existing == role) {
                roles.push(role.to_string());
            }
        }
    }

    /// 撤销角色
    pub fn revoke(&self, identity_id: &str, role: &str) {
        if let Ok(mut grants) = self.grants.write() {
            if let Some(roles) = grants.get_mut(identity_id) {
                roles.retain(|existing| existing != role);
            }
        }
    }

    /// 是否拥有角色（供校验实现使用）
    pub fn holds(&self, identity_id: &str, role: &str) -> bool {
        self.grants
            .read()
            .ok()
            .and_then(|grants| {
                grants
                    .get(identity_id)
                    .map(|roles| roles.iter().any(|existing| existing == role))
            })
            .unwrap_or(false)
    }

    /// 注入失败：之后的查询返回错误
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// 查询次数（用于测试）
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryRoleGrantStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RoleGrantStore for InMemoryRoleGrantStore {
    async fn list_roles(&self, identity_id: &str) -> Result<Vec<String>, StorageError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ensure_identity(identity_id)?;
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::new("role grants unavailable"));
        }
        let grants = self
            .grants
            .read()
            .map_err(|_| StorageError::new("lock failed"))?;
        Ok(grants.get(identity_id).cloned().unwrap_or_default())
    }
}
