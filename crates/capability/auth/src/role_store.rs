//! 角色存储：会话内角色授权的唯一持有者。
//!
//! - 登录后加载一次并缓存，不轮询
//! - 后端失败或超时得到 `Unknown`，与「确实没有角色」区分
//! - 加载完成前所有检查一律拒绝

use domain::{Capability, Identity, Role, RoleSet, RoleSnapshot, SessionContext};
use shimms_storage::RoleGrantStore;
use shimms_telemetry::{record_roles_loaded, record_roles_unknown};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 一次授权刷新引起的激活角色变化。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveRoleChange {
    pub from: Option<Role>,
    pub to: Option<Role>,
}

/// `reload` 的结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleReload {
    pub roles: RoleSnapshot,
    /// 激活角色未变时为 `None`。
    pub active_change: Option<ActiveRoleChange>,
}

pub struct RoleStore {
    grants: Arc<dyn RoleGrantStore>,
    load_timeout: Duration,
    context: RwLock<SessionContext>,
    // 串行化 load/reload，避免并发重复请求后端。
    load_gate: Mutex<()>,
}

impl RoleStore {
    pub fn new(identity: Identity, grants: Arc<dyn RoleGrantStore>, load_timeout: Duration) -> Self {
        Self {
            grants,
            load_timeout,
            context: RwLock::new(SessionContext::new(identity)),
            load_gate: Mutex::new(()),
        }
    }

    /// 加载角色；已为 `Known` 时直接返回缓存。
    pub async fn load(&self) -> RoleSnapshot {
        let _guard = self.load_gate.lock().await;
        let current = self.roles();
        if current.is_known() {
            return current;
        }
        self.fetch_and_apply().await.roles
    }

    /// 强制重新获取授权；激活角色已不再授予时回退到默认角色，并在结果中报告。
    pub async fn reload(&self) -> RoleReload {
        let _guard = self.load_gate.lock().await;
        self.fetch_and_apply().await
    }

    pub fn identity(&self) -> Identity {
        self.read().identity.clone()
    }

    pub fn roles(&self) -> RoleSnapshot {
        self.read().roles.clone()
    }

    pub fn active_role(&self) -> Option<Role> {
        self.read().active_role
    }

    /// 当前上下文的快照。
    pub fn context(&self) -> SessionContext {
        self.read().clone()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.read().has_role(role)
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.read().can(capability)
    }

    pub fn can_named(&self, name: &str) -> bool {
        self.read().can_named(name)
    }

    /// 比较并设置激活角色：仅当激活角色仍为 `expected` 且 `next` 仍被授予时生效。
    pub(crate) fn commit_active(&self, expected: Role, next: Role) -> bool {
        let mut context = self.write();
        if context.active_role != Some(expected) || !context.has_role(next) {
            return false;
        }
        context.active_role = Some(next);
        true
    }

    async fn fetch_and_apply(&self) -> RoleReload {
        let identity_id = self.read().identity.id.clone();
        let snapshot = self.fetch(&identity_id).await;

        let mut context = self.write();
        let mut active_change = None;
        if let RoleSnapshot::Known(granted) = &snapshot {
            let active = match context.active_role {
                Some(role) if granted.contains(role) => Some(role),
                _ => granted.highest(),
            };
            if context.active_role != active {
                info!(
                    target: "shimms.roles",
                    identity_id = %identity_id,
                    previous = context.active_role.map(|role| role.as_str()),
                    active = active.map(|role| role.as_str()),
                    "active_role_reset"
                );
                active_change = Some(ActiveRoleChange {
                    from: context.active_role,
                    to: active,
                });
            }
            context.active_role = active;
        }
        context.roles = snapshot.clone();
        RoleReload {
            roles: snapshot,
            active_change,
        }
    }

    async fn fetch(&self, identity_id: &str) -> RoleSnapshot {
        match tokio::time::timeout(self.load_timeout, self.grants.list_roles(identity_id)).await {
            Ok(Ok(names)) => {
                let roles = parse_roles(identity_id, &names);
                record_roles_loaded();
                info!(
                    target: "shimms.roles",
                    identity_id = %identity_id,
                    roles = ?roles.to_strings(),
                    "roles_loaded"
                );
                RoleSnapshot::Known(roles)
            }
            Ok(Err(err)) => {
                record_roles_unknown();
                warn!(
                    target: "shimms.roles",
                    identity_id = %identity_id,
                    error = %err,
                    "roles_load_failed"
                );
                RoleSnapshot::Unknown
            }
            Err(_) => {
                record_roles_unknown();
                warn!(
                    target: "shimms.roles",
                    identity_id = %identity_id,
                    timeout_ms = self.load_timeout.as_millis() as u64,
                    "roles_load_timeout"
                );
                RoleSnapshot::Unknown
            }
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, SessionContext> {
        self.context.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, SessionContext> {
        self.context.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// 解析后端返回的角色名，忽略不认识的值。
fn parse_roles(identity_id: &str, names: &[String]) -> RoleSet {
    let mut roles = RoleSet::new();
    for name in names {
        match name.parse::<Role>() {
            Ok(role) => {
                roles.insert(role);
            }
            Err(err) => {
                warn!(
                    target: "shimms.roles",
                    identity_id = %identity_id,
                    error = %err,
                    "role_ignored"
                );
            }
        }
    }
    roles
}

#[cfg(test)]
mod tests {
    use super::parse_roles;
    use domain::{Role, RoleSet};

    #[test]
    fn parse_roles_skips_unknown_and_duplicates() {
        let names = vec![
            "coach".to_string(),
            "owner".to_string(),
            " Admin ".to_string(),
            "coach".to_string(),
        ];
        assert_eq!(
            parse_roles("user-1", &names),
            RoleSet::from([Role::Admin, Role::Coach])
        );
    }
}
