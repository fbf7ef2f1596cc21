pub mod event;
pub mod notice;
pub mod permissions;
pub mod role;
pub mod telemetry;

pub use event::{Event, EventKind, EventKindParseError};
pub use notice::UserNotice;
pub use permissions::{Capability, CapabilityParseError, CapabilityScope};
pub use role::{Role, RoleParseError, RoleSet, RoleSnapshot};
pub use telemetry::{TelemetryKind, TelemetryRecord};

use std::time::{SystemTime, UNIX_EPOCH};

/// 外部身份提供方签发的主体，本层只引用不拥有。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: String,
    pub email: Option<String>,
}

impl Identity {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

/// 会话上下文：登录时创建、登出时销毁，显式传递而非全局单例。
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub identity: Identity,
    pub roles: RoleSnapshot,
    pub active_role: Option<Role>,
}

impl SessionContext {
    /// 新会话：角色加载中，尚无激活角色。
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            roles: RoleSnapshot::Loading,
            active_role: None,
        }
    }

    /// 角色未加载或无法确定时一律返回 false。
    pub fn has_role(&self, role: Role) -> bool {
        self.roles
            .known()
            .map(|roles| roles.contains(role))
            .unwrap_or(false)
    }

    /// 当前生效的角色集合：仅包含激活角色。
    pub fn effective_roles(&self) -> RoleSet {
        match (self.roles.known(), self.active_role) {
            (Some(granted), Some(active)) if granted.contains(active) => RoleSet::from([active]),
            _ => RoleSet::new(),
        }
    }

    /// 角色未确定前连通用能力也拒绝。
    pub fn can(&self, capability: Capability) -> bool {
        self.roles.is_known() && permissions::can(capability, &self.effective_roles())
    }

    pub fn can_named(&self, name: &str) -> bool {
        self.roles.is_known() && permissions::can_named(name, &self.effective_roles())
    }
}

/// 当前时间戳（毫秒）。
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_millis() as i64)
        .unwrap_or_default()
}
