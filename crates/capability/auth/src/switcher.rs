//! 激活角色切换。
//!
//! 切换前由后端确认身份当前同时拥有 from 与 to 两个角色，防止本地缓存过期后的越权。
//! 同一会话同一时刻只允许一个校验在途，后到的请求直接拒绝。

use crate::role_store::{ActiveRoleChange, RoleStore};
use domain::{EventKind, Role, UserNotice};
use serde_json::json;
use shimms_events::EventBus;
use shimms_storage::RoleSwitchValidator;
use shimms_telemetry::{record_role_switch_rejected, record_role_switch_succeeded};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// 切换状态机。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchState {
    Idle,
    Validating,
    Switched,
    Rejected,
}

impl SwitchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwitchState::Idle => "idle",
            SwitchState::Validating => "validating",
            SwitchState::Switched => "switched",
            SwitchState::Rejected => "rejected",
        }
    }
}

/// 成功的切换结果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchOutcome {
    /// 目标即当前激活角色，未调用后端。
    Unchanged(Role),
    Switched { from: Role, to: Role },
}

impl SwitchOutcome {
    pub fn active_role(&self) -> Role {
        match self {
            SwitchOutcome::Unchanged(role) => *role,
            SwitchOutcome::Switched { to, .. } => *to,
        }
    }
}

/// 切换被拒绝的原因；均不致命，激活角色保持不变。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SwitchRejection {
    #[error("another role switch is in flight")]
    InFlight,
    #[error("roles are not available")]
    RolesUnavailable,
    #[error("role {0} is not granted")]
    NotGranted(Role),
    #[error("backend denied switch from {from} to {to}")]
    Denied { from: Role, to: Role },
    #[error("role switch validation failed: {0}")]
    Backend(String),
    #[error("role switch validation timed out")]
    Timeout,
    #[error("active role changed during validation")]
    Superseded,
    /// 后端否认后刷新授权，激活角色被重置为 `active`（已广播 roleChanged）。
    #[error("roles changed while switching from {from}")]
    RolesChanged { from: Role, active: Option<Role> },
}

impl SwitchRejection {
    pub fn code(&self) -> &'static str {
        match self {
            SwitchRejection::InFlight => "role_switch_in_progress",
            SwitchRejection::RolesUnavailable => "roles_unavailable",
            SwitchRejection::NotGranted(_) => "role_not_granted",
            SwitchRejection::Denied { .. } => "role_switch_denied",
            SwitchRejection::Backend(_) => "role_switch_failed",
            SwitchRejection::Timeout => "role_switch_timeout",
            SwitchRejection::Superseded => "role_switch_superseded",
            SwitchRejection::RolesChanged { .. } => "roles_changed",
        }
    }

    /// 面向用户的提示。
    pub fn notice(&self) -> UserNotice {
        let message = match self {
            SwitchRejection::InFlight => {
                "Ett rollbyte pågår redan. Vänta ett ögonblick och försök igen."
            }
            SwitchRejection::RolesUnavailable => {
                "Dina roller kunde inte hämtas just nu. Försök igen om en stund."
            }
            SwitchRejection::NotGranted(_) => "Du har inte behörighet att byta till den rollen.",
            SwitchRejection::Denied { .. } => {
                "Rollbytet kunde inte bekräftas. Dina behörigheter kan ha ändrats."
            }
            SwitchRejection::Backend(_) => "Rollbytet misslyckades. Försök igen senare.",
            SwitchRejection::Timeout => "Rollbytet tog för lång tid. Försök igen.",
            SwitchRejection::Superseded => "Din roll uppdaterades under bytet. Försök igen.",
            SwitchRejection::RolesChanged { .. } => {
                "Dina behörigheter har ändrats och din aktiva roll har uppdaterats."
            }
        };
        UserNotice::new(self.code(), message)
    }
}

pub struct RoleSwitcher {
    store: Arc<RoleStore>,
    validator: Arc<dyn RoleSwitchValidator>,
    bus: EventBus,
    timeout: Duration,
    gate: tokio::sync::Mutex<()>,
    state: Mutex<SwitchState>,
}

impl RoleSwitcher {
    pub fn new(
        store: Arc<RoleStore>,
        validator: Arc<dyn RoleSwitchValidator>,
        bus: EventBus,
        timeout: Duration,
    ) -> Self {
        Self {
            store,
            validator,
            bus,
            timeout,
            gate: tokio::sync::Mutex::new(()),
            state: Mutex::new(SwitchState::Idle),
        }
    }

    pub fn state(&self) -> SwitchState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub async fn switch_to(&self, role: Role) -> Result<SwitchOutcome, SwitchRejection> {
        if self.store.active_role() == Some(role) {
            return Ok(SwitchOutcome::Unchanged(role));
        }
        let Ok(_gate) = self.gate.try_lock() else {
            return Err(self.reject_without_transition(role, SwitchRejection::InFlight));
        };

        let context = self.store.context();
        if context.active_role == Some(role) {
            return Ok(SwitchOutcome::Unchanged(role));
        }
        let identity_id = context.identity.id.clone();
        let Some(granted) = context.roles.known() else {
            return Err(self.reject(&identity_id, role, SwitchRejection::RolesUnavailable));
        };
        if !granted.contains(role) {
            return Err(self.reject(&identity_id, role, SwitchRejection::NotGranted(role)));
        }
        let Some(from) = context.active_role else {
            return Err(self.reject(&identity_id, role, SwitchRejection::RolesUnavailable));
        };

        self.set_state(SwitchState::Validating);
        let verdict = tokio::time::timeout(
            self.timeout,
            self.validator.validate_role_switch(&identity_id, from, role),
        )
        .await;
        match verdict {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => return self.reconcile_denied(&identity_id, from, role).await,
            Ok(Err(err)) => {
                return Err(self.reject(&identity_id, role, SwitchRejection::Backend(err.to_string())));
            }
            Err(_) => return Err(self.reject(&identity_id, role, SwitchRejection::Timeout)),
        }

        if !self.store.commit_active(from, role) {
            return Err(self.reject(&identity_id, role, SwitchRejection::Superseded));
        }
        Ok(self.switched(&identity_id, from, role))
    }

    fn switched(&self, identity_id: &str, from: Role, to: Role) -> SwitchOutcome {
        self.set_state(SwitchState::Switched);
        record_role_switch_succeeded();
        info!(
            target: "shimms.roles",
            identity_id = %identity_id,
            from = from.as_str(),
            to = to.as_str(),
            "role_switched"
        );
        announce_active_change(
            &self.bus,
            identity_id,
            ActiveRoleChange {
                from: Some(from),
                to: Some(to),
            },
        );
        SwitchOutcome::Switched { from, to }
    }

    /// 后端否认：刷新授权缓存。刷新改变了激活角色时先广播，再按结果如实返回。
    async fn reconcile_denied(
        &self,
        identity_id: &str,
        from: Role,
        role: Role,
    ) -> Result<SwitchOutcome, SwitchRejection> {
        let reloaded = self.store.reload().await;
        let Some(change) = reloaded.active_change else {
            return Err(self.reject(identity_id, role, SwitchRejection::Denied { from, to: role }));
        };
        if change.to == Some(role) {
            return Ok(self.switched(identity_id, from, role));
        }
        announce_active_change(&self.bus, identity_id, change);
        Err(self.reject(
            identity_id,
            role,
            SwitchRejection::RolesChanged {
                from,
                active: change.to,
            },
        ))
    }

    fn reject(&self, identity_id: &str, role: Role, rejection: SwitchRejection) -> SwitchRejection {
        self.set_state(SwitchState::Rejected);
        record_role_switch_rejected();
        warn!(
            target: "shimms.roles",
            identity_id = %identity_id,
            to = role.as_str(),
            reason = rejection.code(),
            error = %rejection,
            "role_switch_rejected"
        );
        rejection
    }

    /// 在途切换不受影响，状态保持 Validating。
    fn reject_without_transition(&self, role: Role, rejection: SwitchRejection) -> SwitchRejection {
        record_role_switch_rejected();
        warn!(
            target: "shimms.roles",
            to = role.as_str(),
            reason = rejection.code(),
            "role_switch_rejected"
        );
        rejection
    }

    fn set_state(&self, next: SwitchState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = next;
    }
}

/// 广播激活角色变化；订阅 `userDataChanged` 的视图随之刷新。
pub(crate) fn announce_active_change(bus: &EventBus, identity_id: &str, change: ActiveRoleChange) {
    bus.publish(
        EventKind::RoleChanged,
        Some(json!({
            "identityId": identity_id,
            "from": change.from.map(|role| role.as_str()),
            "to": change.to.map(|role| role.as_str()),
        })),
    );
}
