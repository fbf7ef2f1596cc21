//! 会话生命周期：登录时创建上下文与各组件，登出时统一拆除。

use crate::role_store::RoleStore;
use crate::switcher::{RoleSwitcher, SwitchOutcome, SwitchRejection, announce_active_change};
use domain::{Capability, Identity, Role, RoleSnapshot, SessionContext};
use serde_json::{Map, Value};
use shimms_events::EventBus;
use shimms_storage::{RoleGrantStore, RoleSwitchValidator, TelemetrySink};
use shimms_telemetry::{ViewTelemetry, ViewTelemetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// 会话依赖的外部边界。
#[derive(Clone)]
pub struct SessionDeps {
    pub grants: Arc<dyn RoleGrantStore>,
    pub validator: Arc<dyn RoleSwitchValidator>,
    pub telemetry_sink: Arc<dyn TelemetrySink>,
}

/// 会话参数。
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub role_load_timeout: Duration,
    pub role_switch_timeout: Duration,
    pub telemetry: ViewTelemetryConfig,
    /// 未指定阈值时的空视图判定时长。
    pub empty_view_threshold: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            role_load_timeout: Duration::from_secs(5),
            role_switch_timeout: Duration::from_secs(5),
            telemetry: ViewTelemetryConfig::default(),
            empty_view_threshold: Duration::from_secs(10),
        }
    }
}

pub struct Session {
    store: Arc<RoleStore>,
    switcher: RoleSwitcher,
    bus: EventBus,
    telemetry: ViewTelemetry,
    config: SessionConfig,
}

impl Session {
    /// 创建会话并等待首次角色加载（成功或 unknown）。
    pub async fn start(identity: Identity, deps: SessionDeps, config: SessionConfig) -> Self {
        let identity_id = identity.id.clone();
        let store = Arc::new(RoleStore::new(
            identity,
            deps.grants,
            config.role_load_timeout,
        ));
        let bus = EventBus::new();
        let switcher = RoleSwitcher::new(
            store.clone(),
            deps.validator,
            bus.clone(),
            config.role_switch_timeout,
        );
        let mut base_metadata = Map::new();
        base_metadata.insert("identityId".to_string(), Value::from(identity_id.clone()));
        let telemetry = ViewTelemetry::new(
            deps.telemetry_sink,
            config.telemetry.clone(),
            base_metadata,
        );

        let roles = store.load().await;
        info!(
            target: "shimms.session",
            identity_id = %identity_id,
            roles = roles.status(),
            active_role = store.active_role().map(|role| role.as_str()),
            "session_started"
        );
        Self {
            store,
            switcher,
            bus,
            telemetry,
            config,
        }
    }

    pub fn role_store(&self) -> &RoleStore {
        &self.store
    }

    pub fn switcher(&self) -> &RoleSwitcher {
        &self.switcher
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn telemetry(&self) -> &ViewTelemetry {
        &self.telemetry
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn context(&self) -> SessionContext {
        self.store.context()
    }

    pub fn can(&self, capability: Capability) -> bool {
        self.store.can(capability)
    }

    /// 切换激活角色；后端否认时由切换器刷新本地授权缓存。
    pub async fn switch_role(&self, role: Role) -> Result<SwitchOutcome, SwitchRejection> {
        self.switcher.switch_to(role).await
    }

    /// 重新加载授权；激活角色因此改变时发布 roleChanged。
    pub async fn refresh_roles(&self) -> RoleSnapshot {
        let reloaded = self.store.reload().await;
        if let Some(change) = reloaded.active_change {
            announce_active_change(&self.bus, &self.store.identity().id, change);
        }
        reloaded.roles
    }

    /// 登出：取消待触发的诊断检查并清空订阅。
    pub async fn end(&self) {
        let identity_id = self.store.identity().id;
        self.telemetry.shutdown().await;
        self.bus.clear();
        info!(target: "shimms.session", identity_id = %identity_id, "session_ended");
    }
}
