//! 外部边界 Trait 定义
//!
//! 定义本层访问托管后端的异步接口：
//! - RoleGrantStore：角色授权查询
//! - RoleSwitchValidator：角色切换校验 RPC
//! - TelemetrySink：诊断记录投递
//!
//! 设计原则：
//! - 所有接口显式接收身份 ID，不依赖全局会话
//! - 所有接口返回 StorageError
//! - 使用 async_trait 支持动态分发

use crate::error::StorageError;
use async_trait::async_trait;
use domain::{Role, TelemetryRecord};

/// 角色授权查询接口
///
/// 只读取当前快照；授权的创建/撤销由后端完成。
#[async_trait]
pub trait RoleGrantStore: Send + Sync {
    /// 列出身份当前拥有的角色名（原始字符串，由调用方解析）
    async fn list_roles(&self, identity_id: &str) -> Result<Vec<String>, StorageError>;
}

/// 角色切换校验接口
#[async_trait]
pub trait RoleSwitchValidator: Send + Sync {
    /// 身份当前是否同时拥有 from 与 to 两个角色
    async fn validate_role_switch(
        &self,
        identity_id: &str,
        from: Role,
        to: Role,
    ) -> Result<bool, StorageError>;
}

/// 诊断记录 sink
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// 投递一条记录（单次尝试，失败由调用方吞掉）
    async fn deliver(&self, record: &TelemetryRecord) -> Result<(), StorageError>;
}
