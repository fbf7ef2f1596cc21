//! 内存实现模块
//!
//! 仅用于本地演示和测试。
//!
//! 包含以下实现：
//! - RoleGrantStore: InMemoryRoleGrantStore
//! - RoleSwitchValidator: InMemoryRoleSwitchValidator
//! - TelemetrySink: InMemoryTelemetrySink

pub mod role_grant;
pub mod role_switch;
pub mod telemetry_sink;

pub use role_grant::*;
pub use role_switch::*;
pub use telemetry_sink::*;
