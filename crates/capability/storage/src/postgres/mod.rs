//! # PostgreSQL 实现模块
//!
//! 直接访问托管后端的 Postgres（同一数据库，受后端行级安全约束）。
//!
//! ## 设计原则
//!
//! 1. **参数化查询**：所有 SQL 查询使用参数绑定，防止 SQL 注入攻击
//! 2. **只读授权**：本层只读取 `user_roles`，从不写入授权
//! 3. **连接池管理**：使用连接池复用数据库连接
//!
//! ## 包含的实现
//!
//! - **RoleGrantStore** (`role_grant.rs`)：读取身份当前角色
//! - **RoleSwitchValidator** (`role_switch.rs`)：校验身份同时拥有切换前后两个角色
//! - **TelemetrySink** (`telemetry_sink.rs`)：写入诊断事件
//!
//! ## 数据库模式要求
//!
//! - `user_roles`：用户角色关联表（user_id, role）
//! - `analytics_events`：诊断事件表（event_type, path, dedupe_key, metadata jsonb, created_at）

pub mod role_grant;
pub mod role_switch;
pub mod telemetry_sink;

pub use role_grant::*;
pub use role_switch::*;
pub use telemetry_sink::*;
