//! # SHIMMS Storage 模块
//!
//! 本模块定义会话层访问托管后端的边界，并提供多种实现。
//!
//! ## 架构设计
//!
//! 1. **接口抽象层** (`traits.rs`)：角色授权查询、角色切换校验、诊断记录投递
//! 2. **错误处理层** (`error.rs`)：统一的存储错误类型
//! 3. **验证辅助层** (`validation.rs`)：身份 ID 校验
//! 4. **连接管理层** (`connection.rs`)：数据库连接池管理
//! 5. **实现层**：
//!    - `in_memory/`：内存实现（用于测试和演示，可注入失败与延迟）
//!    - `postgres/`：PostgreSQL 实现（生产环境使用）
//!
//! ## 边界约束
//!
//! - 本层不实现认证、行级安全或查询引擎，只调用托管后端
//! - 授权只读：角色的授予与撤销在后端完成
//! - 诊断投递为单次尝试，失败由调用方吞掉
//!
//! ## 使用示例
//!
//! ```rust,ignore
//! use shimms_storage::{InMemoryRoleGrantStore, RoleGrantStore};
//!
//! let grants = InMemoryRoleGrantStore::with_grants("user-1", &["coach", "admin"]);
//! let roles = grants.list_roles("user-1").await?;
//! ```

pub mod connection;
pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod traits;
pub mod validation;

pub use connection::*;
pub use error::*;
pub use traits::*;
pub use validation::*;

pub use in_memory::{InMemoryRoleGrantStore, InMemoryRoleSwitchValidator, InMemoryTelemetrySink};

pub use postgres::{PgRoleGrantStore, PgRoleSwitchValidator, PgTelemetrySink};
