//! 会话能力：身份解析、角色存储、角色切换与会话生命周期。

mod jwt;
mod role_store;
mod session;
mod switcher;

use domain::Identity;

pub use jwt::JwtIdentityVerifier;
pub use role_store::{ActiveRoleChange, RoleReload, RoleStore};
pub use session::{Session, SessionConfig, SessionDeps};
pub use switcher::{RoleSwitcher, SwitchOutcome, SwitchRejection, SwitchState};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token missing")]
    TokenMissing,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
}

/// 身份解析 trait，便于替换实现与测试。
pub trait IdentityVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

impl IdentityVerifier for JwtIdentityVerifier {
    fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        self.decode_identity(token)
    }
}
