//! Postgres 角色切换校验
//!
//! 在后端重新读取授权，避免客户端缓存过期导致的越权切换。

use crate::error::StorageError;
use crate::traits::RoleSwitchValidator;
use crate::validation::ensure_identity;
use domain::Role;
use sqlx::PgPool;

pub struct PgRoleSwitchValidator {
    pub pool: PgPool,
}

impl PgRoleSwitchValidator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl RoleSwitchValidator for PgRoleSwitchValidator {
    async fn validate_role_switch(
        &self,
        identity_id: &str,
        from: Role,
        to: Role,
    ) -> Result<bool, StorageError> {
        ensure_identity(identity_id)?;
        let wanted = vec![from.as_str().to_string(), to.as_str().to_string()];
        let expected: i64 = if from == to { 1 } else { 2 };
        let held: i64 = sqlx::query_scalar(
            "select count(distinct role::text) from user_roles \
             where user_id::text = $1 and role::text = any($2)",
        )
        .bind(identity_id)
        .bind(&wanted)
        .fetch_one(&self.pool)
        .await?;
        Ok(held == expected)
    }
}
