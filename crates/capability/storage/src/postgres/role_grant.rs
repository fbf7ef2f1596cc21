//! Postgres 角色授权查询

use crate::error::StorageError;
use crate::traits::RoleGrantStore;
use crate::validation::ensure_identity;
use sqlx::PgPool;

pub struct PgRoleGrantStore {
    pub pool: PgPool,
}

impl PgRoleGrantStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 通过数据库 URL 建立连接池
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool = crate::connection::connect_pool(database_url).await?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl RoleGrantStore for PgRoleGrantStore {
    async fn list_roles(&self, identity_id: &str) -> Result<Vec<String>, StorageError> {
        ensure_identity(identity_id)?;
        let roles: Vec<String> = sqlx::query_scalar(
            "select role::text from user_roles where user_id::text = $1 order by role::text asc",
        )
        .bind(identity_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(roles)
    }
}
