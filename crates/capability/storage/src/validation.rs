//! 验证辅助函数
//!
//! - ensure_identity：验证身份 ID 非空
//!
//! 使用场景：所有边界查询前验证身份上下文，避免空 ID 落到后端查询。

use crate::error::StorageError;

/// 验证身份 ID 非空
pub fn ensure_identity(identity_id: &str) -> Result<(), StorageError> {
    if identity_id.trim().is_empty() {
        return Err(StorageError::new("identity_id required"));
    }
    Ok(())
}
