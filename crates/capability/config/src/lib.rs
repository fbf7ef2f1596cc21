//! 应用运行配置加载。

use std::env;

/// 配置加载错误。
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required env: {0}")]
    Missing(String),
    #[error("invalid value for {0}: {1}")]
    Invalid(String, String),
}

/// 应用运行配置。
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub http_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub role_load_timeout_ms: u64,
    pub role_switch_timeout_ms: u64,
    pub telemetry_enabled: bool,
    pub telemetry_delivery_timeout_ms: u64,
    pub empty_view_threshold_seconds: u64,
}

impl AppConfig {
    /// 从环境变量读取配置。
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = read_required("SHIMMS_DATABASE_URL")?;
        let jwt_secret = read_required("SHIMMS_JWT_SECRET")?;
        let http_addr =
            env::var("SHIMMS_HTTP_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
        let role_load_timeout_ms = read_positive_u64_with_default("SHIMMS_ROLE_LOAD_TIMEOUT_MS", 5000)?;
        let role_switch_timeout_ms =
            read_positive_u64_with_default("SHIMMS_ROLE_SWITCH_TIMEOUT_MS", 5000)?;
        let telemetry_enabled = read_bool_with_default("SHIMMS_TELEMETRY_ENABLED", true);
        let telemetry_delivery_timeout_ms =
            read_positive_u64_with_default("SHIMMS_TELEMETRY_DELIVERY_TIMEOUT_MS", 3000)?;
        let empty_view_threshold_seconds =
            read_positive_u64_with_default("SHIMMS_EMPTY_VIEW_THRESHOLD_SECONDS", 10)?;

        Ok(Self {
            http_addr,
            database_url,
            jwt_secret,
            role_load_timeout_ms,
            role_switch_timeout_ms,
            telemetry_enabled,
            telemetry_delivery_timeout_ms,
            empty_view_threshold_seconds,
        })
    }
}

fn read_required(key: &str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(key.to_string())),
    }
}

/// 超时与阈值不允许为 0。
fn read_positive_u64_with_default(key: &str, default: u64) -> Result<u64, ConfigError> {
    let value = match env::var(key) {
        Ok(value) => value,
        Err(_) => return Ok(default),
    };
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(ConfigError::Invalid(key.to_string(), value)),
    }
}

fn read_bool_with_default(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "on"),
        Err(_) => default,
    }
}
