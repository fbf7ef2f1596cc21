//! 空视图 / 404 诊断记录。

use serde::{Deserialize, Serialize};

/// 诊断记录类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelemetryKind {
    ViewEmpty,
    NotFound,
}

impl TelemetryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TelemetryKind::ViewEmpty => "view_empty",
            TelemetryKind::NotFound => "not_found",
        }
    }
}

/// 去重键：`<kind>:<path>`。
pub fn dedupe_key(kind: TelemetryKind, path: &str) -> String {
    format!("{}:{}", kind.as_str(), path)
}

/// 投递到遥测 sink 的记录。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryRecord {
    pub kind: TelemetryKind,
    pub path: String,
    pub dedupe_key: String,
    pub metadata: serde_json::Value,
    pub recorded_at_ms: i64,
}

impl TelemetryRecord {
    pub fn new(kind: TelemetryKind, path: impl Into<String>, metadata: serde_json::Value) -> Self {
        let path = path.into();
        Self {
            kind,
            dedupe_key: dedupe_key(kind, &path),
            path,
            metadata,
            recorded_at_ms: crate::now_epoch_ms(),
        }
    }
}
