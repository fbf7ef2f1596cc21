//! 会话内数据变更事件。

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 事件类型（封闭集合）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EventKind {
    UserCreated,
    UserUpdated,
    UserDeleted,
    RoleChanged,
    GdprActionCompleted,
    /// 通用类型：每个具体事件都会再以该类型广播一次。
    UserDataChanged,
}

impl EventKind {
    pub const ALL: [EventKind; 6] = [
        EventKind::UserCreated,
        EventKind::UserUpdated,
        EventKind::UserDeleted,
        EventKind::RoleChanged,
        EventKind::GdprActionCompleted,
        EventKind::UserDataChanged,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::UserCreated => "userCreated",
            EventKind::UserUpdated => "userUpdated",
            EventKind::UserDeleted => "userDeleted",
            EventKind::RoleChanged => "roleChanged",
            EventKind::GdprActionCompleted => "gdprActionCompleted",
            EventKind::UserDataChanged => "userDataChanged",
        }
    }

    pub fn is_generic(&self) -> bool {
        *self == EventKind::UserDataChanged
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知事件类型名。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct EventKindParseError(pub String);

impl FromStr for EventKind {
    type Err = EventKindParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| EventKindParseError(value.to_string()))
    }
}

/// 一次发布的事件，仅在会话内同步传递，不持久化。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub kind: EventKind,
    pub detail: Option<serde_json::Value>,
    /// 通用事件的来源类型；具体事件为 None。
    pub origin: Option<EventKind>,
    pub timestamp_ms: i64,
}

impl Event {
    pub fn new(kind: EventKind, detail: Option<serde_json::Value>) -> Self {
        Self {
            kind,
            detail,
            origin: None,
            timestamp_ms: crate::now_epoch_ms(),
        }
    }

    /// 由具体事件派生的通用 `userDataChanged` 事件。
    pub fn generic_from(specific: &Event) -> Self {
        Self {
            kind: EventKind::UserDataChanged,
            detail: specific.detail.clone(),
            origin: Some(specific.kind),
            timestamp_ms: specific.timestamp_ms,
        }
    }
}
