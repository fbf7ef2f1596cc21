//! 角色与角色集合。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// 平台角色（封闭集合）。
///
/// 声明顺序即权限高低：`Client < Coach < Admin < Superadmin`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    Coach,
    Admin,
    Superadmin,
}

impl Role {
    /// 所有角色，按权限从高到低。
    pub const ALL: [Role; 4] = [Role::Superadmin, Role::Admin, Role::Coach, Role::Client];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Superadmin => "superadmin",
            Role::Admin => "admin",
            Role::Coach => "coach",
            Role::Client => "client",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知角色名。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "superadmin" => Ok(Role::Superadmin),
            "admin" => Ok(Role::Admin),
            "coach" => Ok(Role::Coach),
            "client" => Ok(Role::Client),
            _ => Err(RoleParseError(value.to_string())),
        }
    }
}

/// 角色集合（有序、去重）。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet(BTreeSet<Role>);

impl RoleSet {
    pub fn new() -> Self {
        Self(BTreeSet::new())
    }

    pub fn insert(&mut self, role: Role) -> bool {
        self.0.insert(role)
    }

    pub fn contains(&self, role: Role) -> bool {
        self.0.contains(&role)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 权限最高的角色（默认激活角色）。
    pub fn highest(&self) -> Option<Role> {
        self.0.iter().next_back().copied()
    }

    /// 按权限从高到低迭代。
    pub fn iter(&self) -> impl Iterator<Item = Role> + '_ {
        self.0.iter().rev().copied()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.iter().map(|role| role.as_str().to_string()).collect()
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<const N: usize> From<[Role; N]> for RoleSet {
    fn from(roles: [Role; N]) -> Self {
        roles.into_iter().collect()
    }
}

/// 角色快照的三态：加载中 / 无法确定 / 已知。
///
/// `Unknown` 与 `Known(空集)` 必须区分：前者是后端失败，后者是真的没有角色。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSnapshot {
    Loading,
    Unknown,
    Known(RoleSet),
}

impl RoleSnapshot {
    /// 仅在已知时返回角色集合。
    pub fn known(&self) -> Option<&RoleSet> {
        match self {
            RoleSnapshot::Known(roles) => Some(roles),
            _ => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, RoleSnapshot::Known(_))
    }

    /// 对外展示的状态名。
    pub fn status(&self) -> &'static str {
        match self {
            RoleSnapshot::Loading => "loading",
            RoleSnapshot::Unknown => "unknown",
            RoleSnapshot::Known(_) => "known",
        }
    }
}
