//! 能力（Capability）定义与权限判定。
//!
//! 能力到角色的映射在编译期固定，不支持按租户动态授权。
//! 判定规则：
//! - superadmin：全部能力
//! - admin：除平台级（superadmin 专属）以外的全部能力
//! - coach：通用能力 + 教练能力
//! - client：通用能力 + 自助能力
//! - 空角色集合：仅通用能力

use crate::role::{Role, RoleSet};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 能力所属范围，每个能力恰好属于一个范围。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityScope {
    Universal,
    SelfService,
    Coaching,
    Administration,
    Platform,
}

/// 平台能力（封闭集合）。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    EditOwnProfile,
    ChatWithAiCoach,
    ViewOwnNotifications,
    TakePillarAssessment,
    ViewOwnProgress,
    ViewOwnGamification,
    MessageOwnCoach,
    RequestGdprExport,
    ViewAssignedClients,
    ViewClientAssessments,
    MessageClients,
    ManageClientTasks,
    ViewCoachDashboard,
    ManageUsers,
    ManageSettings,
    ViewAnalytics,
    AssignCoaches,
    ResetClientPillars,
    ManageInvitations,
    ProcessGdprRequests,
    ManageAdmins,
    ManageRoles,
    DeleteUserPermanently,
    ViewSystemDiagnostics,
}

impl Capability {
    pub const ALL: [Capability; 24] = [
        Capability::EditOwnProfile,
        Capability::ChatWithAiCoach,
        Capability::ViewOwnNotifications,
        Capability::TakePillarAssessment,
        Capability::ViewOwnProgress,
        Capability::ViewOwnGamification,
        Capability::MessageOwnCoach,
        Capability::RequestGdprExport,
        Capability::ViewAssignedClients,
        Capability::ViewClientAssessments,
        Capability::MessageClients,
        Capability::ManageClientTasks,
        Capability::ViewCoachDashboard,
        Capability::ManageUsers,
        Capability::ManageSettings,
        Capability::ViewAnalytics,
        Capability::AssignCoaches,
        Capability::ResetClientPillars,
        Capability::ManageInvitations,
        Capability::ProcessGdprRequests,
        Capability::ManageAdmins,
        Capability::ManageRoles,
        Capability::DeleteUserPermanently,
        Capability::ViewSystemDiagnostics,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::EditOwnProfile => "edit_own_profile",
            Capability::ChatWithAiCoach => "chat_with_ai_coach",
            Capability::ViewOwnNotifications => "view_own_notifications",
            Capability::TakePillarAssessment => "take_pillar_assessment",
            Capability::ViewOwnProgress => "view_own_progress",
            Capability::ViewOwnGamification => "view_own_gamification",
            Capability::MessageOwnCoach => "message_own_coach",
            Capability::RequestGdprExport => "request_gdpr_export",
            Capability::ViewAssignedClients => "view_assigned_clients",
            Capability::ViewClientAssessments => "view_client_assessments",
            Capability::MessageClients => "message_clients",
            Capability::ManageClientTasks => "manage_client_tasks",
            Capability::ViewCoachDashboard => "view_coach_dashboard",
            Capability::ManageUsers => "manage_users",
            Capability::ManageSettings => "manage_settings",
            Capability::ViewAnalytics => "view_analytics",
            Capability::AssignCoaches => "assign_coaches",
            Capability::ResetClientPillars => "reset_client_pillars",
            Capability::ManageInvitations => "manage_invitations",
            Capability::ProcessGdprRequests => "process_gdpr_requests",
            Capability::ManageAdmins => "manage_admins",
            Capability::ManageRoles => "manage_roles",
            Capability::DeleteUserPermanently => "delete_user_permanently",
            Capability::ViewSystemDiagnostics => "view_system_diagnostics",
        }
    }

    pub fn scope(&self) -> CapabilityScope {
        match self {
            Capability::EditOwnProfile
            | Capability::ChatWithAiCoach
            | Capability::ViewOwnNotifications => CapabilityScope::Universal,
            Capability::TakePillarAssessment
            | Capability::ViewOwnProgress
            | Capability::ViewOwnGamification
            | Capability::MessageOwnCoach
            | Capability::RequestGdprExport => CapabilityScope::SelfService,
            Capability::ViewAssignedClients
            | Capability::ViewClientAssessments
            | Capability::MessageClients
            | Capability::ManageClientTasks
            | Capability::ViewCoachDashboard => CapabilityScope::Coaching,
            Capability::ManageUsers
            | Capability::ManageSettings
            | Capability::ViewAnalytics
            | Capability::AssignCoaches
            | Capability::ResetClientPillars
            | Capability::ManageInvitations
            | Capability::ProcessGdprRequests => CapabilityScope::Administration,
            Capability::ManageAdmins
            | Capability::ManageRoles
            | Capability::DeleteUserPermanently
            | Capability::ViewSystemDiagnostics => CapabilityScope::Platform,
        }
    }

    /// 无需任何角色即可使用的能力。
    pub fn is_universal(&self) -> bool {
        self.scope() == CapabilityScope::Universal
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 未知能力名。
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability: {0}")]
pub struct CapabilityParseError(pub String);

impl FromStr for Capability {
    type Err = CapabilityParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Capability::ALL
            .iter()
            .copied()
            .find(|capability| capability.as_str() == value)
            .ok_or_else(|| CapabilityParseError(value.to_string()))
    }
}

/// 单个角色是否覆盖某个能力范围。
fn role_grants(role: Role, scope: CapabilityScope) -> bool {
    match role {
        Role::Superadmin => true,
        Role::Admin => scope != CapabilityScope::Platform,
        Role::Coach => matches!(scope, CapabilityScope::Universal | CapabilityScope::Coaching),
        Role::Client => matches!(
            scope,
            CapabilityScope::Universal | CapabilityScope::SelfService
        ),
    }
}

/// 判定角色集合是否拥有能力。纯函数，无隐藏状态。
pub fn can(capability: Capability, roles: &RoleSet) -> bool {
    let scope = capability.scope();
    if scope == CapabilityScope::Universal {
        return true;
    }
    roles.iter().any(|role| role_grants(role, scope))
}

/// 按能力名判定；未知能力名一律拒绝。
pub fn can_named(name: &str, roles: &RoleSet) -> bool {
    match name.parse::<Capability>() {
        Ok(capability) => can(capability, roles),
        Err(_) => false,
    }
}

/// 授予该能力的角色集合（唯一）。
pub fn granting_roles(capability: Capability) -> RoleSet {
    let scope = capability.scope();
    Role::ALL
        .into_iter()
        .filter(|role| role_grants(*role, scope))
        .collect()
}
