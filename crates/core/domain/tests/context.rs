use domain::{Capability, Identity, Role, RoleSet, RoleSnapshot, SessionContext};

fn known(roles: RoleSet, active: Option<Role>) -> SessionContext {
    let mut ctx = SessionContext::new(Identity::new("user-1", Some("anna@example.se".to_string())));
    ctx.roles = RoleSnapshot::Known(roles);
    ctx.active_role = active;
    ctx
}

#[test]
fn new_session_context_is_loading() {
    let ctx = SessionContext::new(Identity::new("user-1", None));

    assert_eq!(ctx.roles, RoleSnapshot::Loading);
    assert!(ctx.active_role.is_none());
    assert!(!ctx.has_role(Role::Client));
}

#[test]
fn loading_and_unknown_deny_even_universal_capabilities() {
    let mut ctx = SessionContext::new(Identity::new("user-1", None));
    assert!(!ctx.can(Capability::EditOwnProfile));

    ctx.roles = RoleSnapshot::Unknown;
    assert!(!ctx.can(Capability::EditOwnProfile));
    assert!(!ctx.has_role(Role::Client));
}

#[test]
fn known_empty_roles_allow_only_universal() {
    let ctx = known(RoleSet::new(), None);

    assert!(ctx.can(Capability::EditOwnProfile));
    assert!(ctx.can(Capability::ChatWithAiCoach));
    assert!(!ctx.can(Capability::TakePillarAssessment));
}

#[test]
fn effective_roles_follow_active_role() {
    let ctx = known(RoleSet::from([Role::Admin, Role::Coach]), Some(Role::Coach));

    assert!(ctx.has_role(Role::Admin));
    assert_eq!(ctx.effective_roles(), RoleSet::from([Role::Coach]));
    assert!(ctx.can(Capability::ViewAssignedClients));
    assert!(!ctx.can(Capability::ManageSettings));
    assert!(!ctx.can_named("manage_settings"));
}

#[test]
fn active_role_outside_grants_is_ignored() {
    let ctx = known(RoleSet::from([Role::Client]), Some(Role::Admin));

    assert!(ctx.effective_roles().is_empty());
    assert!(!ctx.can(Capability::ManageUsers));
}
