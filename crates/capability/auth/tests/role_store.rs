use async_trait::async_trait;
use domain::{Capability, Identity, Role, RoleSet, RoleSnapshot};
use shimms_auth::{ActiveRoleChange, RoleStore};
use shimms_storage::{InMemoryRoleGrantStore, RoleGrantStore, StorageError};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(5);

fn store_for(grants: Arc<InMemoryRoleGrantStore>) -> RoleStore {
    RoleStore::new(Identity::new("user-1", None), grants, TIMEOUT)
}

#[tokio::test]
async fn checks_fail_closed_before_load() {
    let grants = Arc::new(InMemoryRoleGrantStore::with_grants("user-1", &["superadmin"]));
    let store = store_for(grants);

    assert_eq!(store.roles(), RoleSnapshot::Loading);
    assert!(!store.has_role(Role::Superadmin));
    assert!(!store.can(Capability::EditOwnProfile));
    assert!(!store.can(Capability::ManageRoles));
    assert_eq!(store.active_role(), None);
}

#[tokio::test]
async fn load_defaults_to_highest_role_and_caches() {
    let grants = Arc::new(InMemoryRoleGrantStore::with_grants("user-1", &["coach", "admin"]));
    let store = store_for(grants.clone());

    let snapshot = store.load().await;
    assert_eq!(snapshot, RoleSnapshot::Known(RoleSet::from([Role::Admin, Role::Coach])));
    assert_eq!(store.active_role(), Some(Role::Admin));
    assert!(store.has_role(Role::Coach));
    assert!(store.can(Capability::ManageSettings));

    grants.grant("user-1", "superadmin");
    store.load().await;
    assert_eq!(grants.calls(), 1);
    assert!(!store.has_role(Role::Superadmin));
}

#[tokio::test]
async fn backend_failure_yields_unknown_not_empty() {
    let grants = Arc::new(InMemoryRoleGrantStore::with_grants("user-1", &["coach"]));
    grants.set_failing(true);
    let store = store_for(grants.clone());

    assert_eq!(store.load().await, RoleSnapshot::Unknown);
    assert!(!store.can(Capability::EditOwnProfile));
    assert!(!store.has_role(Role::Coach));

    // unknown 不缓存：恢复后再次 load 会重新请求
    grants.set_failing(false);
    assert!(store.load().await.is_known());
    assert_eq!(grants.calls(), 3);
    assert_eq!(store.active_role(), Some(Role::Coach));
}

#[tokio::test]
async fn identity_without_roles_keeps_universal_capabilities() {
    let grants = Arc::new(InMemoryRoleGrantStore::new());
    let store = store_for(grants);

    assert_eq!(store.load().await, RoleSnapshot::Known(RoleSet::new()));
    assert_eq!(store.active_role(), None);
    assert!(store.can(Capability::EditOwnProfile));
    assert!(store.can(Capability::ChatWithAiCoach));
    assert!(!store.can(Capability::TakePillarAssessment));
    assert!(store.can_named("view_own_notifications"));
    assert!(!store.can_named("launch_rockets"));
}

#[tokio::test]
async fn unrecognised_role_names_are_ignored() {
    let grants = Arc::new(InMemoryRoleGrantStore::with_grants("user-1", &["owner", "client"]));
    let store = store_for(grants);

    assert_eq!(store.load().await, RoleSnapshot::Known(RoleSet::from([Role::Client])));
}

#[tokio::test]
async fn reload_falls_back_when_active_role_revoked() {
    let grants = Arc::new(InMemoryRoleGrantStore::with_grants("user-1", &["admin", "coach"]));
    let store = store_for(grants.clone());
    store.load().await;
    assert_eq!(store.active_role(), Some(Role::Admin));

    assert_eq!(store.reload().await.active_change, None);

    grants.revoke("user-1", "admin");
    let reloaded = store.reload().await;
    assert_eq!(
        reloaded.active_change,
        Some(ActiveRoleChange {
            from: Some(Role::Admin),
            to: Some(Role::Coach)
        })
    );
    assert_eq!(store.active_role(), Some(Role::Coach));
    assert!(!store.can(Capability::ManageSettings));
    assert_eq!(grants.calls(), 3);
}

struct StalledGrants;

#[async_trait]
impl RoleGrantStore for StalledGrants {
    async fn list_roles(&self, _identity_id: &str) -> Result<Vec<String>, StorageError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec!["superadmin".to_string()])
    }
}

#[tokio::test(start_paused = true)]
async fn slow_backend_times_out_to_unknown() {
    let store = RoleStore::new(
        Identity::new("user-1", None),
        Arc::new(StalledGrants),
        Duration::from_millis(200),
    );

    assert_eq!(store.load().await, RoleSnapshot::Unknown);
    assert!(!store.can(Capability::ManageAdmins));
}
