use domain::{Capability, Event, EventKind, Identity, Role, RoleSnapshot, TelemetryKind};
use shimms_auth::{Session, SessionConfig, SessionDeps, SwitchOutcome, SwitchRejection};
use shimms_events::EventHandler;
use shimms_storage::{InMemoryRoleGrantStore, InMemoryRoleSwitchValidator, InMemoryTelemetrySink};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Harness {
    grants: Arc<InMemoryRoleGrantStore>,
    validator: Arc<InMemoryRoleSwitchValidator>,
    sink: Arc<InMemoryTelemetrySink>,
}

impl Harness {
    fn new(roles: &[&str]) -> Self {
        let grants = Arc::new(InMemoryRoleGrantStore::with_grants("user-1", roles));
        let validator = Arc::new(InMemoryRoleSwitchValidator::new(grants.clone()));
        Self {
            grants,
            validator,
            sink: Arc::new(InMemoryTelemetrySink::new()),
        }
    }

    fn deps(&self) -> SessionDeps {
        SessionDeps {
            grants: self.grants.clone(),
            validator: self.validator.clone(),
            telemetry_sink: self.sink.clone(),
        }
    }

    async fn start(&self) -> Session {
        Session::start(
            Identity::new("user-1", Some("user@example.se".to_string())),
            self.deps(),
            SessionConfig::default(),
        )
        .await
    }
}

#[tokio::test]
async fn coach_cannot_manage_settings() {
    let harness = Harness::new(&["coach"]);
    let session = harness.start().await;

    assert_eq!(session.context().active_role, Some(Role::Coach));
    assert!(!session.can(Capability::ManageSettings));
    assert!(session.can(Capability::ViewAssignedClients));
    assert!(session.can(Capability::EditOwnProfile));
}

#[tokio::test]
async fn switching_from_coach_to_admin_fires_role_and_data_events() {
    let harness = Harness::new(&["admin", "coach"]);
    let session = harness.start().await;
    assert_eq!(
        session.switch_role(Role::Coach).await,
        Ok(SwitchOutcome::Switched {
            from: Role::Admin,
            to: Role::Coach
        })
    );
    assert!(!session.can(Capability::ManageSettings));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: EventHandler = Arc::new(move |event: &Event| {
        sink.lock().unwrap().push((event.kind, event.origin));
    });
    let _sub = session
        .bus()
        .subscribe(&[EventKind::RoleChanged, EventKind::UserDataChanged], &handler);

    let outcome = session.switch_role(Role::Admin).await;

    assert_eq!(
        outcome,
        Ok(SwitchOutcome::Switched {
            from: Role::Coach,
            to: Role::Admin
        })
    );
    assert_eq!(session.context().active_role, Some(Role::Admin));
    assert!(session.can(Capability::ManageSettings));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (EventKind::RoleChanged, None),
            (EventKind::UserDataChanged, Some(EventKind::RoleChanged)),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn empty_reports_view_reported_once_per_session() {
    let harness = Harness::new(&["admin"]);
    let session = harness.start().await;
    let threshold = session.config().empty_view_threshold;

    session
        .telemetry()
        .report_if_empty_past_threshold(false, false, threshold, "/reports");
    tokio::time::sleep(threshold + Duration::from_millis(1)).await;
    session.telemetry().flush().await;

    session.telemetry().clear_view("/reports");
    session
        .telemetry()
        .report_if_empty_past_threshold(false, false, threshold, "/reports");
    tokio::time::sleep(threshold + Duration::from_millis(1)).await;
    session.telemetry().flush().await;

    let records = harness.sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].kind, TelemetryKind::ViewEmpty);
    assert_eq!(records[0].path, "/reports");
    assert_eq!(records[0].metadata["identityId"], "user-1");
}

#[tokio::test]
async fn denied_switch_refreshes_stale_grants() {
    let harness = Harness::new(&["admin", "coach"]);
    let session = harness.start().await;
    harness.grants.revoke("user-1", "coach");

    let outcome = session.switch_role(Role::Coach).await;
    assert!(matches!(outcome, Err(SwitchRejection::Denied { .. })));
    assert!(!session.role_store().has_role(Role::Coach));
    assert_eq!(session.context().active_role, Some(Role::Admin));
}

#[tokio::test]
async fn revoked_active_role_resets_and_announces() {
    let harness = Harness::new(&["admin", "coach"]);
    let session = harness.start().await;
    assert_eq!(session.context().active_role, Some(Role::Admin));

    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: EventHandler = Arc::new(move |event: &Event| {
        sink.lock().unwrap().push((event.kind, event.origin));
    });
    let _sub = session
        .bus()
        .subscribe(&[EventKind::RoleChanged, EventKind::UserDataChanged], &handler);
    harness.grants.revoke("user-1", "admin");

    let outcome = session.switch_role(Role::Coach).await;

    assert_eq!(
        outcome,
        Ok(SwitchOutcome::Switched {
            from: Role::Admin,
            to: Role::Coach
        })
    );
    assert_eq!(session.context().active_role, Some(outcome.unwrap().active_role()));
    assert!(!session.can(Capability::ManageSettings));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (EventKind::RoleChanged, None),
            (EventKind::UserDataChanged, Some(EventKind::RoleChanged)),
        ]
    );
}

#[tokio::test]
async fn refresh_announces_active_role_reset() {
    let harness = Harness::new(&["admin", "client"]);
    let session = harness.start().await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = seen.clone();
    let handler: EventHandler = Arc::new(move |event: &Event| {
        sink.lock().unwrap().push(event.detail.clone());
    });
    let _sub = session.bus().subscribe(&[EventKind::RoleChanged], &handler);

    session.refresh_roles().await;
    assert!(seen.lock().unwrap().is_empty());

    harness.grants.revoke("user-1", "admin");
    session.refresh_roles().await;

    assert_eq!(session.context().active_role, Some(Role::Client));
    assert_eq!(
        *seen.lock().unwrap(),
        vec![Some(serde_json::json!({
            "identityId": "user-1",
            "from": "admin",
            "to": "client"
        }))]
    );
}

#[tokio::test]
async fn unknown_roles_session_denies_everything() {
    let harness = Harness::new(&["superadmin"]);
    harness.grants.set_failing(true);
    let session = harness.start().await;

    assert_eq!(session.context().roles, RoleSnapshot::Unknown);
    assert!(!session.can(Capability::EditOwnProfile));
    assert!(!session.can(Capability::ManageAdmins));

    harness.grants.set_failing(false);
    assert!(session.refresh_roles().await.is_known());
    assert!(session.can(Capability::ManageAdmins));
}

#[tokio::test(start_paused = true)]
async fn end_cancels_pending_checks_and_clears_listeners() {
    let harness = Harness::new(&["client"]);
    let session = harness.start().await;
    let handler: EventHandler = Arc::new(|_event: &Event| {});
    let sub = session.bus().subscribe(&[EventKind::UserUpdated], &handler);
    session
        .telemetry()
        .report_if_empty_past_threshold(false, false, Duration::from_secs(10), "/progress");

    session.end().await;

    assert_eq!(session.bus().listener_count(EventKind::UserUpdated), 0);
    assert_eq!(session.telemetry().pending_checks(), 0);
    tokio::time::sleep(Duration::from_secs(11)).await;
    assert_eq!(harness.sink.attempts(), 0);
    drop(sub);
}
