use domain::{Event, EventKind, Role, RoleSet, TelemetryKind, TelemetryRecord};

#[test]
fn role_parse_accepts_known_names_only() {
    assert_eq!("coach".parse::<Role>(), Ok(Role::Coach));
    assert_eq!(" Admin ".parse::<Role>(), Ok(Role::Admin));
    assert!("moderator".parse::<Role>().is_err());
}

#[test]
fn highest_role_follows_privilege_order() {
    let roles = RoleSet::from([Role::Client, Role::Admin, Role::Coach]);
    assert_eq!(roles.highest(), Some(Role::Admin));
    assert_eq!(roles.to_strings(), vec!["admin", "coach", "client"]);
    assert_eq!(RoleSet::new().highest(), None);
}

#[test]
fn event_kind_names_parse() {
    for kind in EventKind::ALL {
        assert_eq!(kind.as_str().parse::<EventKind>(), Ok(kind));
    }
    assert!("userPurged".parse::<EventKind>().is_err());
}

#[test]
fn generic_event_keeps_origin_and_detail() {
    let event = Event::new(
        EventKind::UserDeleted,
        Some(serde_json::json!({ "userId": "user-2" })),
    );
    let generic = Event::generic_from(&event);

    assert_eq!(generic.kind, EventKind::UserDataChanged);
    assert_eq!(generic.origin, Some(EventKind::UserDeleted));
    assert_eq!(generic.detail, event.detail);
}

#[test]
fn telemetry_record_builds_dedupe_key() {
    let record = TelemetryRecord::new(TelemetryKind::ViewEmpty, "/reports", serde_json::json!({}));
    assert_eq!(record.dedupe_key, "view_empty:/reports");
    assert_eq!(record.path, "/reports");
}
