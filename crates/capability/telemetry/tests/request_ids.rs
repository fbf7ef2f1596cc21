use shimms_telemetry::new_request_ids;

#[test]
fn request_ids_non_empty() {
    let ids = new_request_ids();
    assert!(!ids.request_id.is_empty());
    assert!(!ids.trace_id.is_empty());
    assert_ne!(ids.request_id, ids.trace_id);
}

#[test]
fn metrics_snapshot_reflects_recorders() {
    let before = shimms_telemetry::metrics().snapshot();
    shimms_telemetry::record_event_published();
    shimms_telemetry::record_listener_failure();
    let after = shimms_telemetry::metrics().snapshot();
    assert!(after.events_published > before.events_published);
    assert!(after.listener_failures > before.listener_failures);
}
