use domain::{TelemetryKind, TelemetryRecord};
use shimms_storage::{InMemoryTelemetrySink, TelemetrySink};

#[tokio::test]
async fn sink_records_delivered_items() {
    let sink = InMemoryTelemetrySink::new();
    let record = TelemetryRecord::new(TelemetryKind::NotFound, "/x", serde_json::json!({}));

    sink.deliver(&record).await.expect("deliver");

    let records = sink.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].dedupe_key, "not_found:/x");
}

#[tokio::test]
async fn failing_sink_counts_attempts_without_recording() {
    let sink = InMemoryTelemetrySink::new();
    sink.set_failing(true);
    let record = TelemetryRecord::new(TelemetryKind::ViewEmpty, "/reports", serde_json::json!({}));

    assert!(sink.deliver(&record).await.is_err());
    assert!(sink.is_empty());
    assert_eq!(sink.attempts(), 1);
}
