//! Postgres 诊断事件 sink

use crate::error::StorageError;
use crate::traits::TelemetrySink;
use domain::TelemetryRecord;
use sqlx::PgPool;

pub struct PgTelemetrySink {
    pub pool: PgPool,
}

impl PgTelemetrySink {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl TelemetrySink for PgTelemetrySink {
    async fn deliver(&self, record: &TelemetryRecord) -> Result<(), StorageError> {
        sqlx::query(
            "insert into analytics_events (event_type, path, dedupe_key, metadata, created_at) \
             values ($1, $2, $3, $4::jsonb, to_timestamp($5::double precision / 1000))",
        )
        .bind(record.kind.as_str())
        .bind(&record.path)
        .bind(&record.dedupe_key)
        .bind(record.metadata.to_string())
        .bind(record.recorded_at_ms)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
