use anyhow::Context;
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use super::{
    models::{NewReading, SensorReading},
    ReadingStore, StoreError,
};
use crate::readings::filter::FilterPolicy;

/// `sensor_readings` table, partitioned by `(app_key, uid)`.
#[derive(Debug, Clone)]
pub struct PgReadingStore {
    pool: PgPool,
    app_key: String,
}

impl PgReadingStore {
    pub fn new(pool: PgPool, app_key: impl Into<String>) -> Self {
        Self { pool, app_key: app_key.into() }
    }
}

#[async_trait]
impl ReadingStore for PgReadingStore {
    async fn append(&self, uid: &str, reading: NewReading) -> Result<SensorReading, StoreError> {
        let reading = SensorReading::stamp(reading, super::now_ms());

        let stored = sqlx::query_as::<_, SensorReading>(
            r#"
            INSERT INTO sensor_readings (id, app_key, uid, temp, tds, ph, orp, tur, date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, temp, tds, ph, orp, tur, date
            "#,
        )
        .bind(reading.id)
        .bind(&self.app_key)
        .bind(uid)
        .bind(reading.temp)
        .bind(reading.tds)
        .bind(reading.ph)
        .bind(reading.orp)
        .bind(reading.tur)
        .bind(reading.date)
        .fetch_one(&self.pool)
        .await
        .with_context(|| format!("insert into collection of {uid:?} failed"))?;

        Ok(stored)
    }

    async fn query(
        &self,
        uid: &str,
        policy: &FilterPolicy,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let since = policy.since_ms();
        let limit = policy.limit().map(|n| n as i64);
        debug!(uid = %uid, ?since, ?limit, "Querying sensor readings");

        // LIMIT NULL is no limit in Postgres.
        let rows = sqlx::query_as::<_, SensorReading>(
            r#"
            SELECT id, temp, tds, ph, orp, tur, date
            FROM sensor_readings
            WHERE app_key = $1
              AND uid     = $2
              AND ($3::bigint IS NULL OR date >= $3)
            ORDER BY date DESC, seq DESC
            LIMIT $4
            "#,
        )
        .bind(&self.app_key)
        .bind(uid)
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .with_context(|| format!("query of collection {uid:?} failed"))?;

        Ok(rows)
    }
}
