pub mod memory;
pub mod models;
pub mod postgres;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::readings::filter::FilterPolicy;

use self::models::{NewReading, SensorReading};

pub use self::{memory::MemoryReadingStore, postgres::PgReadingStore};

/// Any persistence-layer failure. An append that returns this wrote nothing.
#[derive(Debug, Error)]
#[error("reading store failure: {0:#}")]
pub struct StoreError(#[from] pub anyhow::Error);

/// Per-UID append-only reading collections.
#[async_trait]
pub trait ReadingStore: Send + Sync {
    /// Stamp `reading` with the current wall-clock time and append it to the
    /// collection of `uid`, creating the collection on first write.
    async fn append(&self, uid: &str, reading: NewReading) -> Result<SensorReading, StoreError>;

    /// Readings of `uid` admitted by `policy`, newest first.
    async fn query(&self, uid: &str, policy: &FilterPolicy)
        -> Result<Vec<SensorReading>, StoreError>;
}

/// Epoch milliseconds used for `date` at write time.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
