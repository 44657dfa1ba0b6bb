use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{
    models::{NewReading, SensorReading},
    ReadingStore, StoreError,
};
use crate::readings::filter::FilterPolicy;

/// In-process reading store keyed by `(app_key, uid)`.
///
/// Wrapped in `Arc` so it can be cheaply cloned and shared across tasks.
/// Each collection is kept in append order.
#[derive(Clone)]
pub struct MemoryReadingStore {
    app_key: String,
    inner: Arc<RwLock<HashMap<(String, String), Vec<SensorReading>>>>,
}

impl MemoryReadingStore {
    pub fn new(app_key: impl Into<String>) -> Self {
        Self {
            app_key: app_key.into(),
            inner: Arc::default(),
        }
    }

    /// Append with an explicit `date` instead of the wall clock.
    pub(crate) async fn append_at(&self, uid: &str, reading: NewReading, date: i64) -> SensorReading {
        let stored = SensorReading::stamp(reading, date);
        self.inner
            .write()
            .await
            .entry((self.app_key.clone(), uid.to_owned()))
            .or_default()
            .push(stored.clone());
        stored
    }

    /// Number of readings held for `uid`.
    #[cfg(test)]
    pub(crate) async fn len(&self, uid: &str) -> usize {
        self.inner
            .read()
            .await
            .get(&(self.app_key.clone(), uid.to_owned()))
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl ReadingStore for MemoryReadingStore {
    async fn append(&self, uid: &str, reading: NewReading) -> Result<SensorReading, StoreError> {
        Ok(self.append_at(uid, reading, super::now_ms()).await)
    }

    async fn query(
        &self,
        uid: &str,
        policy: &FilterPolicy,
    ) -> Result<Vec<SensorReading>, StoreError> {
        let guard = self.inner.read().await;
        let Some(collection) = guard.get(&(self.app_key.clone(), uid.to_owned())) else {
            return Ok(Vec::new());
        };

        // Reverse first so the stable sort leaves later appends ahead of
        // earlier ones that share a `date`.
        let mut rows: Vec<SensorReading> = collection
            .iter()
            .rev()
            .filter(|r| policy.admits(r.date))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date));

        if let Some(limit) = policy.limit() {
            rows.truncate(limit);
        }
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readings::filter::FilterToken;

    const HOUR: i64 = 3_600_000;
    const NOW: i64 = 1_700_000_000_000;

    fn reading(temp: f64) -> NewReading {
        NewReading { temp, tds: 300.0, ph: 7.0, orp: None, tur: None }
    }

    #[tokio::test]
    async fn unknown_uid_yields_empty_sequence() {
        let store = MemoryReadingStore::new("hydrosense");
        let rows = store.query("nobody", &FilterPolicy::All).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn append_assigns_id_and_current_date() {
        let store = MemoryReadingStore::new("hydrosense");
        let before = crate::db::now_ms();
        let stored = store.append("u1", reading(25.0)).await.unwrap();
        let after = crate::db::now_ms();

        assert!(stored.date >= before && stored.date <= after);
        assert_eq!(stored.temp, 25.0);
        assert_eq!(store.len("u1").await, 1);
    }

    #[tokio::test]
    async fn query_orders_newest_first() {
        let store = MemoryReadingStore::new("hydrosense");
        store.append_at("u1", reading(1.0), NOW - 2 * HOUR).await;
        store.append_at("u1", reading(2.0), NOW).await;
        store.append_at("u1", reading(3.0), NOW - HOUR).await;

        let rows = store.query("u1", &FilterPolicy::All).await.unwrap();
        let temps: Vec<f64> = rows.iter().map(|r| r.temp).collect();
        assert_eq!(temps, vec![2.0, 3.0, 1.0]);
    }

    #[tokio::test]
    async fn equal_dates_put_latest_append_first() {
        let store = MemoryReadingStore::new("hydrosense");
        for t in 0..5 {
            store.append_at("u1", reading(f64::from(t)), NOW).await;
        }
        let rows = store.query("u1", &FilterPolicy::TopN(2)).await.unwrap();
        let temps: Vec<f64> = rows.iter().map(|r| r.temp).collect();
        assert_eq!(temps, vec![4.0, 3.0]);
    }

    #[tokio::test]
    async fn top_n_truncates() {
        let store = MemoryReadingStore::new("hydrosense");
        for i in 0..15 {
            store.append_at("u1", reading(f64::from(i)), NOW + i64::from(i)).await;
        }
        let rows = store.query("u1", &FilterPolicy::TopN(10)).await.unwrap();
        assert_eq!(rows.len(), 10);
        assert_eq!(rows[0].temp, 14.0);
        assert_eq!(rows[9].temp, 5.0);
    }

    #[tokio::test]
    async fn unbounded_default_caps_at_limit() {
        let store = MemoryReadingStore::new("hydrosense");
        for i in 0..120 {
            store.append_at("u1", reading(f64::from(i)), NOW + i64::from(i)).await;
        }
        let rows = store
            .query("u1", &FilterPolicy::resolve_at(None, NOW))
            .await
            .unwrap();
        assert_eq!(rows.len(), 100);

        let all = store.query("u1", &FilterPolicy::All).await.unwrap();
        assert_eq!(all.len(), 120);
    }

    #[tokio::test]
    async fn hour_window_excludes_older_readings() {
        let store = MemoryReadingStore::new("hydrosense");
        store.append_at("u1", reading(1.0), NOW - 5 * HOUR).await;
        store.append_at("u1", reading(2.0), NOW - 4 * HOUR).await;
        store.append_at("u1", reading(3.0), NOW - HOUR).await;

        let policy = FilterPolicy::resolve_at(Some(FilterToken::Hours(4)), NOW);
        let rows = store.query("u1", &policy).await.unwrap();
        let temps: Vec<f64> = rows.iter().map(|r| r.temp).collect();
        assert_eq!(temps, vec![3.0, 2.0]);
    }

    #[tokio::test]
    async fn collections_are_scoped_per_uid() {
        let store = MemoryReadingStore::new("hydrosense");
        store.append_at("u1", reading(1.0), NOW).await;
        store.append_at("u2", reading(2.0), NOW).await;

        let rows = store.query("u1", &FilterPolicy::All).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].temp, 1.0);
    }

    #[tokio::test]
    async fn app_keys_do_not_share_collections() {
        let a = MemoryReadingStore::new("alpha");
        let b = MemoryReadingStore { app_key: "beta".into(), inner: a.inner.clone() };
        a.append_at("u1", reading(1.0), NOW).await;

        assert!(b.query("u1", &FilterPolicy::All).await.unwrap().is_empty());
        assert_eq!(a.len("u1").await, 1);
    }

    #[tokio::test]
    async fn repeated_queries_are_identical() {
        let store = MemoryReadingStore::new("hydrosense");
        for i in 0..5 {
            store.append_at("u1", reading(f64::from(i)), NOW).await;
        }
        let first = store.query("u1", &FilterPolicy::All).await.unwrap();
        let second = store.query("u1", &FilterPolicy::All).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let store = MemoryReadingStore::new("hydrosense");
        let clone = store.clone();
        store.append_at("u1", reading(1.0), NOW).await;
        assert_eq!(clone.len("u1").await, 1);
    }
}
