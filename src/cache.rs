//! Key/value storage for anonymous visitors' recent city lists.

use anyhow::{Context, Result};
use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache;
use std::time::Duration;
use tracing::warn;

use crate::db::Store;
use crate::domain::CityId;

/// Cache key for an anonymous visitor's recent cities.
#[must_use]
pub fn recent_cities_key(ip: &str) -> String {
    format!("recent_cities_{ip}")
}

/// Get/set with expiry. A `set` always replaces the value and restarts the TTL.
#[async_trait]
pub trait RecentCitiesCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<CityId>>>;

    async fn set(&self, key: &str, ids: &[CityId], ttl: Duration) -> Result<()>;
}

/// Visitor lists held by [`MemoryCache`] when no capacity is configured.
pub const DEFAULT_MEMORY_CAPACITY: u64 = 100_000;

#[derive(Clone)]
struct TimedIds {
    ids: Vec<CityId>,
    ttl: Duration,
}

/// Each entry lives for the TTL given to the `set` that wrote it.
struct WriteTtl;

impl Expiry<String, TimedIds> for WriteTtl {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &TimedIds,
        _created_at: std::time::Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        value: &TimedIds,
        _updated_at: std::time::Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// Process-local backend, bounded in size. Entries are lost on restart and
/// expired entries are evicted by the cache's own housekeeping.
#[derive(Clone)]
pub struct MemoryCache {
    entries: Cache<String, TimedIds>,
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MEMORY_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(max_entries: u64) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(max_entries)
                .expire_after(WriteTtl)
                .build(),
        }
    }

    /// Number of entries still held after pending evictions have run.
    #[cfg(test)]
    pub(crate) async fn resident_entries(&self) -> u64 {
        self.entries.run_pending_tasks().await;
        self.entries.entry_count()
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecentCitiesCache for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<CityId>>> {
        Ok(self.entries.get(key).await.map(|entry| entry.ids))
    }

    async fn set(&self, key: &str, ids: &[CityId], ttl: Duration) -> Result<()> {
        self.entries
            .insert(
                key.to_string(),
                TimedIds {
                    ids: ids.to_vec(),
                    ttl,
                },
            )
            .await;
        Ok(())
    }
}

/// `cache_entries` table backend; survives restarts and is shared by every
/// process using the same database.
#[derive(Clone)]
pub struct DatabaseCache {
    store: Store,
}

impl DatabaseCache {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl RecentCitiesCache for DatabaseCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<CityId>>> {
        let Some(raw) = self.store.get_cache_value(key).await? else {
            return Ok(None);
        };

        match serde_json::from_str(&raw) {
            Ok(ids) => Ok(Some(ids)),
            Err(e) => {
                warn!(key, error = %e, "Discarding undecodable cache entry");
                Ok(None)
            }
        }
    }

    async fn set(&self, key: &str, ids: &[CityId], ttl: Duration) -> Result<()> {
        let value = serde_json::to_string(ids).context("Failed to encode cache value")?;
        let ttl = chrono::Duration::from_std(ttl).context("Cache TTL out of range")?;
        self.store.set_cache_value(key, &value, ttl).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WEEK: Duration = Duration::from_secs(7 * 24 * 60 * 60);

    #[tokio::test]
    async fn expired_visitors_are_evicted() {
        let cache = MemoryCache::new();
        for i in 0..200 {
            let key = recent_cities_key(&format!("10.1.0.{i}"));
            cache
                .set(&key, &[CityId::new(i)], Duration::from_millis(200))
                .await
                .unwrap();
        }
        cache.set("live", &[CityId::new(1)], WEEK).await.unwrap();
        assert_eq!(cache.resident_entries().await, 201);

        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(cache.get(&recent_cities_key("10.1.0.7")).await.unwrap(), None);
        assert_eq!(cache.resident_entries().await, 1);
        assert_eq!(cache.get("live").await.unwrap(), Some(vec![CityId::new(1)]));
    }

    #[tokio::test]
    async fn set_restarts_ttl() {
        let cache = MemoryCache::new();
        let ttl = Duration::from_millis(1000);
        cache.set("k", &[CityId::new(1)], ttl).await.unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        cache.set("k", &[CityId::new(1)], ttl).await.unwrap();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(cache.get("k").await.unwrap(), Some(vec![CityId::new(1)]));

        tokio::time::sleep(Duration::from_millis(700)).await;
        assert_eq!(cache.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn capacity_bounds_resident_entries() {
        let cache = MemoryCache::with_capacity(10);
        for i in 0..100 {
            cache
                .set(&format!("k{i}"), &[CityId::new(i)], WEEK)
                .await
                .unwrap();
        }

        assert!(cache.resident_entries().await <= 10);
    }

    #[tokio::test]
    async fn database_cache_round_trips_order() {
        let store = Store::new("sqlite::memory:").await.unwrap();
        let cache = DatabaseCache::new(store);
        let ids = vec![CityId::new(3), CityId::new(1), CityId::new(2)];

        assert_eq!(cache.get("recent_cities_1.1.1.1").await.unwrap(), None);
        cache.set("recent_cities_1.1.1.1", &ids, WEEK).await.unwrap();
        assert_eq!(cache.get("recent_cities_1.1.1.1").await.unwrap(), Some(ids));
    }

    #[test]
    fn key_embeds_ip() {
        assert_eq!(recent_cities_key("10.0.0.7"), "recent_cities_10.0.0.7");
    }
}
