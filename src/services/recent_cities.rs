use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::debug;

use crate::cache::{RecentCitiesCache, recent_cities_key};
use crate::db::Store;
use crate::domain::{City, CityId, Identity, UserId};
use crate::services::search_history::SearchHistoryStore;
use crate::services::search_service::LookupError;

/// "Recently searched" cities per identity.
///
/// Users get their newest search events. Anonymous visitors get a capped,
/// deduplicated list in the cache, keyed by IP, whose TTL restarts on every write.
pub struct RecentCityTracker {
    store: Store,
    history: SearchHistoryStore,
    cache: Arc<dyn RecentCitiesCache>,
    capacity: usize,
    ttl: Duration,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl RecentCityTracker {
    #[must_use]
    pub fn new(
        store: Store,
        cache: Arc<dyn RecentCitiesCache>,
        capacity: usize,
        ttl: Duration,
    ) -> Self {
        Self {
            history: SearchHistoryStore::new(store.clone()),
            store,
            cache,
            capacity,
            ttl,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Notes `city` as searched by `identity` and returns the updated list.
    ///
    /// For users the search event must already be recorded.
    pub async fn record_and_get_recent(
        &self,
        identity: &Identity,
        city: &City,
    ) -> Result<Vec<City>, LookupError> {
        match identity {
            Identity::User { id, .. } => self.user_recent(*id).await,
            Identity::Anonymous { ip } => {
                let key = recent_cities_key(ip);
                let ids = self.push_front(&key, city.id).await?;
                Ok(self.store.get_cities_by_ids(&ids).await?)
            }
        }
    }

    pub async fn get_recent_only(&self, identity: &Identity) -> Result<Vec<City>, LookupError> {
        match identity {
            Identity::User { id, .. } => self.user_recent(*id).await,
            Identity::Anonymous { ip } => {
                let ids = self
                    .cache
                    .get(&recent_cities_key(ip))
                    .await?
                    .unwrap_or_default();
                Ok(self.store.get_cities_by_ids(&ids).await?)
            }
        }
    }

    async fn user_recent(&self, user_id: UserId) -> Result<Vec<City>, LookupError> {
        let entries = self.history.recent_for(user_id, self.capacity).await?;
        Ok(entries.into_iter().map(|e| e.city).collect())
    }

    /// Read-modify-write of one cache entry, serialized per key.
    async fn push_front(&self, key: &str, city_id: CityId) -> Result<Vec<CityId>, LookupError> {
        let lock = {
            let mut locks = self.locks.lock().await;
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let result = {
            let _guard = lock.lock().await;
            self.update_entry(key, city_id).await
        };

        drop(lock);
        let mut locks = self.locks.lock().await;
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }

        result
    }

    async fn update_entry(&self, key: &str, city_id: CityId) -> Result<Vec<CityId>, LookupError> {
        let mut ids = self.cache.get(key).await?.unwrap_or_default();

        // A repeat keeps its position; only the TTL is refreshed
        if !ids.contains(&city_id) {
            ids.insert(0, city_id);
            ids.truncate(self.capacity);
        }

        self.cache.set(key, &ids, self.ttl).await?;
        debug!(key, size = ids.len(), "Updated recent cities");
        Ok(ids)
    }

    #[cfg(test)]
    async fn lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }
}
