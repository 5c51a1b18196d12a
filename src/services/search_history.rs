use tracing::debug;

use crate::db::Store;
use crate::domain::{City, CityCount, Identity, SearchEntry, SearchEvent, UserId};
use crate::services::search_service::LookupError;

/// Append-only log of searches and its per-user views.
#[derive(Clone)]
pub struct SearchHistoryStore {
    store: Store,
}

impl SearchHistoryStore {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Persists one search. Anonymous events carry no user and keep the IP.
    pub async fn record(&self, identity: &Identity, city: &City) -> Result<SearchEvent, LookupError> {
        let event = self
            .store
            .record_search(identity.user_id(), city.id, identity.ip())
            .await?;

        debug!(%identity, city = %city.name, event_id = event.id, "Recorded search");
        Ok(event)
    }

    /// Every search of `user_id`, newest first.
    pub async fn list_for(&self, user_id: UserId) -> Result<Vec<SearchEntry>, LookupError> {
        Ok(self.store.list_searches(user_id).await?)
    }

    /// The `limit` newest searches of `user_id`, repeats included.
    pub async fn recent_for(
        &self,
        user_id: UserId,
        limit: usize,
    ) -> Result<Vec<SearchEntry>, LookupError> {
        Ok(self.store.recent_searches(user_id, limit as u64).await?)
    }

    /// Searches per city, most searched first; equal counts are ordered by city name.
    pub async fn aggregate_for(&self, user_id: UserId) -> Result<Vec<CityCount>, LookupError> {
        Ok(self.store.search_counts(user_id).await?)
    }
}
