//! `SeaORM` implementation of the `SearchService` trait.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::ForecastProvider;
use crate::domain::{City, CityCount, Identity, UserId};
use crate::services::city_directory::CityDirectory;
use crate::services::recent_cities::RecentCityTracker;
use crate::services::search_history::SearchHistoryStore;
use crate::services::search_service::{
    CityLookup, LookupError, SearchService, UserHistory, WeatherReport,
};

pub struct SeaOrmSearchService {
    directory: CityDirectory,
    history: SearchHistoryStore,
    recent: RecentCityTracker,
    forecast: Arc<dyn ForecastProvider>,
    autocomplete_limit: usize,
}

impl SeaOrmSearchService {
    #[must_use]
    pub fn new(
        directory: CityDirectory,
        history: SearchHistoryStore,
        recent: RecentCityTracker,
        forecast: Arc<dyn ForecastProvider>,
        autocomplete_limit: usize,
    ) -> Self {
        Self {
            directory,
            history,
            recent,
            forecast,
            autocomplete_limit,
        }
    }

    fn count_lookup(outcome: &'static str) {
        metrics::counter!("city_lookups_total", "outcome" => outcome).increment(1);
    }
}

#[async_trait]
impl SearchService for SeaOrmSearchService {
    async fn lookup_and_record(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<CityLookup, LookupError> {
        let city = match self.directory.resolve_or_fetch(name).await {
            Ok(city) => city,
            Err(e) => {
                Self::count_lookup(match &e {
                    LookupError::NotFound(_) => "not_found",
                    LookupError::Upstream { .. } => "upstream_error",
                    _ => "store_error",
                });
                return Err(e);
            }
        };
        Self::count_lookup("found");

        self.history.record(identity, &city).await?;
        let recent = self.recent.record_and_get_recent(identity, &city).await?;

        info!(%identity, city = %city.name, "City lookup recorded");
        Ok(CityLookup { city, recent })
    }

    async fn weather(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<WeatherReport, LookupError> {
        let lookup = self.lookup_and_record(identity, name).await?;

        let forecast = self
            .forecast
            .forecast(lookup.city.latitude, lookup.city.longitude)
            .await
            .map_err(|e| {
                warn!(city = %lookup.city.name, error = %e, "Forecast fetch failed");
                LookupError::from(e)
            })?;

        Ok(WeatherReport::new(lookup, forecast))
    }

    async fn recent(&self, identity: &Identity) -> Result<Vec<City>, LookupError> {
        self.recent.get_recent_only(identity).await
    }

    async fn autocomplete(&self, prefix: &str) -> Result<Vec<String>, LookupError> {
        self.directory
            .autocomplete(prefix, self.autocomplete_limit)
            .await
    }

    async fn get_history(&self, identity: &Identity) -> Result<UserHistory, LookupError> {
        let user_id = identity.user_id().ok_or(LookupError::AnonymousHistory)?;

        let searches = self.history.list_for(user_id).await?;
        let stats = self.history.aggregate_for(user_id).await?;

        Ok(UserHistory { searches, stats })
    }

    async fn get_stats(&self, user_id: UserId) -> Result<Vec<CityCount>, LookupError> {
        self.history.aggregate_for(user_id).await
    }
}
