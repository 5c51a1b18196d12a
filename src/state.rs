use std::sync::Arc;
use tokio::sync::RwLock;

use crate::cache::{DatabaseCache, MemoryCache, RecentCitiesCache};
use crate::clients::{ForecastProvider, Geocoder, OpenMeteoForecast, OpenMeteoGeocoder};
use crate::config::{CacheBackend, Config};
use crate::db::Store;
use crate::services::{
    CityDirectory, RecentCityTracker, SeaOrmSearchService, SearchHistoryStore, SearchService,
};

/// Build an HTTP client for provider calls.
/// Clients are shared by every request so connections are pooled.
fn build_shared_http_client(timeout_seconds: u64) -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_seconds))
        .user_agent(concat!("Weatherdesk/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub search_service: Arc<dyn SearchService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let geocoder = Arc::new(OpenMeteoGeocoder::with_shared_client(
            build_shared_http_client(config.geocoding.request_timeout_seconds)?,
            &config.geocoding.base_url,
            &config.geocoding.language,
        ));
        let forecast = Arc::new(OpenMeteoForecast::with_shared_client(
            build_shared_http_client(config.forecast.request_timeout_seconds)?,
            &config.forecast.base_url,
        ));

        Self::with_providers(config, geocoder, forecast).await
    }

    /// Wires the services around the given providers.
    pub async fn with_providers(
        config: Config,
        geocoder: Arc<dyn Geocoder>,
        forecast: Arc<dyn ForecastProvider>,
    ) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let cache: Arc<dyn RecentCitiesCache> = match config.cache.backend {
            CacheBackend::Memory => {
                Arc::new(MemoryCache::with_capacity(config.cache.memory_max_entries))
            }
            CacheBackend::Database => Arc::new(DatabaseCache::new(store.clone())),
        };

        let search_service: Arc<dyn SearchService> = Arc::new(SeaOrmSearchService::new(
            CityDirectory::new(store.clone(), geocoder),
            SearchHistoryStore::new(store.clone()),
            RecentCityTracker::new(
                store.clone(),
                cache,
                config.cache.recent_capacity,
                config.cache.recent_ttl(),
            ),
            forecast,
            config.geocoding.autocomplete_limit,
        ));

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            search_service,
        })
    }

    pub async fn config(&self) -> Config {
        self.config.read().await.clone()
    }
}
