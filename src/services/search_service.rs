//! Domain service for city lookups and search history.
//!
//! Coordinates city resolution, search recording, recent-city bookkeeping
//! and forecast retrieval behind one trait so HTTP handlers and CLI commands
//! share the same behavior.

use serde::Serialize;
use thiserror::Error;

use crate::clients::{ForecastError, GeocodeError};
use crate::domain::{City, CityCount, Identity, SearchEntry, UserId};
use crate::models::forecast::{CurrentWeather, DailyForecast, Forecast, HourlyForecast};

/// Errors surfaced by lookups and history queries.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("City not found: {0}")]
    NotFound(String),

    #[error("External service error: {service} - {message}")]
    Upstream { service: String, message: String },

    #[error("Database error: {0}")]
    Store(String),

    #[error("Search history requires an authenticated user")]
    AnonymousHistory,
}

impl From<sea_orm::DbErr> for LookupError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Store(err.to_string())
    }
}

impl From<anyhow::Error> for LookupError {
    fn from(err: anyhow::Error) -> Self {
        Self::Store(format!("{err:#}"))
    }
}

impl From<GeocodeError> for LookupError {
    fn from(err: GeocodeError) -> Self {
        Self::Upstream {
            service: "geocoding".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<ForecastError> for LookupError {
    fn from(err: ForecastError) -> Self {
        Self::Upstream {
            service: "forecast".to_string(),
            message: err.to_string(),
        }
    }
}

/// Outcome of a successful lookup: the resolved city and the caller's
/// recent cities after recording it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CityLookup {
    pub city: City,
    pub recent: Vec<City>,
}

/// Lookup result enriched with the forecast for the resolved city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherReport {
    pub city: City,
    pub recent: Vec<City>,
    pub current: CurrentWeather,
    pub daily: Vec<DailyForecast>,
    pub hourly: Vec<HourlyForecast>,
}

impl WeatherReport {
    #[must_use]
    pub fn new(lookup: CityLookup, forecast: Forecast) -> Self {
        Self {
            city: lookup.city,
            recent: lookup.recent,
            current: forecast.current,
            daily: forecast.daily,
            hourly: forecast.hourly,
        }
    }
}

/// Full history of one user: newest-first searches and ranked counts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserHistory {
    pub searches: Vec<SearchEntry>,
    pub stats: Vec<CityCount>,
}

/// Domain service trait for lookups and history.
#[async_trait::async_trait]
pub trait SearchService: Send + Sync {
    /// Resolves `name` and, on success, records the search for `identity`.
    ///
    /// # Errors
    ///
    /// - [`LookupError::NotFound`] if neither the directory nor the geocoder knows the name
    /// - [`LookupError::Upstream`] if the geocoder failed
    /// - [`LookupError::Store`] if recording failed
    ///
    /// Failed resolutions record nothing.
    async fn lookup_and_record(
        &self,
        identity: &Identity,
        name: &str,
    ) -> Result<CityLookup, LookupError>;

    /// [`Self::lookup_and_record`] followed by a forecast fetch.
    ///
    /// The search stays recorded when only the forecast fails.
    async fn weather(&self, identity: &Identity, name: &str)
    -> Result<WeatherReport, LookupError>;

    /// Recent cities for `identity` without recording anything.
    async fn recent(&self, identity: &Identity) -> Result<Vec<City>, LookupError>;

    /// Name suggestions for a search box. Geocoder failures only shrink the result.
    async fn autocomplete(&self, prefix: &str) -> Result<Vec<String>, LookupError>;

    /// Returns [`LookupError::AnonymousHistory`] for anonymous identities.
    async fn get_history(&self, identity: &Identity) -> Result<UserHistory, LookupError>;

    async fn get_stats(&self, user_id: UserId) -> Result<Vec<CityCount>, LookupError>;
}
