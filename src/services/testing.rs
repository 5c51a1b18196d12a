//! Shared doubles for service tests.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::clients::{
    ForecastError, ForecastProvider, GeocodeCandidate, GeocodeError, Geocoder,
};
use crate::db::Store;
use crate::models::forecast::{CurrentWeather, Forecast};

pub async fn memory_store() -> Store {
    Store::new("sqlite::memory:").await.unwrap()
}

/// File-backed store so concurrent writers go through separate connections.
pub async fn temp_file_store() -> (Store, PathBuf) {
    let path = std::env::temp_dir().join(format!("weatherdesk-test-{}.db", uuid::Uuid::new_v4()));
    let url = format!("sqlite:{}?mode=rwc", path.display());
    (Store::new(&url).await.unwrap(), path)
}

/// Geocoder returning a fixed candidate list (or failing) and counting calls.
pub struct FakeGeocoder {
    results: Vec<GeocodeCandidate>,
    fail: bool,
    calls: AtomicUsize,
    last_limit: Mutex<Option<usize>>,
}

impl FakeGeocoder {
    pub fn returning(results: &[(&str, f64, f64)]) -> Self {
        Self {
            results: results
                .iter()
                .map(|(name, latitude, longitude)| GeocodeCandidate {
                    name: (*name).to_string(),
                    latitude: *latitude,
                    longitude: *longitude,
                    country: None,
                })
                .collect(),
            fail: false,
            calls: AtomicUsize::new(0),
            last_limit: Mutex::new(None),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::returning(&[])
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_limit(&self) -> Option<usize> {
        *self.last_limit.lock().unwrap()
    }
}

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn search(&self, _name: &str, limit: usize) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_limit.lock().unwrap() = Some(limit);

        if self.fail {
            return Err(GeocodeError::Status {
                status: 503,
                body: "unavailable".to_string(),
            });
        }

        Ok(self.results.iter().take(limit).cloned().collect())
    }
}

/// Forecast provider with a canned answer.
pub struct FakeForecast {
    fail: bool,
}

impl FakeForecast {
    pub const fn ok() -> Self {
        Self { fail: false }
    }

    pub const fn failing() -> Self {
        Self { fail: true }
    }
}

#[async_trait]
impl ForecastProvider for FakeForecast {
    async fn forecast(&self, _latitude: f64, _longitude: f64) -> Result<Forecast, ForecastError> {
        if self.fail {
            return Err(ForecastError::Status {
                status: 500,
                body: "boom".to_string(),
            });
        }

        Ok(Forecast {
            current: CurrentWeather {
                temperature: Some(20.0),
                windspeed: Some(5.0),
                winddirection: Some(180.0),
                weather: "Clear sky".to_string(),
                time: Some("2025-06-01T12:00".to_string()),
            },
            daily: Vec::new(),
            hourly: Vec::new(),
        })
    }
}
