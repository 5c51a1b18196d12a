//! Open-Meteo geocoding client: city name to coordinate candidates.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;
use url::Url;

const SEARCH_PATH: &str = "/v1/search";

/// A place returned by the geocoder, in provider ranking order.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeocodeCandidate {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub country: Option<String>,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("geocoding request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("geocoding service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid geocoding URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Name lookup against an external geocoding provider.
///
/// An empty result is not an error; failures are transport problems,
/// timeouts, non-success statuses, or undecodable bodies.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn search(&self, name: &str, limit: usize) -> Result<Vec<GeocodeCandidate>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Option<Vec<GeocodeCandidate>>,
}

#[derive(Clone)]
pub struct OpenMeteoGeocoder {
    client: Client,
    base_url: String,
    language: String,
}

impl OpenMeteoGeocoder {
    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str, language: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            language: language.to_string(),
        }
    }

    fn search_url(&self, name: &str, limit: usize) -> Result<Url, url::ParseError> {
        let count = limit.to_string();
        Url::parse_with_params(
            &format!("{}{}", self.base_url, SEARCH_PATH),
            &[
                ("name", name),
                ("count", count.as_str()),
                ("language", self.language.as_str()),
                ("format", "json"),
            ],
        )
    }
}

#[async_trait]
impl Geocoder for OpenMeteoGeocoder {
    async fn search(&self, name: &str, limit: usize) -> Result<Vec<GeocodeCandidate>, GeocodeError> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        let url = self.search_url(name, limit)?;
        debug!(query = name, limit, "Geocoding lookup");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(GeocodeError::Status { status, body });
        }

        let body: SearchResponse = response.json().await?;
        let mut results = body.results.unwrap_or_default();
        results.truncate(limit);

        Ok(results)
    }
}
