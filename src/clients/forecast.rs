use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::models::forecast::{Forecast, ForecastPayload};

const FORECAST_PATH: &str = "/v1/forecast";

#[derive(Debug, Error)]
pub enum ForecastError {
    #[error("forecast request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("forecast service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid forecast URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Weather data for a coordinate pair.
#[async_trait]
pub trait ForecastProvider: Send + Sync {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast, ForecastError>;
}

#[derive(Clone)]
pub struct OpenMeteoForecast {
    client: Client,
    base_url: String,
}

impl OpenMeteoForecast {
    #[must_use]
    pub fn with_shared_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn forecast_url(&self, latitude: f64, longitude: f64) -> Result<Url, url::ParseError> {
        let latitude = latitude.to_string();
        let longitude = longitude.to_string();
        Url::parse_with_params(
            &format!("{}{}", self.base_url, FORECAST_PATH),
            &[
                ("latitude", latitude.as_str()),
                ("longitude", longitude.as_str()),
                ("current_weather", "true"),
                (
                    "hourly",
                    "temperature_2m,relativehumidity_2m,weathercode",
                ),
                (
                    "daily",
                    "weathercode,temperature_2m_max,temperature_2m_min",
                ),
                ("timezone", "auto"),
            ],
        )
    }
}

#[async_trait]
impl ForecastProvider for OpenMeteoForecast {
    async fn forecast(&self, latitude: f64, longitude: f64) -> Result<Forecast, ForecastError> {
        let url = self.forecast_url(latitude, longitude)?;
        debug!(latitude, longitude, "Fetching forecast");

        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ForecastError::Status { status, body });
        }

        let payload: ForecastPayload = response.json().await?;
        Ok(Forecast::from(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn provider(server: &MockServer) -> OpenMeteoForecast {
        OpenMeteoForecast::with_shared_client(Client::new(), &server.uri())
    }

    #[tokio::test]
    async fn requests_all_blocks_and_converts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/forecast"))
            .and(query_param("latitude", "52.52"))
            .and(query_param("current_weather", "true"))
            .and(query_param("timezone", "auto"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "current_weather": {"temperature": 18.2, "weathercode": 2, "time": "2025-06-01T12:00"},
                "daily": {
                    "time": ["2025-06-01"],
                    "temperature_2m_max": [21.0],
                    "temperature_2m_min": [11.0],
                    "weathercode": [95]
                }
            })))
            .mount(&server)
            .await;

        let forecast = provider(&server).forecast(52.52, 13.41).await.unwrap();
        assert_eq!(forecast.current.weather, "Partly cloudy");
        assert_eq!(forecast.daily.len(), 1);
        assert_eq!(forecast.daily[0].weather, "Thunderstorm");
        assert!(forecast.hourly.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad latitude"))
            .mount(&server)
            .await;

        let err = provider(&server).forecast(999.0, 0.0).await.unwrap_err();
        match err {
            ForecastError::Status { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad latitude");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn undecodable_body_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = provider(&server).forecast(1.0, 1.0).await.unwrap_err();
        assert!(matches!(err, ForecastError::Transport(_)));
    }
}
