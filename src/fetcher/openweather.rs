//! OpenWeatherMap current-weather client.
//!
//! Calls `GET {base}/data/2.5/weather?q={city}&appid={key}`.
//! See: <https://openweathermap.org/current>

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use super::WeatherFetcher;
use crate::error::RemoteError;
use crate::types::WeatherData;
use crate::{Result, WeatherError};

/// Default base URL for the OpenWeatherMap API
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Default per-request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const WEATHER_PATH: &str = "/data/2.5/weather";

/// HTTP fetcher for the OpenWeatherMap API.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: Client,
    base_url: String,
}

impl OpenWeatherClient {
    /// Create a client against the public API with the default timeout.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL (for testing with wiremock).
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                WeatherError::InitializationFailed(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl WeatherFetcher for OpenWeatherClient {
    fn name(&self) -> &str {
        "openweather"
    }

    #[instrument(skip(self, api_key))]
    async fn fetch(&self, api_key: &str, city: &str) -> std::result::Result<WeatherData, RemoteError> {
        let url = format!("{}{WEATHER_PATH}", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(&[("q", city), ("appid", api_key)])
            .send()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // 401 bad key, 404 unknown city, 429 quota, ...
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Api {
                status: status.as_u16(),
                city: city.to_string(),
                message,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Http(e.to_string()))?;

        serde_json::from_str(&body).map_err(|e| RemoteError::Parse(e.to_string()))
    }
}
