//! The external fetch capability.
//!
//! The client core only ever asks one question of the outside world: "what
//! is the weather in city C, for API key K?". [`WeatherFetcher`] is that
//! question as a trait, and [`FetcherFactory`] builds a fetcher for a key
//! when the registry creates a new client instance.
//!
//! [`OpenWeatherClient`] is the production implementation. Tests plug in
//! their own fetchers through
//! [`RegistryBuilder::fetcher_factory()`](crate::RegistryBuilder::fetcher_factory)
//! or [`ClientInstance::new()`](crate::ClientInstance::new).

pub mod openweather;

use std::sync::Arc;

use async_trait::async_trait;

use crate::Result;
use crate::error::RemoteError;
use crate::types::WeatherData;

pub use openweather::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, OpenWeatherClient};

/// Fetches the current weather for a city.
///
/// Implementations own transport, timeouts and decoding. Any failure is a
/// [`RemoteError`]; the client never retries.
#[async_trait]
pub trait WeatherFetcher: Send + Sync {
    /// Fetcher name for logging/debugging.
    fn name(&self) -> &str {
        "fetcher"
    }

    async fn fetch(&self, api_key: &str, city: &str) -> std::result::Result<WeatherData, RemoteError>;
}

/// Builds the fetcher a new client instance will use.
///
/// Called at most once per instance, under the registry lock. An error here
/// becomes [`WeatherError::InitializationFailed`](crate::WeatherError::InitializationFailed).
pub trait FetcherFactory: Send + Sync {
    fn create(&self, api_key: &str) -> Result<Arc<dyn WeatherFetcher>>;
}

impl<F> FetcherFactory for F
where
    F: Fn(&str) -> Result<Arc<dyn WeatherFetcher>> + Send + Sync,
{
    fn create(&self, api_key: &str) -> Result<Arc<dyn WeatherFetcher>> {
        self(api_key)
    }
}
