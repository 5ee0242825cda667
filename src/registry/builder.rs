//! Builder for configuring instance registries

use std::sync::Arc;
use std::time::Duration;

use super::InstanceRegistry;
use crate::Result;
use crate::cache::CacheConfig;
use crate::client::ClientConfig;
use crate::fetcher::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT, FetcherFactory, OpenWeatherClient, WeatherFetcher};

/// Builder for [`InstanceRegistry`].
///
/// ```rust
/// # use huginn::InstanceRegistry;
/// # use std::time::Duration;
/// let registry = InstanceRegistry::builder()
///     .request_timeout(Duration::from_secs(10))
///     .poll_interval(Duration::from_secs(300))
///     .build()?;
/// assert!(registry.is_empty());
/// # Ok::<(), huginn::WeatherError>(())
/// ```
pub struct RegistryBuilder {
    factory: Option<Arc<dyn FetcherFactory>>,
    base_url: Option<String>,
    request_timeout: Option<Duration>,
    client_config: ClientConfig,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            factory: None,
            base_url: None,
            request_timeout: None,
            client_config: ClientConfig::default(),
        }
    }

    /// Use a custom fetcher factory instead of the OpenWeatherMap client.
    ///
    /// Overrides [`base_url()`](Self::base_url) and
    /// [`request_timeout()`](Self::request_timeout).
    pub fn fetcher_factory(mut self, factory: impl FetcherFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Point the default fetcher at another host (e.g. a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Per-request timeout of the default fetcher (default: 30s).
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Replace all per-instance settings at once.
    pub fn client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.client_config.cache = cache;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.client_config.poll_interval = interval;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.client_config.shutdown_grace = grace;
        self
    }

    /// Build the registry.
    ///
    /// Fails with a configuration error for invalid settings, or with
    /// `InitializationFailed` if the HTTP client cannot be built.
    pub fn build(self) -> Result<InstanceRegistry> {
        self.client_config.validate()?;

        let factory = match self.factory {
            Some(factory) => factory,
            None => {
                // One HTTP client (and connection pool) shared by all instances.
                let client: Arc<dyn WeatherFetcher> = Arc::new(OpenWeatherClient::with_base_url(
                    self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL),
                    self.request_timeout.unwrap_or(DEFAULT_TIMEOUT),
                )?);
                let factory = move |_api_key: &str| -> Result<Arc<dyn WeatherFetcher>> {
                    Ok(Arc::clone(&client))
                };
                Arc::new(factory) as Arc<dyn FetcherFactory>
            }
        };

        Ok(InstanceRegistry::from_parts(factory, self.client_config))
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}
