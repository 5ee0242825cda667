//! Client instances and their background refresh.
//!
//! A [`ClientInstance`] binds one API key to one cache and one fetcher.
//! Lookups go cache-first; misses and stale entries are fetched and stored.
//! In [`Mode::Polling`](crate::Mode::Polling) the instance also owns a
//! background task that re-fetches every cached city on a fixed delay.

mod instance;
mod polling;

use std::time::Duration;

pub use instance::ClientInstance;
pub use polling::PollReport;

use crate::cache::CacheConfig;
use crate::{Result, WeatherError};

/// Default delay between the end of one poll run and the start of the next.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// Default time shutdown waits for an in-flight poll run before aborting it.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Per-instance settings.
///
/// ```rust
/// # use huginn::{CacheConfig, ClientConfig};
/// # use std::time::Duration;
/// let config = ClientConfig::new()
///     .cache(CacheConfig::new().max_entries(20))
///     .poll_interval(Duration::from_secs(120));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub cache: CacheConfig,
    /// Fixed delay between poll runs. Default: 10 minutes.
    pub poll_interval: Duration,
    /// Grace period for stopping the poller. Default: 5 seconds.
    pub shutdown_grace: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    /// Reject settings that would make the cache or the poller useless.
    pub fn validate(&self) -> Result<()> {
        if self.cache.max_entries == 0 {
            return Err(WeatherError::Configuration(
                "cache max_entries must be at least 1".to_string(),
            ));
        }
        if self.cache.ttl.is_zero() {
            return Err(WeatherError::Configuration(
                "cache ttl must be greater than zero".to_string(),
            ));
        }
        if self.poll_interval.is_zero() {
            return Err(WeatherError::Configuration(
                "poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
