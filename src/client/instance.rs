use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Mutex;

use tracing::{info, instrument};

use super::ClientConfig;
use super::polling::{self, PollReport, PollingScheduler};
use crate::cache::WeatherCache;
use crate::fetcher::WeatherFetcher;
use crate::types::{Mode, WeatherData};
use crate::{Result, telemetry};

/// State shared by the foreground path and the polling task.
pub(super) struct Shared {
    api_key: String,
    cache: WeatherCache,
    fetcher: Arc<dyn WeatherFetcher>,
}

impl Shared {
    pub(super) fn cache(&self) -> &WeatherCache {
        &self.cache
    }

    /// Fetch `city`, store the result, return it.
    ///
    /// `source` labels metrics: "foreground" or "poll".
    pub(super) async fn refresh(&self, city: &str, source: &'static str) -> Result<Arc<WeatherData>> {
        let started = Instant::now();
        let result = self.fetcher.fetch(&self.api_key, city).await;

        metrics::histogram!(telemetry::FETCH_DURATION_SECONDS, "source" => source)
            .record(started.elapsed().as_secs_f64());
        let status = if result.is_ok() { "ok" } else { "error" };
        metrics::counter!(telemetry::FETCHES_TOTAL, "source" => source, "status" => status)
            .increment(1);

        let data = Arc::new(result?);
        self.cache.put(city, Arc::clone(&data));
        Ok(data)
    }
}

/// A weather client bound to one API key.
///
/// Created by [`InstanceRegistry::get_instance()`](crate::InstanceRegistry::get_instance)
/// (one per key) or directly with [`ClientInstance::new()`] when a custom
/// fetcher is injected. The mode is fixed for the lifetime of the instance.
///
/// Dropping the last handle aborts a still-running poller, but callers should
/// prefer [`delete()`](Self::delete) or
/// [`InstanceRegistry::release_instance()`](crate::InstanceRegistry::release_instance)
/// so an in-flight poll run gets its grace period.
pub struct ClientInstance {
    shared: Arc<Shared>,
    mode: Mode,
    config: ClientConfig,
    poller: Mutex<Poller>,
}

/// Poller slot. The lock is held for the whole shutdown, so a concurrent
/// caller waits for the same stop and then reads its outcome.
struct Poller {
    scheduler: Option<PollingScheduler>,
    graceful: bool,
}

impl ClientInstance {
    /// Build an instance and, in polling mode, start its poller.
    ///
    /// Polling needs a tokio runtime; calling this outside one in polling
    /// mode returns [`WeatherError::InitializationFailed`](crate::WeatherError::InitializationFailed).
    pub fn new(
        api_key: impl Into<String>,
        mode: Mode,
        fetcher: Arc<dyn WeatherFetcher>,
        config: ClientConfig,
    ) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            api_key: api_key.into(),
            cache: WeatherCache::with_config(config.cache.clone()),
            fetcher,
        });

        let scheduler = match mode {
            Mode::Polling => Some(PollingScheduler::start(
                Arc::clone(&shared),
                config.poll_interval,
            )?),
            Mode::OnDemand => None,
        };

        Ok(Self {
            shared,
            mode,
            config,
            poller: Mutex::new(Poller {
                scheduler,
                graceful: true,
            }),
        })
    }

    /// Current weather for `city` (case-insensitive).
    ///
    /// A fresh cached entry is returned without touching the network.
    /// Otherwise the fetcher is called once; its error is returned as-is and
    /// nothing is cached. Both modes behave the same here; polling only adds
    /// the background refresh.
    #[instrument(skip(self), fields(mode = %self.mode))]
    pub async fn get_current_weather(&self, city: &str) -> Result<Arc<WeatherData>> {
        if let Some(entry) = self.shared.cache.get_fresh(city) {
            return Ok(entry.into_payload());
        }
        self.shared.refresh(city, "foreground").await
    }

    /// Run one refresh pass over the cached cities now, exactly as a
    /// scheduled poll would. Works in either mode.
    pub async fn refresh_cached(&self) -> PollReport {
        polling::poll_once(&self.shared).await
    }

    /// Stop background polling. Idempotent; a no-op in on-demand mode.
    ///
    /// Signals the poller to stop, waits up to the configured grace period
    /// for an in-flight run, then aborts it. Returns `false` only when the
    /// poller had to be aborted.
    ///
    /// Callers racing a shutdown already in progress wait for it to finish
    /// and get the same result; none returns while the poller still runs.
    pub async fn shutdown_polling(&self) -> bool {
        let mut poller = self.poller.lock().await;
        if let Some(scheduler) = poller.scheduler.take() {
            poller.graceful = scheduler.shutdown(self.config.shutdown_grace).await;
            info!(
                key = %key_hint(&self.shared.api_key),
                graceful = poller.graceful,
                "polling scheduler stopped"
            );
        }
        poller.graceful
    }

    /// Dispose of background resources. Same as [`shutdown_polling()`](Self::shutdown_polling);
    /// does not unregister the instance from its registry.
    pub async fn delete(&self) {
        self.shutdown_polling().await;
    }

    pub fn api_key(&self) -> &str {
        &self.shared.api_key
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Whether a poller is currently attached. Stays `true` until an
    /// in-progress shutdown has finished.
    pub fn is_polling(&self) -> bool {
        match self.poller.try_lock() {
            Ok(poller) => poller.scheduler.is_some(),
            Err(_) => true,
        }
    }

    pub fn cache(&self) -> &WeatherCache {
        &self.shared.cache
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }
}

impl std::fmt::Debug for ClientInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientInstance")
            .field("key", &key_hint(&self.shared.api_key))
            .field("mode", &self.mode)
            .field("fetcher", &self.shared.fetcher.name())
            .finish_non_exhaustive()
    }
}

/// Last four characters of a key, for logs.
pub(super) fn key_hint(api_key: &str) -> String {
    let tail: String = api_key
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("…{tail}")
}
