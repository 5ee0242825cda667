//! Per-key instance registry (multiton).
//!
//! [`InstanceRegistry`] guarantees at most one live [`ClientInstance`] per
//! API key. It is an ordinary value: create one at process start, share it
//! (`Arc` or a `static`), and call [`InstanceRegistry::shutdown()`] on exit.
//! Tests build their own registries, so nothing leaks between them.
//!
//! # Re-acquiring with a different mode
//!
//! The mode passed to [`get_instance()`](InstanceRegistry::get_instance) only
//! matters when an instance is created. If one already exists for the key it
//! is returned unchanged and the requested mode is **silently ignored**, no
//! error and no log line. Callers can rely on idempotent re-acquisition, but
//! switching a key from on-demand to polling (or back) requires
//! [`release_instance()`](InstanceRegistry::release_instance) first.

mod builder;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

pub use builder::RegistryBuilder;

use crate::client::{ClientConfig, ClientInstance};
use crate::fetcher::FetcherFactory;
use crate::types::Mode;
use crate::{Result, WeatherError};

/// Registry of client instances keyed by API key.
pub struct InstanceRegistry {
    instances: RwLock<HashMap<String, Arc<ClientInstance>>>,
    factory: Arc<dyn FetcherFactory>,
    config: ClientConfig,
}

impl InstanceRegistry {
    /// Registry using the OpenWeatherMap fetcher and default settings.
    pub fn new() -> Result<Self> {
        RegistryBuilder::new().build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    pub(crate) fn from_parts(factory: Arc<dyn FetcherFactory>, config: ClientConfig) -> Self {
        Self {
            instances: RwLock::new(HashMap::new()),
            factory,
            config,
        }
    }

    /// Get the instance for `api_key`, creating it with `mode` if absent.
    ///
    /// Get-or-create is atomic: concurrent callers racing on a new key all
    /// receive the same instance and exactly one is constructed. If an
    /// instance already exists, `mode` is ignored (see module docs).
    ///
    /// # Errors
    ///
    /// - [`WeatherError::InvalidCredential`] for an empty or blank key.
    /// - [`WeatherError::InitializationFailed`] if the fetcher or the
    ///   instance cannot be built, or if a panic during an earlier
    ///   construction poisoned the registry lock. Nothing is registered in
    ///   that case.
    pub fn get_instance(&self, api_key: &str, mode: Mode) -> Result<Arc<ClientInstance>> {
        if api_key.trim().is_empty() {
            return Err(WeatherError::InvalidCredential(
                "API key cannot be empty".to_string(),
            ));
        }

        // Fast path: already registered (read lock)
        {
            let instances = self.instances.read().map_err(|e| {
                WeatherError::InitializationFailed(format!("Failed to acquire read lock: {e}"))
            })?;

            if let Some(existing) = instances.get(api_key) {
                debug!(mode = %existing.mode(), "reusing registered client instance");
                return Ok(Arc::clone(existing));
            }
        }

        // Slow path: construct under the write lock
        let mut instances = self.instances.write().map_err(|e| {
            WeatherError::InitializationFailed(format!("Failed to acquire write lock: {e}"))
        })?;

        // Double-check after acquiring write lock
        if let Some(existing) = instances.get(api_key) {
            debug!(mode = %existing.mode(), "reusing registered client instance");
            return Ok(Arc::clone(existing));
        }

        let instance = self.construct(api_key, mode)?;
        instances.insert(api_key.to_string(), Arc::clone(&instance));
        info!(%mode, "registered client instance");
        Ok(instance)
    }

    /// Unregister the instance for `api_key` and stop its poller.
    ///
    /// A no-op for unknown keys. Returns once the poller has stopped or the
    /// grace period has passed and it was aborted.
    pub async fn release_instance(&self, api_key: &str) {
        let removed = self.write().remove(api_key);
        if let Some(instance) = removed {
            instance.shutdown_polling().await;
            info!(mode = %instance.mode(), "released client instance");
        }
    }

    /// Release every registered instance.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.write().drain().map(|(_, instance)| instance).collect();
        for instance in drained {
            instance.shutdown_polling().await;
        }
    }

    pub fn contains(&self, api_key: &str) -> bool {
        self.read().contains_key(api_key)
    }

    /// Number of registered instances.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn client_config(&self) -> &ClientConfig {
        &self.config
    }

    fn construct(&self, api_key: &str, mode: Mode) -> Result<Arc<ClientInstance>> {
        let fetcher = self.factory.create(api_key).map_err(initialization_failure)?;
        let instance = ClientInstance::new(api_key, mode, fetcher, self.config.clone())
            .map_err(initialization_failure)?;
        Ok(Arc::new(instance))
    }

    // Accessors that cannot fail keep working after a panic poisoned the lock.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ClientInstance>>> {
        self.instances.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ClientInstance>>> {
        self.instances.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// Every construction-time failure is reported as `InitializationFailed`.
fn initialization_failure(err: WeatherError) -> WeatherError {
    match err {
        WeatherError::InitializationFailed(_) => err,
        other => WeatherError::InitializationFailed(other.to_string()),
    }
}
