//! Configuration file loading.
//!
//! Configuration is loaded from a TOML file with the following resolution
//! order:
//! 1. `--config <path>` (explicit path; must exist)
//! 2. `~/.huginn/config.toml` (user; optional)
//! 3. built-in defaults
//!
//! The API key is deliberately not part of the file. The CLI takes it from
//! `--api-key` or the `OPENWEATHER_API_KEY` environment variable.
//!
//! ```toml
//! [client]
//! mode = "polling"
//!
//! [cache]
//! max_entries = 10
//! ttl_secs = 600
//!
//! [polling]
//! interval_secs = 600
//! shutdown_grace_secs = 5
//!
//! [api]
//! base_url = "https://api.openweathermap.org"
//! timeout_secs = 30
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cache::CacheConfig;
use crate::client::ClientConfig;
use crate::fetcher::DEFAULT_BASE_URL;
use crate::registry::RegistryBuilder;
use crate::types::Mode;
use crate::{Result, WeatherError};

/// Environment variable consulted for the API key.
pub const API_KEY_ENV: &str = "OPENWEATHER_API_KEY";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub client: ClientSection,
    #[serde(default)]
    pub cache: CacheSection,
    #[serde(default)]
    pub polling: PollingSection,
    #[serde(default)]
    pub api: ApiSection,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientSection {
    /// Mode for newly created instances (default: on_demand).
    #[serde(default)]
    pub mode: Mode,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CacheSection {
    /// Maximum cached cities (default: 10).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    /// Entry lifetime in seconds (default: 600).
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

fn default_max_entries() -> usize {
    10
}

fn default_ttl_secs() -> u64 {
    600
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PollingSection {
    /// Delay between poll runs in seconds (default: 600).
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Grace period for stopping the poller in seconds (default: 5).
    #[serde(default = "default_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for PollingSection {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            shutdown_grace_secs: default_grace_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    600
}

fn default_grace_secs() -> u64 {
    5
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiSection {
    /// API base URL (default: https://api.openweathermap.org).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// An explicit path that does not exist is an error; a missing user
    /// config file is not.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::resolve_config_path(explicit_path)? {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            WeatherError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content).map_err(|e| {
            WeatherError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| WeatherError::Configuration(e.to_string()))
    }

    /// `~/.huginn/config.toml`, if a home directory is known.
    pub fn user_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".huginn").join("config.toml"))
    }

    fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(Some(path.to_path_buf()));
            }
            return Err(WeatherError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Ok(Self::user_config_path().filter(|path| path.exists()))
    }

    /// Per-instance settings described by this file.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .cache(
                CacheConfig::new()
                    .max_entries(self.cache.max_entries)
                    .ttl(Duration::from_secs(self.cache.ttl_secs)),
            )
            .poll_interval(Duration::from_secs(self.polling.interval_secs))
            .shutdown_grace(Duration::from_secs(self.polling.shutdown_grace_secs))
    }

    /// A registry builder preconfigured from this file.
    pub fn registry_builder(&self) -> RegistryBuilder {
        RegistryBuilder::new()
            .base_url(&self.api.base_url)
            .request_timeout(Duration::from_secs(self.api.timeout_secs))
            .client_config(self.client_config())
    }
}
