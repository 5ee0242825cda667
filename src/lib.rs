//! huginn - cached weather-by-city client
//!
//! Wraps the OpenWeatherMap current-weather API behind a small, bounded,
//! time-limited cache. Clients are handed out per API key by an
//! [`InstanceRegistry`], so a process never runs two clients (or two
//! background pollers) for the same key.
//!
//! - [`Mode::OnDemand`] fetches only when a lookup misses the cache.
//! - [`Mode::Polling`] additionally refreshes every cached city in the
//!   background, so lookups stay fast.
//!
//! # Example
//!
//! ```rust,no_run
//! use huginn::{InstanceRegistry, Mode};
//!
//! #[tokio::main]
//! async fn main() -> huginn::Result<()> {
//!     let registry = InstanceRegistry::new()?;
//!     let client = registry.get_instance("your-api-key", Mode::Polling)?;
//!
//!     let weather = client.get_current_weather("Zocca").await?;
//!     if let Some(condition) = weather.condition() {
//!         println!("{}: {}", weather.name, condition.description);
//!     }
//!
//!     registry.release_instance("your-api-key").await;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod registry;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use cache::{CacheConfig, CacheEntry, WeatherCache};
pub use client::{ClientConfig, ClientInstance, PollReport};
pub use error::{RemoteError, Result, WeatherError};
pub use fetcher::{FetcherFactory, OpenWeatherClient, WeatherFetcher};
pub use registry::{InstanceRegistry, RegistryBuilder};
pub use types::{Condition, Mode, SunTimes, Temperature, WeatherData, Wind};

/// Package version from Cargo.toml.
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");
