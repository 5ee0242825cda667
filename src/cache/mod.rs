//! Caching subsystem.
//!
//! - [`CacheEntry`]: immutable snapshot of one fetched record plus the
//!   instant it was received.
//! - [`WeatherCache`]: bounded LRU + TTL map from normalized city name to
//!   [`CacheEntry`], shared by a client's foreground and polling paths.

mod entry;
pub mod weather;

pub use entry::CacheEntry;
pub use weather::{CacheConfig, MAX_SIZE, TTL, WeatherCache};
