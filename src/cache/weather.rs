//! Bounded, TTL-expiring weather cache keyed by city name.
//!
//! Two independent eviction forces apply:
//!
//! - **TTL**, checked on read: a stale entry is removed and reported absent,
//!   however often it was used.
//! - **LRU**, applied on write: when an insert pushes the cache over its
//!   bound, the least recently accessed entry is dropped, however fresh.
//!
//! City names are lower-cased before use, so lookups are case-insensitive.
//! Blank names never match anything and are never stored.
//!
//! # Recency index
//!
//! Every access stamps the entry with a monotonically increasing counter and
//! records `stamp → key` in a `BTreeMap`. The smallest stamp is always the
//! least recently used key, so eviction is a `pop_first`.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use super::CacheEntry;
use crate::telemetry;
use crate::types::WeatherData;

/// Default bound on the number of cached cities.
pub const MAX_SIZE: usize = 10;

/// Default entry lifetime.
pub const TTL: Duration = Duration::from_secs(10 * 60);

/// Configuration for a [`WeatherCache`].
///
/// ```rust
/// # use huginn::CacheConfig;
/// # use std::time::Duration;
/// let config = CacheConfig::new()
///     .max_entries(25)
///     .ttl(Duration::from_secs(300));
/// assert_eq!(config.max_entries, 25);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of cached cities. Default: 10.
    pub max_entries: usize,
    /// How long an entry stays fresh. Default: 10 minutes.
    pub ttl: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: MAX_SIZE,
            ttl: TTL,
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of cached cities.
    pub fn max_entries(mut self, n: usize) -> Self {
        self.max_entries = n;
        self
    }

    /// Set how long an entry stays fresh.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }
}

struct Slot {
    entry: CacheEntry,
    stamp: u64,
}

#[derive(Default)]
struct LruState {
    entries: HashMap<String, Slot>,
    recency: BTreeMap<u64, String>,
    tick: u64,
}

impl LruState {
    fn next_stamp(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Mark `key` most recently used and hand back its entry.
    fn promote(&mut self, key: &str) -> Option<CacheEntry> {
        let stamp = self.next_stamp();
        let slot = self.entries.get_mut(key)?;
        self.recency.remove(&slot.stamp);
        slot.stamp = stamp;
        self.recency.insert(stamp, key.to_string());
        Some(slot.entry.clone())
    }

    fn insert(&mut self, key: String, entry: CacheEntry) {
        let stamp = self.next_stamp();
        if let Some(old) = self.entries.insert(key.clone(), Slot { entry, stamp }) {
            self.recency.remove(&old.stamp);
        }
        self.recency.insert(stamp, key);
    }

    fn remove(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(slot) => {
                self.recency.remove(&slot.stamp);
                true
            }
            None => false,
        }
    }

    fn evict_lru(&mut self) -> Option<String> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Thread-safe LRU + TTL cache of [`WeatherData`] keyed by city.
///
/// Shared between the foreground lookup path and the background poller of a
/// single client. All operations take one internal lock, so size and
/// ordering invariants hold under concurrent use.
pub struct WeatherCache {
    state: Mutex<LruState>,
    config: CacheConfig,
}

impl WeatherCache {
    /// Create an empty cache with the default bound (10) and TTL (10 min).
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            state: Mutex::new(LruState::default()),
            config,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Look up a fresh entry for `city`.
    ///
    /// A hit counts as a use for LRU ordering. A stale entry is removed and
    /// reported as `None`.
    pub fn get_fresh(&self, city: &str) -> Option<CacheEntry> {
        let Some(key) = normalize(city) else {
            metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
            return None;
        };
        let now = Instant::now();

        let mut state = self.lock();
        let fresh = state
            .entries
            .get(&key)
            .map(|slot| slot.entry.is_fresh_at(now, self.config.ttl));

        match fresh {
            Some(true) => {
                metrics::counter!(telemetry::CACHE_HITS_TOTAL).increment(1);
                state.promote(&key)
            }
            Some(false) => {
                state.remove(&key);
                debug!(city = %key, "dropped stale cache entry");
                metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => "ttl").increment(1);
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
            None => {
                metrics::counter!(telemetry::CACHE_MISSES_TOTAL).increment(1);
                None
            }
        }
    }

    /// Store `payload` for `city`, stamped now, replacing any previous entry.
    ///
    /// Counts as a use. If the cache grows past its bound, the least recently
    /// used entry is dropped without notice.
    pub fn put(&self, city: &str, payload: Arc<WeatherData>) {
        let Some(key) = normalize(city) else {
            debug!("ignoring cache insert for blank city name");
            return;
        };
        let entry = CacheEntry::new(payload, Instant::now());

        let mut state = self.lock();
        state.insert(key, entry);
        while state.entries.len() > self.config.max_entries {
            match state.evict_lru() {
                Some(evicted) => {
                    debug!(city = %evicted, "evicted least recently used cache entry");
                    metrics::counter!(telemetry::CACHE_EVICTIONS_TOTAL, "reason" => "lru")
                        .increment(1);
                }
                None => break,
            }
        }
    }

    /// Number of entries currently held, stale ones included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the cached (normalized) city names, least recently used
    /// first. Later changes to the cache do not affect the returned list.
    pub fn keys(&self) -> Vec<String> {
        self.lock().recency.values().cloned().collect()
    }

    fn lock(&self) -> MutexGuard<'_, LruState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for WeatherCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Case-fold a city name. Blank names have no key.
fn normalize(city: &str) -> Option<String> {
    if city.trim().is_empty() {
        None
    } else {
        Some(city.to_lowercase())
    }
}
