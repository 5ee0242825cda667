use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use crate::types::WeatherData;

/// Immutable snapshot of one fetched record and the moment it arrived.
///
/// A new entry is created on every successful fetch; entries are never
/// updated in place, so any entry a reader holds is complete.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    payload: Arc<WeatherData>,
    received_at: Instant,
}

impl CacheEntry {
    pub(crate) fn new(payload: Arc<WeatherData>, received_at: Instant) -> Self {
        Self {
            payload,
            received_at,
        }
    }

    pub fn payload(&self) -> &Arc<WeatherData> {
        &self.payload
    }

    pub fn into_payload(self) -> Arc<WeatherData> {
        self.payload
    }

    pub fn received_at(&self) -> Instant {
        self.received_at
    }

    /// Fresh iff strictly younger than `ttl` at `now`.
    pub fn is_fresh_at(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.received_at) < ttl
    }
}
