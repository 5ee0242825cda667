//! Telemetry metric name constants.
//!
//! Centralised metric names for huginn operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `huginn_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).
//!
//! # Common labels
//!
//! - `status`: "ok" or "error"
//! - `reason`: why an entry was evicted, "lru" or "ttl"
//! - `source`: what triggered a fetch, "foreground" or "poll"

/// Cache lookups that returned a fresh entry.
pub const CACHE_HITS_TOTAL: &str = "huginn_cache_hits_total";

/// Cache lookups that found nothing usable (absent or stale).
pub const CACHE_MISSES_TOTAL: &str = "huginn_cache_misses_total";

/// Entries dropped from the cache.
///
/// Labels: `reason` ("lru" | "ttl").
pub const CACHE_EVICTIONS_TOTAL: &str = "huginn_cache_evictions_total";

/// Remote fetches performed.
///
/// Labels: `source`, `status` ("ok" | "error").
pub const FETCHES_TOTAL: &str = "huginn_fetches_total";

/// Remote fetch duration in seconds.
///
/// Labels: `source`.
pub const FETCH_DURATION_SECONDS: &str = "huginn_fetch_duration_seconds";

/// Completed background poll runs.
pub const POLL_RUNS_TOTAL: &str = "huginn_poll_runs_total";

/// Per-city refresh failures inside background poll runs.
pub const POLL_FAILURES_TOTAL: &str = "huginn_poll_failures_total";
