//! Background refresh of cached cities.
//!
//! One tokio task per polling instance. The task sleeps a full interval,
//! refreshes every city in a snapshot of the cache keys, and sleeps again:
//! a fixed delay between completions, never an immediate first run.
//!
//! Stopping is cooperative first (a `watch` flag checked between runs) and
//! forced second (`abort`) once the grace period runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::instance::Shared;
use crate::{Result, WeatherError, telemetry};

/// Outcome of one refresh pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Cities fetched and stored successfully.
    pub refreshed: usize,
    /// Cities whose fetch failed; their previous entry was left in place.
    pub failed: usize,
}

/// Refresh every city currently cached, one after another.
///
/// The key set is copied up front because foreground lookups and evictions
/// keep changing the cache while the run is in progress. A failing city is
/// logged and skipped; it never ends the run.
pub(super) async fn poll_once(shared: &Shared) -> PollReport {
    let cities = shared.cache().keys();
    info!(count = cities.len(), "polling cached cities");

    let mut report = PollReport::default();
    for city in &cities {
        match shared.refresh(city, "poll").await {
            Ok(_) => {
                report.refreshed += 1;
                debug!(city = %city, "refreshed cached weather");
            }
            Err(e) => {
                report.failed += 1;
                metrics::counter!(telemetry::POLL_FAILURES_TOTAL).increment(1);
                warn!(city = %city, error = %e, "polling refresh failed");
            }
        }
    }

    metrics::counter!(telemetry::POLL_RUNS_TOTAL).increment(1);
    report
}

/// Handle to a running poll task.
///
/// Dropping the handle aborts the task.
pub(super) struct PollingScheduler {
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollingScheduler {
    /// Spawn the poll loop on the current tokio runtime.
    pub(super) fn start(shared: Arc<Shared>, interval: Duration) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            WeatherError::InitializationFailed(format!("polling requires a tokio runtime: {e}"))
        })?;

        let (stop, stop_rx) = watch::channel(false);
        let task = runtime.spawn(run(shared, interval, stop_rx));
        debug!(?interval, "polling scheduler started");

        Ok(Self { stop, task })
    }

    /// Ask the loop to stop, wait up to `grace`, then abort.
    ///
    /// Returns `true` if the loop exited on its own.
    pub(super) async fn shutdown(mut self, grace: Duration) -> bool {
        // Receiver gone means the task already ended.
        let _ = self.stop.send(true);

        match tokio::time::timeout(grace, &mut self.task).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(error = %e, "polling task ended abnormally");
                true
            }
            Err(_) => {
                warn!(?grace, "polling run did not finish within grace period, aborting");
                self.task.abort();
                false
            }
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(shared: Arc<Shared>, interval: Duration, mut stop: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            biased;
            // Fires on a stop request or when the sender is dropped.
            _ = stop.changed() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        poll_once(&shared).await;
    }
    debug!("polling loop exited");
}
