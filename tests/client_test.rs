//! Tests for [`ClientInstance`]: cache-then-fetch lookups, background
//! polling and shutdown.
//!
//! Polling tests run on a paused tokio clock, so "ten minutes" pass
//! instantly and deterministically.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use huginn::{
    CacheConfig, ClientConfig, ClientInstance, Mode, RemoteError, WeatherData, WeatherError,
    WeatherFetcher,
};

// ============================================================================
// Mock fetchers
// ============================================================================

/// Counts calls; fails on the listed (1-based) call numbers. Successful
/// payloads carry the call number in `datetime` so refreshes are visible.
struct ScriptedFetcher {
    calls: AtomicUsize,
    fail_on: Vec<usize>,
    delay: Option<Duration>,
}

impl ScriptedFetcher {
    fn ok() -> Arc<Self> {
        Self::failing_on(vec![])
    }

    fn failing_on(fail_on: Vec<usize>) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on,
            delay: None,
        })
    }

    /// Every call after the first takes `delay`.
    fn slow_after_first(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            fail_on: vec![],
            delay: Some(delay),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WeatherFetcher for ScriptedFetcher {
    async fn fetch(&self, _api_key: &str, city: &str) -> Result<WeatherData, RemoteError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(delay) = self.delay {
            if call > 1 {
                tokio::time::sleep(delay).await;
            }
        }
        if self.fail_on.contains(&call) {
            return Err(RemoteError::Http(format!("connection reset (call {call})")));
        }
        let mut data = WeatherData::named(city);
        data.datetime = call as i64;
        Ok(data)
    }
}

const INTERVAL: Duration = Duration::from_secs(60);

/// Short poll interval, long TTL: entries stay fresh across several runs.
fn polling_config() -> ClientConfig {
    ClientConfig::new()
        .cache(CacheConfig::new().ttl(Duration::from_secs(3600)))
        .poll_interval(INTERVAL)
}

fn on_demand(fetcher: Arc<ScriptedFetcher>) -> ClientInstance {
    ClientInstance::new("test-key", Mode::OnDemand, fetcher, ClientConfig::default()).unwrap()
}

// ============================================================================
// Foreground lookups
// ============================================================================

#[tokio::test]
async fn empty_cache_calls_fetcher() {
    let fetcher = ScriptedFetcher::ok();
    let client = on_demand(fetcher.clone());

    let weather = client.get_current_weather("Zocca").await.unwrap();
    assert_eq!(weather.name, "Zocca");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn cache_hit_does_not_call_fetcher() {
    let fetcher = ScriptedFetcher::ok();
    let client = on_demand(fetcher.clone());

    let first = client.get_current_weather("Zocca").await.unwrap();
    let second = client.get_current_weather("Zocca").await.unwrap();

    assert_eq!(fetcher.calls(), 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[tokio::test]
async fn lookups_are_case_insensitive() {
    let fetcher = ScriptedFetcher::ok();
    let client = on_demand(fetcher.clone());

    client.get_current_weather("Paris").await.unwrap();
    let weather = client.get_current_weather("PARIS").await.unwrap();

    assert_eq!(weather.name, "Paris");
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn fetch_failure_propagates_and_caches_nothing() {
    let fetcher = ScriptedFetcher::failing_on(vec![1]);
    let client = on_demand(fetcher.clone());

    let err = client.get_current_weather("Zocca").await.unwrap_err();
    assert!(matches!(err, WeatherError::Remote(RemoteError::Http(_))));
    assert!(client.cache().is_empty());
    assert_eq!(fetcher.calls(), 1);

    // No automatic retry happened; the next call fetches again and succeeds.
    client.get_current_weather("Zocca").await.unwrap();
    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test]
async fn eleventh_city_evicts_the_first() {
    let client = on_demand(ScriptedFetcher::ok());

    for i in 0..11 {
        client.get_current_weather(&format!("City{i}")).await.unwrap();
    }

    assert_eq!(client.cache().len(), 10);
    assert!(client.cache().get_fresh("city0").is_none());
    assert!(client.cache().get_fresh("city1").is_some());
}

#[tokio::test(start_paused = true)]
async fn stale_entry_is_refetched() {
    let fetcher = ScriptedFetcher::ok();
    let client = on_demand(fetcher.clone());

    client.get_current_weather("Zocca").await.unwrap();
    tokio::time::advance(Duration::from_secs(10 * 60)).await;
    let weather = client.get_current_weather("Zocca").await.unwrap();

    assert_eq!(fetcher.calls(), 2);
    assert_eq!(weather.datetime, 2);
}

#[tokio::test]
async fn polling_lookups_use_the_cache_too() {
    let fetcher = ScriptedFetcher::ok();
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();

    client.get_current_weather("Zocca").await.unwrap();
    client.get_current_weather("Zocca").await.unwrap();
    assert_eq!(fetcher.calls(), 1);

    client.shutdown_polling().await;
}

// ============================================================================
// Background polling
// ============================================================================

#[tokio::test]
async fn polling_instance_starts_with_scheduler_running() {
    let client = ClientInstance::new(
        "test-key",
        Mode::Polling,
        ScriptedFetcher::ok(),
        polling_config(),
    )
    .unwrap();

    assert!(client.is_polling());
    assert_eq!(client.mode(), Mode::Polling);
    client.shutdown_polling().await;
}

#[tokio::test(start_paused = true)]
async fn first_poll_waits_a_full_interval() {
    let fetcher = ScriptedFetcher::ok();
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();
    client.get_current_weather("Oslo").await.unwrap();

    tokio::time::sleep(INTERVAL - Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 1, "no poll before the first interval");

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(fetcher.calls(), 2, "exactly one poll after the first interval");

    client.shutdown_polling().await;
}

#[tokio::test(start_paused = true)]
async fn poll_refreshes_every_cached_city() {
    let fetcher = ScriptedFetcher::ok();
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();
    for city in ["Oslo", "Bergen", "Tromsø"] {
        client.get_current_weather(city).await.unwrap();
    }

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(fetcher.calls(), 6);
    for city in ["oslo", "bergen", "tromsø"] {
        let entry = client.cache().get_fresh(city).unwrap();
        assert!(entry.payload().datetime > 3, "{city} was not refreshed");
    }

    client.shutdown_polling().await;
}

#[tokio::test(start_paused = true)]
async fn poll_failure_leaves_entry_and_keeps_loop_running() {
    // Call 1: foreground fill. Call 2: first poll, fails. Call 3: second poll.
    let fetcher = ScriptedFetcher::failing_on(vec![2]);
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();
    client.get_current_weather("Zocca").await.unwrap();
    let filled_at = client.cache().get_fresh("zocca").unwrap().received_at();

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 2);
    let entry = client.cache().get_fresh("zocca").unwrap();
    assert_eq!(entry.payload().datetime, 1, "failed poll must not replace the entry");
    assert_eq!(entry.received_at(), filled_at);
    assert!(client.is_polling());

    tokio::time::sleep(INTERVAL).await;
    assert_eq!(fetcher.calls(), 3);
    let entry = client.cache().get_fresh("zocca").unwrap();
    assert_eq!(entry.payload().datetime, 3);
    assert!(entry.received_at() > filled_at);

    client.shutdown_polling().await;
}

#[tokio::test(start_paused = true)]
async fn one_failing_city_does_not_abort_the_run() {
    // Calls 1-3 fill the cache; the poll fetches 4, 5, 6 and call 4 fails.
    let fetcher = ScriptedFetcher::failing_on(vec![4]);
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();
    for city in ["a", "b", "c"] {
        client.get_current_weather(city).await.unwrap();
    }

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert_eq!(fetcher.calls(), 6);
    let refreshed = ["a", "b", "c"]
        .iter()
        .filter(|city| client.cache().get_fresh(city).unwrap().payload().datetime > 3)
        .count();
    assert_eq!(refreshed, 2);

    client.shutdown_polling().await;
}

#[tokio::test(start_paused = true)]
async fn on_demand_instance_never_polls() {
    let fetcher = ScriptedFetcher::ok();
    let client = ClientInstance::new(
        "test-key",
        Mode::OnDemand,
        fetcher.clone(),
        polling_config(),
    )
    .unwrap();
    client.get_current_weather("Oslo").await.unwrap();

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn refresh_cached_reports_failures() {
    let fetcher = ScriptedFetcher::failing_on(vec![3]);
    let client = on_demand(fetcher.clone());
    client.get_current_weather("a").await.unwrap();
    client.get_current_weather("b").await.unwrap();

    let report = client.refresh_cached().await;
    assert_eq!(report.refreshed, 1);
    assert_eq!(report.failed, 1);
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test(start_paused = true)]
async fn shutdown_stops_future_polls() {
    let fetcher = ScriptedFetcher::ok();
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();
    client.get_current_weather("Oslo").await.unwrap();

    assert!(client.shutdown_polling().await);
    assert!(!client.is_polling());

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test]
async fn shutdown_twice_is_harmless() {
    let client = ClientInstance::new(
        "test-key",
        Mode::Polling,
        ScriptedFetcher::ok(),
        polling_config(),
    )
    .unwrap();

    assert!(client.shutdown_polling().await);
    assert!(!client.is_polling());
    assert!(client.shutdown_polling().await);
    assert!(!client.is_polling());
}

#[tokio::test]
async fn delete_on_demand_instance_is_a_noop() {
    let client = on_demand(ScriptedFetcher::ok());
    client.delete().await;
    client.delete().await;
    assert!(!client.is_polling());
}

#[tokio::test]
async fn lookups_still_work_after_delete() {
    let fetcher = ScriptedFetcher::ok();
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();
    client.delete().await;

    let weather = client.get_current_weather("Zocca").await.unwrap();
    assert_eq!(weather.name, "Zocca");
    assert!(!client.is_polling(), "lookups must not restart polling");
}

#[tokio::test(start_paused = true)]
async fn shutdown_waits_for_in_flight_run() {
    // Poll fetches take 2s; the grace period (5s) is long enough.
    let fetcher = ScriptedFetcher::slow_after_first(Duration::from_secs(2));
    let client =
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap();
    client.get_current_weather("Oslo").await.unwrap();

    // Land inside the first poll run.
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 2);

    assert!(client.shutdown_polling().await, "run should finish within grace");
    let entry = client.cache().get_fresh("oslo").unwrap();
    assert_eq!(entry.payload().datetime, 2, "in-flight refresh completed");
}

#[tokio::test(start_paused = true)]
async fn shutdown_aborts_run_exceeding_grace() {
    let fetcher = ScriptedFetcher::slow_after_first(Duration::from_secs(3600));
    let client = ClientInstance::new(
        "test-key",
        Mode::Polling,
        fetcher.clone(),
        polling_config().shutdown_grace(Duration::from_secs(5)),
    )
    .unwrap();
    client.get_current_weather("Oslo").await.unwrap();

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 2);

    let started = tokio::time::Instant::now();
    assert!(!client.shutdown_polling().await, "hung run must be aborted");
    assert!(started.elapsed() >= Duration::from_secs(5));
    assert!(started.elapsed() < Duration::from_secs(3600));
    assert!(!client.is_polling());

    // The aborted refresh never landed.
    let entry = client.cache().get_fresh("oslo").unwrap();
    assert_eq!(entry.payload().datetime, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_shutdown_waits_for_the_same_stop() {
    let fetcher = ScriptedFetcher::slow_after_first(Duration::from_secs(3));
    let client = Arc::new(
        ClientInstance::new("test-key", Mode::Polling, fetcher.clone(), polling_config()).unwrap(),
    );
    client.get_current_weather("Oslo").await.unwrap();

    // Land inside the first poll run; its fetch completes at INTERVAL + 3s.
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(fetcher.calls(), 2);

    let first = tokio::spawn({
        let client = Arc::clone(&client);
        async move { client.shutdown_polling().await }
    });
    tokio::task::yield_now().await;
    assert!(client.is_polling(), "still stopping");

    let second = client.shutdown_polling().await;
    let entry = client.cache().get_fresh("oslo").unwrap();
    assert_eq!(entry.payload().datetime, 2, "in-flight run finished before return");
    assert!(second);
    assert!(!client.is_polling());

    assert!(first.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn later_shutdown_reports_an_earlier_abort() {
    let client = ClientInstance::new(
        "test-key",
        Mode::Polling,
        ScriptedFetcher::slow_after_first(Duration::from_secs(3600)),
        polling_config().shutdown_grace(Duration::from_secs(1)),
    )
    .unwrap();
    client.get_current_weather("Oslo").await.unwrap();
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;

    assert!(!client.shutdown_polling().await);
    assert!(!client.shutdown_polling().await);
}
