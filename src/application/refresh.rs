// Refresh driver - Tick counting, scheduled cache maintenance and the polling loop
use crate::application::dashboard_service::DashboardService;
use crate::application::result_cache::ResultCache;
use crate::application::session::{SessionContext, TickOutcome};
use serde::Deserialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

pub const DEFAULT_CLEAR_EVERY: u64 = 10;

/// How re-renders are triggered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshStrategy {
    /// The page asks for a re-render on a timer; each timed render is a tick.
    #[default]
    Cooperative,
    /// A background loop renders, ticks and sleeps, forever.
    Blocking,
    /// Manual reload only.
    Disabled,
}

impl fmt::Display for RefreshStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RefreshStrategy::Cooperative => "cooperative",
            RefreshStrategy::Blocking => "blocking",
            RefreshStrategy::Disabled => "disabled",
        };
        f.write_str(name)
    }
}

pub struct RefreshDriver {
    strategy: RefreshStrategy,
    clear_every: u64,
    cache: Arc<ResultCache>,
    ticks: AtomicU64,
    clears: AtomicU64,
}

impl RefreshDriver {
    pub fn new(strategy: RefreshStrategy, clear_every: u64, cache: Arc<ResultCache>) -> Self {
        Self {
            strategy,
            clear_every,
            cache,
            ticks: AtomicU64::new(0),
            clears: AtomicU64::new(0),
        }
    }

    pub fn strategy(&self) -> RefreshStrategy {
        self.strategy
    }

    pub fn count(&self) -> u64 {
        self.ticks.load(Ordering::SeqCst)
    }

    /// How many times scheduled maintenance has emptied the cache.
    pub fn clears(&self) -> u64 {
        self.clears.load(Ordering::SeqCst)
    }

    /// Advance the counter by one cycle. Every `clear_every`-th cycle
    /// (never cycle 0) empties the result cache.
    pub fn tick(&self) -> TickOutcome {
        let count = self.ticks.fetch_add(1, Ordering::SeqCst) + 1;
        let cache_cleared = self.clear_every > 0 && count % self.clear_every == 0;

        if cache_cleared {
            let dropped = self.cache.clear();
            let clears = self.clears.fetch_add(1, Ordering::SeqCst) + 1;
            tracing::info!(
                "Refresh #{}: cache cleared ({} entries dropped, {} clears so far)",
                count,
                dropped,
                clears
            );
        } else {
            tracing::debug!("Refresh #{}", count);
        }

        TickOutcome {
            count,
            cache_cleared,
        }
    }
}

/// Render, tick, sleep; repeat until `shutdown` is notified.
///
/// Each pass works on a snapshot of the session so clicks handled between
/// passes show up on the next one.
pub async fn run_blocking_loop(
    driver: Arc<RefreshDriver>,
    service: DashboardService,
    session: Arc<Mutex<SessionContext>>,
    interval: Duration,
    shutdown: Arc<Notify>,
) {
    tracing::info!("Starting blocking refresh loop every {:?}", interval);

    loop {
        let snapshot = session.lock().await.clone();
        let view = service.render(&snapshot).await;
        tracing::info!(
            "Rendered dashboard: {} devices, {} active, {} alerts, {} notices",
            view.chart.as_ref().map(|c| c.bars.len()).unwrap_or(0),
            view.metrics.active_devices,
            view.alerts.len(),
            view.notices.len()
        );
        for notice in &view.notices {
            tracing::warn!("{}", notice.message);
        }

        let outcome = driver.tick();
        session.lock().await.last_tick = outcome;

        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            _ = shutdown.notified() => {
                tracing::info!("Blocking refresh loop stopped after {} cycles", driver.count());
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::result_cache::tests::{device, FakeFleetApi};
    use crate::application::result_cache::{CacheKey, CacheTtls, CachedFleetApi, CachedValue};
    use crate::domain::fleet::DeviceStatus;
    use crate::domain::selection::CLICK_TOLERANCE_DEG;

    #[test]
    fn test_clear_fires_once_in_ten_ticks() {
        let cache = Arc::new(ResultCache::new());
        let driver = RefreshDriver::new(RefreshStrategy::Cooperative, DEFAULT_CLEAR_EVERY, cache.clone());

        for cycle in 1..=10 {
            cache.insert(CacheKey::Locations, CachedValue::Locations(Arc::new(Vec::new())));
            let outcome = driver.tick();
            assert_eq!(outcome.count, cycle);
            assert_eq!(outcome.cache_cleared, cycle == 10);
        }

        assert_eq!(driver.clears(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear_repeats_every_tenth_tick() {
        let driver = RefreshDriver::new(RefreshStrategy::Blocking, DEFAULT_CLEAR_EVERY, Arc::new(ResultCache::new()));
        let cleared: Vec<u64> = (0..35)
            .map(|_| driver.tick())
            .filter(|o| o.cache_cleared)
            .map(|o| o.count)
            .collect();
        assert_eq!(cleared, vec![10, 20, 30]);
    }

    #[test]
    fn test_zero_clear_interval_never_clears() {
        let driver = RefreshDriver::new(RefreshStrategy::Cooperative, 0, Arc::new(ResultCache::new()));
        for _ in 0..20 {
            assert!(!driver.tick().cache_cleared);
        }
    }

    #[test]
    fn test_strategy_from_config_value() {
        #[derive(Deserialize)]
        struct Wrapper {
            mode: RefreshStrategy,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"mode":"blocking"}"#).unwrap();
        assert_eq!(parsed.mode, RefreshStrategy::Blocking);
        assert_eq!(RefreshStrategy::Disabled.to_string(), "disabled");
    }

    #[tokio::test(start_paused = true)]
    async fn test_blocking_loop_cadence() {
        let fake = Arc::new(FakeFleetApi::with_devices(vec![device(1, DeviceStatus::Online, 2)]));
        let cache = Arc::new(ResultCache::new());
        let api = CachedFleetApi::new(fake.clone(), cache.clone(), CacheTtls::default());
        let service = DashboardService::new(api, 3, CLICK_TOLERANCE_DEG);
        let driver = Arc::new(RefreshDriver::new(RefreshStrategy::Blocking, DEFAULT_CLEAR_EVERY, cache));
        let session = Arc::new(Mutex::new(SessionContext::default()));
        let shutdown = Arc::new(Notify::new());

        let handle = tokio::spawn(run_blocking_loop(
            driver.clone(),
            service,
            session.clone(),
            Duration::from_secs(10),
            shutdown.clone(),
        ));

        // passes at t = 0, 10, ..., 90
        tokio::time::sleep(Duration::from_secs(95)).await;
        assert_eq!(driver.count(), 10);
        assert_eq!(driver.clears(), 1);
        assert_eq!(session.lock().await.last_tick.count, 10);

        shutdown.notify_one();
        handle.await.unwrap();
        assert_eq!(driver.count(), 10);
    }
}
