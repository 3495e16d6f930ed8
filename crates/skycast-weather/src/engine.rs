//! Forecast refresh engine.
//!
//! Fetches a forecast whenever the location changes and on a recurring timer.
//! Results land in the shared [`WeatherContext`].

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::context::{FetchOutcome, WeatherContext};
use crate::provider::ForecastSource;
use crate::types::Coordinate;

pub const DEFAULT_REFRESH_MINUTES: u64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshSettings {
    /// Timer period in whole minutes; 0 disables the timer
    pub refresh_minutes: u64,
    /// Drop responses that arrive after a newer one was applied
    pub discard_stale_responses: bool,
}

impl Default for RefreshSettings {
    fn default() -> Self {
        Self {
            refresh_minutes: DEFAULT_REFRESH_MINUTES,
            discard_stale_responses: true,
        }
    }
}

/// Deadline used when `now + period` does not fit in an `Instant`
const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

fn minutes(m: u64) -> Duration {
    Duration::from_secs(m.saturating_mul(60))
}

fn next_deadline(period: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(period).unwrap_or(now + FAR_FUTURE)
}

pub struct RefreshEngine {
    context: Arc<WeatherContext>,
    source: Arc<dyn ForecastSource>,
    discard_stale: bool,
    interval: RwLock<Duration>,
    /// Cancels the active timer task, if any
    timer: Mutex<Option<CancellationToken>>,
}

impl RefreshEngine {
    pub fn new(
        context: Arc<WeatherContext>,
        source: Arc<dyn ForecastSource>,
        settings: RefreshSettings,
    ) -> Arc<Self> {
        Arc::new(Self {
            context,
            source,
            discard_stale: settings.discard_stale_responses,
            interval: RwLock::new(minutes(settings.refresh_minutes)),
            timer: Mutex::new(None),
        })
    }

    pub fn context(&self) -> &Arc<WeatherContext> {
        &self.context
    }

    /// Fetch a forecast for `coordinate` and record the outcome.
    pub async fn fetch(&self, coordinate: &Coordinate) {
        let seq = self.context.begin_fetch();
        let result = self.source.fetch_forecast(coordinate).await;

        if let Err(e) = &result {
            tracing::error!(
                "Weather fetch for {} failed: {}",
                coordinate.display_name(),
                e
            );
        }

        match self.context.complete_fetch(seq, result, self.discard_stale) {
            FetchOutcome::Stored => {
                tracing::info!("Weather updated for {}", coordinate.display_name());
            }
            FetchOutcome::Discarded => {
                tracing::debug!("Stale weather response ignored");
            }
            FetchOutcome::Failed => {}
        }
    }

    /// Fetch for the context's current location.
    pub async fn refresh(&self) {
        match self.context.location() {
            Some(coordinate) => self.fetch(&coordinate).await,
            None => tracing::warn!("Refresh requested before a location is known"),
        }
    }

    /// Update the location; a changed location triggers an immediate fetch.
    /// Returns whether the location changed.
    pub async fn set_location(&self, coordinate: Coordinate) -> bool {
        if !self.context.set_location(coordinate.clone()) {
            return false;
        }
        self.fetch(&coordinate).await;
        true
    }

    /// Fetch once for `coordinate`, then start the timer.
    pub async fn initialize(self: &Arc<Self>, coordinate: Coordinate) {
        if !self.set_location(coordinate).await {
            self.refresh().await;
        }
        self.start();
    }

    /// Start the refresh timer, replacing any active one.
    pub fn start(self: &Arc<Self>) {
        self.stop();

        let period = self.interval();
        if period.is_zero() {
            tracing::info!("Weather refresh timer disabled");
            return;
        }

        let token = CancellationToken::new();
        *self.timer.lock() = Some(token.clone());

        let engine: Weak<Self> = Arc::downgrade(self);
        let mut deadline = next_deadline(period);
        tracing::info!("Weather refresh every {} min", period.as_secs() / 60);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep_until(deadline) => {
                        let Some(engine) = engine.upgrade() else { break };
                        tracing::debug!("Weather refresh timer fired");
                        tokio::spawn(async move { engine.refresh().await });
                        deadline = next_deadline(period);
                    }
                }
            }
            tracing::debug!("Weather refresh timer stopped");
        });
    }

    /// Stop the refresh timer. In-flight fetches are left to finish.
    pub fn stop(&self) {
        if let Some(token) = self.timer.lock().take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.lock().is_some()
    }

    pub fn interval(&self) -> Duration {
        *self.interval.read()
    }

    /// Change the timer period. An active timer restarts, so the next tick
    /// comes one full period from now.
    pub fn set_interval_minutes(self: &Arc<Self>, refresh_minutes: u64) {
        *self.interval.write() = minutes(refresh_minutes);
        if self.is_running() {
            self.start();
        }
    }
}

impl Drop for RefreshEngine {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawForecast;
    use crate::types::WeatherError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    impl CountingSource {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ForecastSource for CountingSource {
        async fn fetch_forecast(&self, c: &Coordinate) -> Result<RawForecast, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let body = serde_json::json!({ "latitude": c.latitude, "longitude": c.longitude });
            RawForecast::from_json(&body.to_string())
        }
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn engine(minutes: u64) -> (Arc<RefreshEngine>, Arc<CountingSource>) {
        let source = Arc::new(CountingSource::default());
        let ctx = Arc::new(WeatherContext::default());
        ctx.set_location(Coordinate::named(52.52, 13.41, "Berlin"));
        let engine = RefreshEngine::new(
            ctx,
            source.clone(),
            RefreshSettings {
                refresh_minutes: minutes,
                ..RefreshSettings::default()
            },
        );
        (engine, source)
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_every_period() {
        let (engine, source) = engine(15);
        engine.start();
        settle().await;

        tokio::time::advance(minutes(15)).await;
        settle().await;
        assert_eq!(source.calls(), 1);

        tokio::time::advance(minutes(15)).await;
        settle().await;
        assert_eq!(source.calls(), 2);
        assert!(engine.context().raw().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reconfigure_restarts_period() {
        let (engine, source) = engine(15);
        engine.start();
        settle().await;

        tokio::time::advance(minutes(10)).await;
        settle().await;
        assert_eq!(source.calls(), 0);

        engine.set_interval_minutes(5);
        settle().await;
        tokio::time::advance(minutes(4)).await;
        settle().await;
        assert_eq!(source.calls(), 0);

        tokio::time::advance(minutes(1)).await;
        settle().await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_timer() {
        let (engine, source) = engine(1);
        engine.start();
        assert!(engine.is_running());
        engine.stop();
        assert!(!engine.is_running());
        settle().await;

        tokio::time::advance(minutes(5)).await;
        settle().await;
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_keeps_single_timer() {
        let (engine, source) = engine(1);
        engine.start();
        engine.start();
        engine.start();
        settle().await;

        tokio::time::advance(minutes(1)).await;
        settle().await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_zero_interval_disables_timer() {
        let (engine, _) = engine(0);
        engine.start();
        assert!(!engine.is_running());

        engine.set_interval_minutes(0);
        assert!(!engine.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_while_running() {
        let (engine, source) = engine(5);
        engine.start();
        engine.set_interval_minutes(0);
        assert!(!engine.is_running());
        settle().await;

        tokio::time::advance(minutes(30)).await;
        settle().await;
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_huge_interval_saturates() {
        let (engine, source) = engine(u64::MAX);
        assert_eq!(engine.interval(), Duration::from_secs(u64::MAX));
        engine.start();
        assert!(engine.is_running());

        engine.set_interval_minutes(u64::MAX / 2);
        assert_eq!(engine.interval(), Duration::from_secs(u64::MAX));
        settle().await;

        tokio::time::advance(minutes(60 * 24 * 365)).await;
        settle().await;
        assert_eq!(source.calls(), 0);
        engine.stop();
    }

    #[tokio::test]
    async fn test_set_location_fetches_only_on_change() {
        let (engine, source) = engine(15);
        assert!(!engine.set_location(Coordinate::named(52.52, 13.41, "Berlin")).await);
        assert_eq!(source.calls(), 0);

        assert!(engine.set_location(Coordinate::named(48.85, 2.35, "Paris")).await);
        assert_eq!(source.calls(), 1);
        assert!(!engine.context().is_loading());
    }

    #[tokio::test]
    async fn test_refresh_without_location_is_noop() {
        let source = Arc::new(CountingSource::default());
        let engine = RefreshEngine::new(
            Arc::new(WeatherContext::default()),
            source.clone(),
            RefreshSettings::default(),
        );
        engine.refresh().await;
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_initialize_fetches_then_starts() {
        let source = Arc::new(CountingSource::default());
        let engine = RefreshEngine::new(
            Arc::new(WeatherContext::default()),
            source.clone(),
            RefreshSettings::default(),
        );
        engine.initialize(Coordinate::named(52.52, 13.41, "Berlin")).await;
        assert_eq!(source.calls(), 1);
        assert!(engine.is_running());
        engine.stop();
    }
}
