//! Shared dashboard state.
//!
//! `WeatherContext` owns the location, the unit preferences, the live raw
//! forecast and the memoized projections. It is created by the application
//! and handed (as `Arc`) to the location resolver and the refresh engine.
//! Every change bumps a counter on a `watch` channel so a presentation layer
//! can redraw.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;

use crate::derive;
use crate::memo::{ProjectionKey, Projections};
use crate::raw::RawForecast;
use crate::types::{
    Coordinate, DerivedCurrent, DerivedDaily, DerivedHourly, Gradient, TemperatureRange,
    TemperatureUnit, UnitPreferences, WeatherError,
};

/// Prefix for errors surfaced to the user
const FETCH_ERROR_PREFIX: &str = "Unable to fetch weather data";

#[derive(Debug, Default)]
struct ForecastState {
    raw: Option<Arc<RawForecast>>,
    /// Bumped on every successful store
    version: u64,
    in_flight: usize,
    last_error: Option<String>,
    last_updated: Option<DateTime<Utc>>,
    /// Sequence number handed to the most recent fetch
    issued_seq: u64,
    /// Sequence number of the last response that was applied
    applied_seq: u64,
}

/// Point-in-time copy of the fetch state
#[derive(Debug, Clone)]
pub struct ForecastSnapshot {
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub raw: Option<Arc<RawForecast>>,
    pub last_updated: Option<DateTime<Utc>>,
    pub version: u64,
}

/// Everything the dashboard shows, derived at one instant
#[derive(Debug, Clone)]
pub struct DashboardView {
    pub location: Option<Coordinate>,
    pub units: UnitPreferences,
    pub is_loading: bool,
    pub last_error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    pub current: Option<DerivedCurrent>,
    pub hourly: Vec<DerivedHourly>,
    pub daily: Vec<DerivedDaily>,
    pub temperature_range: TemperatureRange,
    pub is_daytime: bool,
    pub gradient: Gradient,
}

/// Outcome of completing a fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Stored,
    Failed,
    /// A newer response had already been applied
    Discarded,
}

pub struct WeatherContext {
    location: RwLock<Option<Coordinate>>,
    units: RwLock<UnitPreferences>,
    forecast: RwLock<ForecastState>,
    projections: Mutex<Projections>,
    changes: watch::Sender<u64>,
}

impl Default for WeatherContext {
    fn default() -> Self {
        Self::new(UnitPreferences::default())
    }
}

impl WeatherContext {
    pub fn new(units: UnitPreferences) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            location: RwLock::new(None),
            units: RwLock::new(units),
            forecast: RwLock::new(ForecastState::default()),
            projections: Mutex::new(Projections::default()),
            changes,
        }
    }

    /// Receiver that observes a change counter, bumped on every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }

    fn notify(&self) {
        self.changes.send_modify(|n| *n = n.wrapping_add(1));
    }

    // --- location ---

    pub fn location(&self) -> Option<Coordinate> {
        self.location.read().clone()
    }

    /// Replace the location wholesale. Returns `false` if it was unchanged.
    /// Outside this crate locations go through `RefreshEngine::set_location`,
    /// which also fetches for the new coordinate.
    pub(crate) fn set_location(&self, coordinate: Coordinate) -> bool {
        {
            let mut location = self.location.write();
            if location.as_ref() == Some(&coordinate) {
                return false;
            }
            tracing::info!(
                "Location set to {} ({:.4}, {:.4})",
                coordinate.display_name(),
                coordinate.latitude,
                coordinate.longitude
            );
            *location = Some(coordinate);
        }
        self.notify();
        true
    }

    // --- units ---

    pub fn units(&self) -> UnitPreferences {
        *self.units.read()
    }

    pub fn set_units(&self, units: UnitPreferences) {
        {
            let mut current = self.units.write();
            if *current == units {
                return;
            }
            *current = units;
        }
        self.notify();
    }

    pub fn set_temperature_unit(&self, unit: TemperatureUnit) {
        let units = UnitPreferences {
            temperature: unit,
            ..self.units()
        };
        self.set_units(units);
    }

    pub fn toggle_temperature_unit(&self) -> TemperatureUnit {
        let unit = self.units().temperature.toggled();
        self.set_temperature_unit(unit);
        unit
    }

    // --- fetch state ---

    /// Mark a fetch as started and return its sequence number.
    pub fn begin_fetch(&self) -> u64 {
        let seq = {
            let mut state = self.forecast.write();
            state.in_flight += 1;
            state.issued_seq += 1;
            state.last_error = None;
            state.issued_seq
        };
        self.notify();
        seq
    }

    /// Record the result of fetch `seq`.
    ///
    /// With `discard_stale` set, a response older than one already applied is
    /// dropped. Without it, whichever response arrives last wins.
    pub fn complete_fetch(
        &self,
        seq: u64,
        result: Result<RawForecast, WeatherError>,
        discard_stale: bool,
    ) -> FetchOutcome {
        let outcome = {
            let mut state = self.forecast.write();
            state.in_flight = state.in_flight.saturating_sub(1);

            if discard_stale && seq < state.applied_seq {
                tracing::debug!(
                    "Discarding response {} (already applied {})",
                    seq,
                    state.applied_seq
                );
                FetchOutcome::Discarded
            } else {
                state.applied_seq = state.applied_seq.max(seq);
                match result {
                    Ok(raw) => {
                        state.raw = Some(Arc::new(raw));
                        state.version += 1;
                        state.last_error = None;
                        state.last_updated = Some(Utc::now());
                        FetchOutcome::Stored
                    }
                    Err(e) => {
                        state.last_error = Some(format!("{}: {}", FETCH_ERROR_PREFIX, e));
                        FetchOutcome::Failed
                    }
                }
            }
        };
        self.notify();
        outcome
    }

    pub fn snapshot(&self) -> ForecastSnapshot {
        let state = self.forecast.read();
        ForecastSnapshot {
            is_loading: state.in_flight > 0,
            last_error: state.last_error.clone(),
            raw: state.raw.clone(),
            last_updated: state.last_updated,
            version: state.version,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.forecast.read().in_flight > 0
    }

    pub fn last_error(&self) -> Option<String> {
        self.forecast.read().last_error.clone()
    }

    pub fn raw(&self) -> Option<Arc<RawForecast>> {
        self.forecast.read().raw.clone()
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.forecast.read().last_updated
    }

    // --- derived views ---

    fn projection_key(&self, raw_version: u64) -> ProjectionKey {
        ProjectionKey {
            raw_version,
            units: self.units(),
        }
    }

    pub fn current_conditions(&self, now: DateTime<Utc>) -> Option<DerivedCurrent> {
        let raw = self.raw();
        let location = self.location();
        derive::current_conditions(raw.as_deref(), location.as_ref(), self.units(), now)
    }

    pub fn hourly_series(&self, now: DateTime<Utc>) -> Vec<DerivedHourly> {
        let snapshot = self.snapshot();
        let key = self.projection_key(snapshot.version);
        let all = self.projections.lock().hourly(key, snapshot.raw.as_deref());
        derive::within_next_day(&all, now)
    }

    pub fn daily_series(&self) -> Arc<Vec<DerivedDaily>> {
        let snapshot = self.snapshot();
        let key = self.projection_key(snapshot.version);
        self.projections.lock().daily(key, snapshot.raw.as_deref())
    }

    pub fn temperature_range(&self) -> TemperatureRange {
        derive::temperature_range(&self.daily_series())
    }

    pub fn is_daytime_now(&self, now: DateTime<Utc>) -> bool {
        let current = self.current_conditions(now);
        derive::is_daytime_now(current.as_ref(), &self.daily_series(), now)
    }

    pub fn background_gradient(&self, now: DateTime<Utc>) -> Gradient {
        let current = self.current_conditions(now);
        let daily = self.daily_series();
        let is_day = derive::is_daytime_now(current.as_ref(), &daily, now);
        derive::background_gradient(current.as_ref(), is_day)
    }

    /// Derive the whole dashboard at `now`
    pub fn view(&self, now: DateTime<Utc>) -> DashboardView {
        let snapshot = self.snapshot();
        let location = self.location();
        let units = self.units();
        let key = ProjectionKey {
            raw_version: snapshot.version,
            units,
        };
        let raw = snapshot.raw.as_deref();

        let (hourly, daily) = {
            let mut projections = self.projections.lock();
            (projections.hourly(key, raw), projections.daily(key, raw))
        };
        let current = derive::current_conditions(raw, location.as_ref(), units, now);
        let is_daytime = derive::is_daytime_now(current.as_ref(), &daily, now);
        let gradient = derive::background_gradient(current.as_ref(), is_daytime);

        DashboardView {
            location,
            units,
            is_loading: snapshot.is_loading,
            last_error: snapshot.last_error,
            last_updated: snapshot.last_updated,
            hourly: derive::within_next_day(&hourly, now),
            temperature_range: derive::temperature_range(&daily),
            daily: daily.to_vec(),
            current,
            is_daytime,
            gradient,
        }
    }
}
