//! Memoized projections of the raw forecast.
//!
//! A projection is recomputed only when its key changes. For derived series
//! the key is the raw payload version plus the unit preferences, so repeated
//! reads between fetches and unit toggles reuse the same result.

use std::sync::Arc;

use crate::derive;
use crate::raw::RawForecast;
use crate::types::{DerivedDaily, DerivedHourly, UnitPreferences};

/// Single-slot cache: one key, one value.
#[derive(Debug)]
pub struct Memo<K, V> {
    slot: Option<(K, Arc<V>)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    /// Return the cached value for `key`, computing and storing it on a miss.
    pub fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> Arc<V> {
        if let Some((cached_key, value)) = &self.slot {
            if *cached_key == key {
                return Arc::clone(value);
            }
        }
        let value = Arc::new(compute());
        self.slot = Some((key, Arc::clone(&value)));
        value
    }
}

/// Cache key for anything derived from raw data plus units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProjectionKey {
    pub raw_version: u64,
    pub units: UnitPreferences,
}

/// Memoized hourly and daily series. Time-dependent filtering happens on read,
/// on top of these unfiltered series.
#[derive(Debug, Default)]
pub struct Projections {
    hourly: Memo<ProjectionKey, Vec<DerivedHourly>>,
    daily: Memo<ProjectionKey, Vec<DerivedDaily>>,
}

impl Projections {
    pub fn hourly(
        &mut self,
        key: ProjectionKey,
        raw: Option<&RawForecast>,
    ) -> Arc<Vec<DerivedHourly>> {
        self.hourly
            .get_or_compute(key, || derive::map_hourly(raw, key.units))
    }

    pub fn daily(&mut self, key: ProjectionKey, raw: Option<&RawForecast>) -> Arc<Vec<DerivedDaily>> {
        self.daily
            .get_or_compute(key, || derive::daily_series(raw, key.units))
    }
}
