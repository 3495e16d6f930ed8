//! Weather service for Skycast
//!
//! Resolves the user's location, fetches Open-Meteo forecasts on a refresh
//! timer and derives display-ready views (current conditions, next-24h hourly
//! series, daily series, temperature range, day/night, background gradient).

pub mod codes;
pub mod context;
pub mod derive;
pub mod engine;
pub mod geocode;
pub mod location;
pub mod memo;
pub mod provider;
pub mod raw;
pub mod types;
pub mod units;

pub use context::{DashboardView, FetchOutcome, ForecastSnapshot, WeatherContext};
pub use engine::{RefreshEngine, RefreshSettings};
pub use geocode::{NominatimClient, Place, PlaceLookup};
pub use location::{
    ConfiguredPosition, LocationResolver, NoPositionSource, Position, PositionOptions,
    PositionSource,
};
pub use provider::{ForecastSource, WeatherProvider};
pub use raw::RawForecast;
pub use types::*;
