//! Location resolution.
//!
//! Settles on a usable coordinate no matter what: a device fix when one is
//! available, named via reverse geocoding, otherwise a fixed fallback.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::context::WeatherContext;
use crate::geocode::PlaceLookup;
use crate::types::{Coordinate, LocationError};
use crate::units::temperature_unit_for_country;

/// Label used when a fix has no resolvable place name
pub const GENERIC_PLACE_NAME: &str = "Your Location";

/// A device position fix
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy_meters: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// How long to wait for the device
    pub timeout: Duration,
    /// A cached fix younger than this is reused
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            maximum_age: Duration::from_secs(300),
        }
    }
}

/// Source of device positions
#[async_trait]
pub trait PositionSource: Send + Sync {
    async fn current_position(&self) -> Result<Position, LocationError>;
}

/// Fixed coordinates from configuration, standing in for a device
#[derive(Debug, Clone)]
pub struct ConfiguredPosition {
    position: Position,
}

impl ConfiguredPosition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position {
                latitude,
                longitude,
                accuracy_meters: None,
            },
        }
    }
}

#[async_trait]
impl PositionSource for ConfiguredPosition {
    async fn current_position(&self) -> Result<Position, LocationError> {
        Ok(self.position.clone())
    }
}

/// No positioning hardware or service
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPositionSource;

#[async_trait]
impl PositionSource for NoPositionSource {
    async fn current_position(&self) -> Result<Position, LocationError> {
        Err(LocationError::Unsupported)
    }
}

pub struct LocationResolver {
    source: Arc<dyn PositionSource>,
    places: Arc<dyn PlaceLookup>,
    fallback: Coordinate,
    options: PositionOptions,
    infer_units: bool,
    last_fix: Mutex<Option<(Instant, Position)>>,
}

impl LocationResolver {
    pub fn new(
        source: Arc<dyn PositionSource>,
        places: Arc<dyn PlaceLookup>,
        fallback: Coordinate,
    ) -> Self {
        Self {
            source,
            places,
            fallback,
            options: PositionOptions::default(),
            infer_units: true,
            last_fix: Mutex::new(None),
        }
    }

    pub fn with_options(mut self, options: PositionOptions) -> Self {
        self.options = options;
        self
    }

    /// Whether a successful reverse lookup may change the temperature unit
    pub fn with_unit_inference(mut self, enabled: bool) -> Self {
        self.infer_units = enabled;
        self
    }

    pub fn fallback(&self) -> &Coordinate {
        &self.fallback
    }

    /// Resolve a coordinate. Never fails.
    pub async fn resolve(&self, context: &WeatherContext) -> Coordinate {
        let position = match self.position().await {
            Ok(position) => position,
            Err(e) => {
                tracing::warn!(
                    "Position unavailable ({}), using {}",
                    e,
                    self.fallback.display_name()
                );
                return self.fallback.clone();
            }
        };

        let coordinate = Coordinate::new(position.latitude, position.longitude);
        match self.places.reverse(&coordinate).await {
            Ok(place) => {
                if self.infer_units {
                    let unit = temperature_unit_for_country(&place.country_code);
                    tracing::debug!("Inferred {:?} from country {}", unit, place.country_code);
                    context.set_temperature_unit(unit);
                }
                Coordinate {
                    name: Some(place.city_name),
                    ..coordinate
                }
            }
            Err(e) => {
                tracing::warn!("Reverse geocoding failed: {}", e);
                Coordinate {
                    name: Some(GENERIC_PLACE_NAME.to_string()),
                    ..coordinate
                }
            }
        }
    }

    /// A fresh enough cached fix, or a new one within the timeout
    async fn position(&self) -> Result<Position, LocationError> {
        let cached = self.last_fix.lock().clone();
        if let Some((taken, position)) = cached {
            if taken.elapsed() <= self.options.maximum_age {
                tracing::debug!("Reusing cached position fix");
                return Ok(position);
            }
        }

        let position = tokio::time::timeout(self.options.timeout, self.source.current_position())
            .await
            .map_err(|_| LocationError::Timeout)??;

        *self.last_fix.lock() = Some((Instant::now(), position.clone()));
        Ok(position)
    }
}
