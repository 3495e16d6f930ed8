use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

/// Temperature display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }
}

/// Wind speed display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WindSpeedUnit {
    #[default]
    Kmh,
    Mph,
}

impl WindSpeedUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Kmh => "km/h",
            Self::Mph => "mph",
        }
    }
}

/// Precipitation display unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PrecipitationUnit {
    #[default]
    Mm,
    Inch,
}

impl PrecipitationUnit {
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Mm => "mm",
            Self::Inch => "inch",
        }
    }
}

/// The user's display units. Source data is always metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct UnitPreferences {
    pub temperature: TemperatureUnit,
    pub windspeed: WindSpeedUnit,
    pub precipitation: PrecipitationUnit,
}

/// Geographic location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    pub name: Option<String>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            name: None,
        }
    }

    pub fn named(latitude: f64, longitude: f64, name: impl Into<String>) -> Self {
        Self {
            latitude,
            longitude,
            name: Some(name.into()),
        }
    }

    /// Name for display, falling back to the formatted coordinates
    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("{:.2}, {:.2}", self.latitude, self.longitude))
    }
}

/// Description and icon for a weather code at a given time of day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherCondition {
    pub code: i32,
    pub description: &'static str,
    pub icon: &'static str,
    pub is_day: bool,
}

/// Current conditions in display units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedCurrent {
    pub time: DateTime<FixedOffset>,
    pub temperature: i32,
    /// Source temperature in Celsius, unrounded
    pub temperature_celsius: f64,
    pub wind_speed: i32,
    pub wind_direction: f64,
    pub condition: WeatherCondition,
    pub humidity: Option<f64>,
    pub surface_pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub cloud_cover: Option<f64>,
}

/// One hour of forecast in display units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedHourly {
    pub time: DateTime<FixedOffset>,
    pub temperature: i32,
    pub precipitation_probability: f64,
    pub wind_speed: i32,
    pub wind_direction: f64,
    pub weather_code: i32,
}

/// One day of forecast in display units
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedDaily {
    pub date: NaiveDate,
    pub weather_code: i32,
    pub temp_max: i32,
    pub temp_min: i32,
    pub sunrise: DateTime<FixedOffset>,
    pub sunset: DateTime<FixedOffset>,
    /// Precipitation sum in the display unit
    pub precipitation: f64,
    pub wind_speed: i32,
    pub wind_direction: f64,
    pub uv_index: f64,
}

/// Chart bounds for the daily temperature series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TemperatureRange {
    pub min: i32,
    pub max: i32,
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self { min: 0, max: 30 }
    }
}

/// Temperature band used to pick the background palette
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBand {
    Freezing,
    Cool,
    Mild,
    Warm,
}

impl TemperatureBand {
    pub fn from_celsius(celsius: f64) -> Self {
        if celsius < 0.0 {
            Self::Freezing
        } else if celsius < 15.0 {
            Self::Cool
        } else if celsius < 25.0 {
            Self::Mild
        } else {
            Self::Warm
        }
    }
}

/// Background gradient token handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Gradient {
    /// No current conditions yet
    Default,
    Band { band: TemperatureBand, is_day: bool },
}

impl Gradient {
    pub fn token(&self) -> &'static str {
        match self {
            Self::Default => "from-cyan-400 via-teal-500 to-blue-600",
            Self::Band { band, is_day } => match (band, is_day) {
                (TemperatureBand::Freezing, true) => "from-cyan-200 via-cyan-400 to-teal-600",
                (TemperatureBand::Freezing, false) => "from-slate-900 via-cyan-900 to-teal-900",
                (TemperatureBand::Cool, true) => "from-teal-300 via-cyan-400 to-blue-500",
                (TemperatureBand::Cool, false) => "from-slate-800 via-teal-800 to-cyan-900",
                (TemperatureBand::Mild, true) => "from-teal-400 via-emerald-400 to-orange-400",
                (TemperatureBand::Mild, false) => "from-slate-700 via-teal-700 to-orange-800",
                (TemperatureBand::Warm, true) => "from-orange-300 via-orange-400 to-red-500",
                (TemperatureBand::Warm, false) => "from-orange-900 via-red-800 to-purple-900",
            },
        }
    }
}

/// Location service errors
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service not supported")]
    Unsupported,
    #[error("Location service unavailable")]
    Unavailable,
    #[error("Location request timed out")]
    Timeout,
    #[error("Location error: {0}")]
    Other(String),
}

impl LocationError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Location access denied. Showing the default location.",
            Self::Unsupported | Self::Unavailable => {
                "Location unavailable. Showing the default location."
            }
            Self::Timeout => "Finding your location took too long. Showing the default location.",
            Self::Other(_) => "Could not determine your location.",
        }
    }
}

/// Weather provider errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error! status: {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Network(_) => "Unable to reach the weather service. Check your connection.",
            Self::Status(status) if *status >= 500 => {
                "Weather service unavailable. Please try again later."
            }
            Self::Status(_) => "Weather request failed. Please try again.",
            Self::Parse(_) => "Received unexpected weather data.",
            Self::InvalidUrl(_) => "Weather service address is invalid. Check settings.",
        }
    }
}
