use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use url::Url;

use skycast_weather::engine::DEFAULT_REFRESH_MINUTES;
use skycast_weather::geocode::{DEFAULT_USER_AGENT, NOMINATIM_URL};
use skycast_weather::provider::OPEN_METEO_URL;
use skycast_weather::{
    Coordinate, PositionOptions, PrecipitationUnit, RefreshSettings, TemperatureUnit,
    UnitPreferences, WindSpeedUnit,
};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Forecast and display settings
    #[serde(default)]
    pub weather: WeatherConfig,

    /// Position and fallback location
    #[serde(default)]
    pub location: LocationConfig,
}

/// Temperature unit preference. `Auto` follows the resolved location's country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperaturePreference {
    #[default]
    Auto,
    Celsius,
    Fahrenheit,
}

impl TemperaturePreference {
    /// The pinned unit, if any
    pub fn fixed(self) -> Option<TemperatureUnit> {
        match self {
            Self::Auto => None,
            Self::Celsius => Some(TemperatureUnit::Celsius),
            Self::Fahrenheit => Some(TemperatureUnit::Fahrenheit),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub temperature_unit: TemperaturePreference,
    pub wind_speed_unit: WindSpeedUnit,
    pub precipitation_unit: PrecipitationUnit,

    /// Refresh interval in minutes, 0 to disable
    pub refresh_minutes: u32,

    /// Ignore responses older than one already shown
    pub discard_stale_responses: bool,

    pub forecast_url: String,
    pub geocode_url: String,

    /// Sent with reverse geocoding requests
    pub user_agent: String,

    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            temperature_unit: TemperaturePreference::Auto,
            wind_speed_unit: WindSpeedUnit::Kmh,
            precipitation_unit: PrecipitationUnit::Mm,
            refresh_minutes: DEFAULT_REFRESH_MINUTES as u32,
            discard_stale_responses: true,
            forecast_url: OPEN_METEO_URL.to_string(),
            geocode_url: NOMINATIM_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl WeatherConfig {
    /// Initial display units
    pub fn unit_preferences(&self) -> UnitPreferences {
        UnitPreferences {
            temperature: self.temperature_unit.fixed().unwrap_or_default(),
            windspeed: self.wind_speed_unit,
            precipitation: self.precipitation_unit,
        }
    }

    pub fn refresh_settings(&self) -> RefreshSettings {
        RefreshSettings {
            refresh_minutes: u64::from(self.refresh_minutes),
            discard_stale_responses: self.discard_stale_responses,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Device position. Without it the fallback is used.
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
    pub fallback_name: String,

    /// Position request timeout
    pub timeout_secs: u64,

    /// Maximum age of a reused position fix
    pub max_age_secs: u64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            fallback_latitude: 52.52,
            fallback_longitude: 13.41,
            fallback_name: "Berlin".to_string(),
            timeout_secs: 5,
            max_age_secs: 300,
        }
    }
}

impl LocationConfig {
    pub fn fallback(&self) -> Coordinate {
        Coordinate::named(
            self.fallback_latitude,
            self.fallback_longitude,
            self.fallback_name.clone(),
        )
    }

    /// Configured device position, when both coordinates are set
    pub fn position(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }

    pub fn position_options(&self) -> PositionOptions {
        PositionOptions {
            timeout: std::time::Duration::from_secs(self.timeout_secs),
            maximum_age: std::time::Duration::from_secs(self.max_age_secs),
        }
    }
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from an explicit path, writing defaults there if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("Creating default config at {}", path.display());
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns the config along with any validation warnings.
    /// Returns an error if validation fails with critical errors.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        Self::validated(Self::load()?)
    }

    pub fn load_validated_from(path: &Path) -> Result<(Self, ValidationResult)> {
        Self::validated(Self::load_from(path)?)
    }

    fn validated(config: Self) -> Result<(Self, ValidationResult)> {
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let weather = &self.weather;
        Self::validate_url(&weather.forecast_url, "weather.forecast_url", &mut result);
        Self::validate_url(&weather.geocode_url, "weather.geocode_url", &mut result);

        if weather.refresh_minutes == 0 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh disabled (0 minutes)",
            );
        } else if weather.refresh_minutes > 1440 {
            result.add_warning(
                "weather.refresh_minutes",
                "Weather refresh interval is more than 24 hours",
            );
        }

        if weather.user_agent.trim().is_empty() {
            result.add_error("weather.user_agent", "User agent must not be empty");
        }

        if weather.request_timeout_secs == 0 {
            result.add_error(
                "weather.request_timeout_secs",
                "Request timeout must be greater than 0",
            );
        }

        let location = &self.location;
        match (location.latitude, location.longitude) {
            (Some(lat), Some(lon)) => {
                Self::validate_coordinate(
                    (lat, lon),
                    ("location.latitude", "location.longitude"),
                    &mut result,
                );
            }
            (None, None) => {}
            _ => {
                result.add_error(
                    "location",
                    "latitude and longitude must be set together",
                );
            }
        }

        Self::validate_coordinate(
            (location.fallback_latitude, location.fallback_longitude),
            ("location.fallback_latitude", "location.fallback_longitude"),
            &mut result,
        );

        if location.fallback_name.trim().is_empty() {
            result.add_warning("location.fallback_name", "Fallback location has no name");
        }

        if location.timeout_secs == 0 {
            result.add_error(
                "location.timeout_secs",
                "Position timeout must be greater than 0",
            );
        }

        result
    }

    fn validate_coordinate(
        (lat, lon): (f64, f64),
        (lat_field, lon_field): (&str, &str),
        result: &mut ValidationResult,
    ) {
        if !(-90.0..=90.0).contains(&lat) {
            result.add_error(lat_field, format!("Latitude out of range: {}", lat));
        }
        if !(-180.0..=180.0).contains(&lon) {
            result.add_error(lon_field, format!("Longitude out of range: {}", lon));
        }
    }

    /// Validate a URL field
    fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
        match Url::parse(url_str) {
            Ok(url) => {
                if url.scheme() != "http" && url.scheme() != "https" {
                    result.add_error(
                        field_name,
                        format!("URL must use http or https scheme, got: {}", url.scheme()),
                    );
                }

                if url.host().is_none() {
                    result.add_error(field_name, "URL must have a host");
                }

                if url.port() == Some(0) {
                    result.add_error(field_name, "Port cannot be 0");
                }
            }
            Err(e) => {
                result.add_error(field_name, format!("Invalid URL: {}", e));
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("skycast");

        Ok(config_dir.join("config.toml"))
    }
}
