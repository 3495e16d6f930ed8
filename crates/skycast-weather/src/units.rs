//! Unit conversion for display values.
//!
//! Provider data is always metric (°C, km/h, mm). Display values are rounded
//! half up to the nearest integer.

use crate::types::{PrecipitationUnit, TemperatureUnit, UnitPreferences, WindSpeedUnit};

const MPH_PER_KMH: f64 = 0.621371;
const MM_PER_INCH: f64 = 25.4;

/// Countries whose default temperature unit is Fahrenheit (US, Liberia, Myanmar)
pub const FAHRENHEIT_COUNTRIES: [&str; 3] = ["US", "LR", "MM"];

/// Round to the nearest integer, with halves going towards positive infinity.
pub fn round_half_up(value: f64) -> i32 {
    (value + 0.5).floor() as i32
}

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

pub fn kmh_to_mph(kmh: f64) -> f64 {
    kmh * MPH_PER_KMH
}

/// Display temperature for a Celsius source value
pub fn display_temperature(celsius: f64, unit: TemperatureUnit) -> i32 {
    match unit {
        TemperatureUnit::Celsius => round_half_up(celsius),
        TemperatureUnit::Fahrenheit => round_half_up(celsius_to_fahrenheit(celsius)),
    }
}

/// Display wind speed for a km/h source value
pub fn display_wind_speed(kmh: f64, unit: WindSpeedUnit) -> i32 {
    match unit {
        WindSpeedUnit::Kmh => round_half_up(kmh),
        WindSpeedUnit::Mph => round_half_up(kmh_to_mph(kmh)),
    }
}

pub fn mm_to_inches(mm: f64) -> f64 {
    mm / MM_PER_INCH
}

/// Display precipitation for a millimetre source value, to two decimals
pub fn display_precipitation(mm: f64, unit: PrecipitationUnit) -> f64 {
    match unit {
        PrecipitationUnit::Mm => mm,
        PrecipitationUnit::Inch => (mm_to_inches(mm) * 100.0).round() / 100.0,
    }
}

/// Default temperature unit for an ISO 3166-1 alpha-2 country code
pub fn temperature_unit_for_country(country_code: &str) -> TemperatureUnit {
    if FAHRENHEIT_COUNTRIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(country_code))
    {
        TemperatureUnit::Fahrenheit
    } else {
        TemperatureUnit::Celsius
    }
}

impl UnitPreferences {
    pub fn temperature(&self, celsius: f64) -> i32 {
        display_temperature(celsius, self.temperature)
    }

    pub fn wind_speed(&self, kmh: f64) -> i32 {
        display_wind_speed(kmh, self.windspeed)
    }

    pub fn precipitation(&self, mm: f64) -> f64 {
        display_precipitation(mm, self.precipitation)
    }
}
