//! Open-Meteo forecast payload, as returned by the provider.
//!
//! Stored unmodified; derived views are computed from it on read.

use std::collections::HashMap;

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveDateTime, Offset, Utc};
use serde::Deserialize;

use crate::types::WeatherError;

/// Field names requested for each data group
pub const CURRENT_FIELDS: [&str; 8] = [
    "temperature_2m",
    "windspeed_10m",
    "winddirection_10m",
    "weather_code",
    "relative_humidity_2m",
    "surface_pressure",
    "visibility",
    "cloud_cover",
];

pub const HOURLY_FIELDS: [&str; 5] = [
    "temperature_2m",
    "precipitation_probability",
    "windspeed_10m",
    "winddirection_10m",
    "weather_code",
];

pub const DAILY_FIELDS: [&str; 9] = [
    "weather_code",
    "temperature_2m_max",
    "temperature_2m_min",
    "sunrise",
    "sunset",
    "precipitation_sum",
    "windspeed_10m_max",
    "winddirection_10m_dominant",
    "uv_index_max",
];

#[derive(Debug, Clone, Deserialize)]
pub struct RawForecast {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub generationtime_ms: f64,
    #[serde(default)]
    pub utc_offset_seconds: i32,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub timezone_abbreviation: String,
    #[serde(default)]
    pub elevation: f64,
    pub current: Option<RawCurrent>,
    #[serde(default)]
    pub current_units: HashMap<String, String>,
    pub hourly: Option<RawHourly>,
    #[serde(default)]
    pub hourly_units: HashMap<String, String>,
    pub daily: Option<RawDaily>,
    #[serde(default)]
    pub daily_units: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawCurrent {
    #[serde(with = "local_time")]
    pub time: NaiveDateTime,
    #[serde(default)]
    pub interval: i64,
    pub temperature_2m: f64,
    pub windspeed_10m: f64,
    pub winddirection_10m: f64,
    pub weather_code: i32,
    pub relative_humidity_2m: Option<f64>,
    pub surface_pressure: Option<f64>,
    pub visibility: Option<f64>,
    pub cloud_cover: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawHourly {
    #[serde(with = "local_times")]
    pub time: Vec<NaiveDateTime>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_probability: Vec<Option<f64>>,
    #[serde(default)]
    pub windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub winddirection_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawDaily {
    pub time: Vec<NaiveDate>,
    #[serde(default)]
    pub weather_code: Vec<Option<i32>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(with = "local_times")]
    pub sunrise: Vec<NaiveDateTime>,
    #[serde(with = "local_times")]
    pub sunset: Vec<NaiveDateTime>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub windspeed_10m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub winddirection_10m_dominant: Vec<Option<f64>>,
    pub uv_index_max: Option<Vec<Option<f64>>>,
}

impl RawForecast {
    /// Parse a payload and check that every series lines up with its `time` array.
    pub fn from_json(body: &str) -> Result<Self, WeatherError> {
        let raw: Self = serde_json::from_str(body).map_err(|e| WeatherError::Parse(e.to_string()))?;
        raw.validate()?;
        Ok(raw)
    }

    /// Reject payloads whose parallel arrays disagree in length. Series the
    /// provider omitted entirely (empty) are tolerated and read as zero.
    pub fn validate(&self) -> Result<(), WeatherError> {
        if let Some(hourly) = &self.hourly {
            let len = hourly.time.len();
            check_len("hourly.temperature_2m", hourly.temperature_2m.len(), len)?;
            check_len(
                "hourly.precipitation_probability",
                hourly.precipitation_probability.len(),
                len,
            )?;
            check_len("hourly.windspeed_10m", hourly.windspeed_10m.len(), len)?;
            check_len("hourly.winddirection_10m", hourly.winddirection_10m.len(), len)?;
            check_len("hourly.weather_code", hourly.weather_code.len(), len)?;
        }
        if let Some(daily) = &self.daily {
            let len = daily.time.len();
            check_len("daily.weather_code", daily.weather_code.len(), len)?;
            check_len("daily.temperature_2m_max", daily.temperature_2m_max.len(), len)?;
            check_len("daily.temperature_2m_min", daily.temperature_2m_min.len(), len)?;
            // Sunrise/sunset are required for day/night, so they must be complete.
            if daily.sunrise.len() != len || daily.sunset.len() != len {
                return Err(WeatherError::Parse(format!(
                    "daily.sunrise/sunset have {}/{} entries, expected {}",
                    daily.sunrise.len(),
                    daily.sunset.len(),
                    len
                )));
            }
            check_len("daily.precipitation_sum", daily.precipitation_sum.len(), len)?;
            check_len("daily.windspeed_10m_max", daily.windspeed_10m_max.len(), len)?;
            check_len(
                "daily.winddirection_10m_dominant",
                daily.winddirection_10m_dominant.len(),
                len,
            )?;
            if let Some(uv) = &daily.uv_index_max {
                check_len("daily.uv_index_max", uv.len(), len)?;
            }
        }
        Ok(())
    }

    /// The forecast location's offset from UTC
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_seconds).unwrap_or_else(|| Utc.fix())
    }

    /// Attach the forecast's UTC offset to a provider-local timestamp
    pub fn localize(&self, local: NaiveDateTime) -> DateTime<FixedOffset> {
        let offset = self.offset();
        let utc = local - Duration::seconds(i64::from(offset.local_minus_utc()));
        DateTime::from_naive_utc_and_offset(utc, offset)
    }

    /// Today's sunrise/sunset window, taken from the first daily record
    pub fn today_daylight(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let daily = self.daily.as_ref()?;
        let sunrise = *daily.sunrise.first()?;
        let sunset = *daily.sunset.first()?;
        Some((
            self.localize(sunrise).with_timezone(&Utc),
            self.localize(sunset).with_timezone(&Utc),
        ))
    }
}

fn check_len(field: &str, actual: usize, expected: usize) -> Result<(), WeatherError> {
    if actual == 0 || actual == expected {
        Ok(())
    } else {
        Err(WeatherError::Parse(format!(
            "{} has {} entries, expected {}",
            field, actual, expected
        )))
    }
}

/// Read a possibly-null entry of a series, treating gaps as zero
pub(crate) fn value_at<T: Copy + Default>(series: &[Option<T>], index: usize) -> T {
    series.get(index).copied().flatten().unwrap_or_default()
}

const LOCAL_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Provider timestamps carry no seconds and no offset ("2024-05-01T14:00").
fn parse_local(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, LOCAL_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
}

mod local_time {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::parse_local(&s).map_err(serde::de::Error::custom)
    }
}

mod local_times {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<NaiveDateTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<String>::deserialize(deserializer)?;
        values
            .iter()
            .map(|s| super::parse_local(s).map_err(serde::de::Error::custom))
            .collect()
    }
}
