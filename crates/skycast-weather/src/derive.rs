//! Display-ready projections of a raw forecast.
//!
//! Everything here is pure: the raw payload, the unit preferences and the
//! current instant go in, derived values come out.

use chrono::{DateTime, Duration, Utc};

use crate::codes;
use crate::raw::{value_at, RawForecast};
use crate::types::{
    Coordinate, DerivedCurrent, DerivedDaily, DerivedHourly, Gradient, TemperatureBand,
    TemperatureRange, UnitPreferences,
};

/// Length of the hourly window shown on the dashboard
pub const HOURLY_WINDOW_HOURS: i64 = 24;

/// Padding added below the coldest and above the warmest daily value
const RANGE_PADDING: i32 = 2;

/// Current conditions, or `None` until both a payload and a location exist.
pub fn current_conditions(
    raw: Option<&RawForecast>,
    location: Option<&Coordinate>,
    units: UnitPreferences,
    now: DateTime<Utc>,
) -> Option<DerivedCurrent> {
    let raw = raw?;
    location?;
    let current = raw.current.as_ref()?;

    let is_day = match raw.today_daylight() {
        Some((sunrise, sunset)) => now >= sunrise && now <= sunset,
        None => true,
    };

    Some(DerivedCurrent {
        time: raw.localize(current.time),
        temperature: units.temperature(current.temperature_2m),
        temperature_celsius: current.temperature_2m,
        wind_speed: units.wind_speed(current.windspeed_10m),
        wind_direction: current.winddirection_10m,
        condition: codes::condition(current.weather_code, is_day),
        humidity: current.relative_humidity_2m,
        surface_pressure: current.surface_pressure,
        visibility: current.visibility,
        cloud_cover: current.cloud_cover,
    })
}

/// Every hourly record converted to display units, in source order.
pub fn map_hourly(raw: Option<&RawForecast>, units: UnitPreferences) -> Vec<DerivedHourly> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let Some(hourly) = raw.hourly.as_ref() else {
        return Vec::new();
    };

    hourly
        .time
        .iter()
        .enumerate()
        .map(|(i, time)| DerivedHourly {
            time: raw.localize(*time),
            temperature: units.temperature(value_at(&hourly.temperature_2m, i)),
            precipitation_probability: value_at(&hourly.precipitation_probability, i),
            wind_speed: units.wind_speed(value_at(&hourly.windspeed_10m, i)),
            wind_direction: value_at(&hourly.winddirection_10m, i),
            weather_code: value_at(&hourly.weather_code, i),
        })
        .collect()
}

/// Keep the entries falling within `[now, now + 24h]`.
pub fn within_next_day(series: &[DerivedHourly], now: DateTime<Utc>) -> Vec<DerivedHourly> {
    let end = now + Duration::hours(HOURLY_WINDOW_HOURS);
    series
        .iter()
        .filter(|h| {
            let at = h.time.with_timezone(&Utc);
            at >= now && at <= end
        })
        .cloned()
        .collect()
}

/// Hourly records for the next 24 hours.
pub fn hourly_series(
    raw: Option<&RawForecast>,
    units: UnitPreferences,
    now: DateTime<Utc>,
) -> Vec<DerivedHourly> {
    within_next_day(&map_hourly(raw, units), now)
}

/// Every daily record converted to display units. No filtering.
pub fn daily_series(raw: Option<&RawForecast>, units: UnitPreferences) -> Vec<DerivedDaily> {
    let Some(raw) = raw else {
        return Vec::new();
    };
    let Some(daily) = raw.daily.as_ref() else {
        return Vec::new();
    };

    daily
        .time
        .iter()
        .enumerate()
        .filter_map(|(i, date)| {
            // validate() guarantees sunrise/sunset line up with time
            let sunrise = *daily.sunrise.get(i)?;
            let sunset = *daily.sunset.get(i)?;
            Some(DerivedDaily {
                date: *date,
                weather_code: value_at(&daily.weather_code, i),
                temp_max: units.temperature(value_at(&daily.temperature_2m_max, i)),
                temp_min: units.temperature(value_at(&daily.temperature_2m_min, i)),
                sunrise: raw.localize(sunrise),
                sunset: raw.localize(sunset),
                precipitation: units.precipitation(value_at(&daily.precipitation_sum, i)),
                wind_speed: units.wind_speed(value_at(&daily.windspeed_10m_max, i)),
                wind_direction: value_at(&daily.winddirection_10m_dominant, i),
                uv_index: daily
                    .uv_index_max
                    .as_deref()
                    .map(|uv| value_at(uv, i))
                    .unwrap_or(0.0),
            })
        })
        .collect()
}

/// Chart bounds over all daily minima and maxima, padded by two degrees.
pub fn temperature_range(daily: &[DerivedDaily]) -> TemperatureRange {
    let temps = daily.iter().flat_map(|d| [d.temp_min, d.temp_max]);
    let (Some(min), Some(max)) = (temps.clone().min(), temps.max()) else {
        return TemperatureRange::default();
    };
    TemperatureRange {
        min: min - RANGE_PADDING,
        max: max + RANGE_PADDING,
    }
}

/// Whether `now` falls within today's sunrise-sunset window. Defaults to day
/// when there is nothing to compare against.
pub fn is_daytime_now(
    current: Option<&DerivedCurrent>,
    daily: &[DerivedDaily],
    now: DateTime<Utc>,
) -> bool {
    let (Some(_), Some(today)) = (current, daily.first()) else {
        return true;
    };
    now >= today.sunrise.with_timezone(&Utc) && now <= today.sunset.with_timezone(&Utc)
}

/// Background gradient for the current conditions. The band always comes
/// from the Celsius source value, whatever the display unit.
pub fn background_gradient(current: Option<&DerivedCurrent>, is_day: bool) -> Gradient {
    match current {
        None => Gradient::Default,
        Some(current) => Gradient::Band {
            band: TemperatureBand::from_celsius(current.temperature_celsius),
            is_day,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PrecipitationUnit, TemperatureUnit};
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    fn local(at: DateTime<Utc>) -> String {
        at.naive_utc().format("%Y-%m-%dT%H:%M").to_string()
    }

    fn forecast(hourly_times: &[DateTime<Utc>], daily: &[(f64, f64)]) -> RawForecast {
        let n = hourly_times.len();
        let days = daily.len();
        let dates: Vec<String> = (0..days)
            .map(|d| (now().date_naive() + Duration::days(d as i64)).to_string())
            .collect();
        let sunrise: Vec<String> = (0..days)
            .map(|d| format!("{}T05:00", now().date_naive() + Duration::days(d as i64)))
            .collect();
        let sunset: Vec<String> = (0..days)
            .map(|d| format!("{}T19:00", now().date_naive() + Duration::days(d as i64)))
            .collect();
        serde_json::from_value(json!({
            "latitude": 52.52,
            "longitude": 13.41,
            "utc_offset_seconds": 0,
            "current": {
                "time": local(now()),
                "temperature_2m": 25.0,
                "windspeed_10m": 10.0,
                "winddirection_10m": 180,
                "weather_code": 82
            },
            "hourly": {
                "time": hourly_times.iter().map(|t| local(*t)).collect::<Vec<_>>(),
                "temperature_2m": vec![20.0; n],
                "precipitation_probability": vec![5; n],
                "windspeed_10m": vec![10.0; n],
                "winddirection_10m": vec![90; n],
                "weather_code": vec![1; n]
            },
            "daily": {
                "time": dates,
                "weather_code": vec![3; days],
                "temperature_2m_max": daily.iter().map(|d| d.1).collect::<Vec<_>>(),
                "temperature_2m_min": daily.iter().map(|d| d.0).collect::<Vec<_>>(),
                "sunrise": sunrise,
                "sunset": sunset,
                "precipitation_sum": vec![0.2; days],
                "windspeed_10m_max": vec![20.0; days],
                "winddirection_10m_dominant": vec![270; days]
            }
        }))
        .unwrap()
    }

    fn location() -> Coordinate {
        Coordinate::named(52.52, 13.41, "Berlin")
    }

    #[test]
    fn test_hourly_window_keeps_next_24_hours() {
        let times = [
            now() - Duration::hours(1),
            now() + Duration::hours(1),
            now() + Duration::hours(23),
            now() + Duration::hours(25),
        ];
        let raw = forecast(&times, &[(10.0, 20.0)]);
        let series = hourly_series(Some(&raw), UnitPreferences::default(), now());
        let kept: Vec<_> = series.iter().map(|h| h.time.with_timezone(&Utc)).collect();
        assert_eq!(kept, vec![times[1], times[2]]);
    }

    #[test]
    fn test_hourly_window_is_inclusive_at_both_ends() {
        let times = [now(), now() + Duration::hours(24)];
        let raw = forecast(&times, &[(10.0, 20.0)]);
        assert_eq!(hourly_series(Some(&raw), UnitPreferences::default(), now()).len(), 2);
    }

    #[test]
    fn test_hourly_respects_utc_offset() {
        let mut raw = forecast(&[now() + Duration::hours(1)], &[(10.0, 20.0)]);
        // Same wall-clock time, but three hours ahead of UTC: the entry is two hours in the past.
        raw.utc_offset_seconds = 3 * 3600;
        assert!(hourly_series(Some(&raw), UnitPreferences::default(), now()).is_empty());
    }

    #[test]
    fn test_no_raw_data_yields_empty_series() {
        assert!(hourly_series(None, UnitPreferences::default(), now()).is_empty());
        assert!(daily_series(None, UnitPreferences::default()).is_empty());
        assert!(current_conditions(None, Some(&location()), UnitPreferences::default(), now())
            .is_none());
    }

    #[test]
    fn test_current_conditions_need_location() {
        let raw = forecast(&[], &[(10.0, 20.0)]);
        assert!(current_conditions(Some(&raw), None, UnitPreferences::default(), now()).is_none());
    }

    #[test]
    fn test_daily_series_keeps_every_day() {
        let days = [(1.0, 2.0); 7];
        let raw = forecast(&[], &days);
        let series = daily_series(Some(&raw), UnitPreferences::default());
        assert_eq!(series.len(), 7);
        assert_eq!(series[0].date, now().date_naive());
        assert_eq!(series[0].uv_index, 0.0);
        assert_eq!(series[6].wind_direction, 270.0);
    }

    #[test]
    fn test_daily_uv_index_nulls_read_as_zero() {
        let mut raw = forecast(&[], &[(1.0, 2.0), (3.0, 4.0)]);
        if let Some(daily) = raw.daily.as_mut() {
            daily.uv_index_max = Some(vec![Some(5.5), None]);
        }
        let series = daily_series(Some(&raw), UnitPreferences::default());
        assert_eq!(series[0].uv_index, 5.5);
        assert_eq!(series[1].uv_index, 0.0);
    }

    #[test]
    fn test_daily_converts_units() {
        let raw = forecast(&[], &[(0.0, 25.0)]);
        let units = UnitPreferences {
            temperature: TemperatureUnit::Fahrenheit,
            ..UnitPreferences::default()
        };
        let series = daily_series(Some(&raw), units);
        assert_eq!(series[0].temp_min, 32);
        assert_eq!(series[0].temp_max, 77);
    }

    #[test]
    fn test_daily_precipitation_in_inches() {
        let mut raw = forecast(&[], &[(1.0, 2.0), (3.0, 4.0)]);
        if let Some(daily) = raw.daily.as_mut() {
            daily.precipitation_sum = vec![Some(25.4), Some(5.0)];
        }
        let inches = UnitPreferences {
            precipitation: PrecipitationUnit::Inch,
            ..UnitPreferences::default()
        };
        let series = daily_series(Some(&raw), inches);
        assert_eq!(series[0].precipitation, 1.0);
        assert_eq!(series[1].precipitation, 0.2);

        let series = daily_series(Some(&raw), UnitPreferences::default());
        assert_eq!(series[0].precipitation, 25.4);
    }

    #[test]
    fn test_temperature_range_pads_outward() {
        let raw = forecast(&[], &[(10.0, 20.0), (5.0, 25.0)]);
        let series = daily_series(Some(&raw), UnitPreferences::default());
        assert_eq!(temperature_range(&series), TemperatureRange { min: 3, max: 27 });
    }

    #[test]
    fn test_temperature_range_default_when_empty() {
        assert_eq!(temperature_range(&[]), TemperatureRange { min: 0, max: 30 });
    }

    #[test]
    fn test_current_conditions_day_and_night() {
        let raw = forecast(&[], &[(10.0, 20.0)]);
        let units = UnitPreferences::default();
        let noon = current_conditions(Some(&raw), Some(&location()), units, now()).unwrap();
        assert!(noon.condition.is_day);
        assert_eq!(noon.condition.description, "Violent rain showers");

        let midnight = now() + Duration::hours(11);
        let late = current_conditions(Some(&raw), Some(&location()), units, midnight).unwrap();
        assert!(!late.condition.is_day);
    }

    #[test]
    fn test_current_conditions_default_to_day_without_daily() {
        let mut raw = forecast(&[], &[(10.0, 20.0)]);
        raw.daily = None;
        let late = now() + Duration::hours(11);
        let current =
            current_conditions(Some(&raw), Some(&location()), UnitPreferences::default(), late)
                .unwrap();
        assert!(current.condition.is_day);
    }

    #[test]
    fn test_is_daytime_now() {
        let raw = forecast(&[], &[(10.0, 20.0)]);
        let units = UnitPreferences::default();
        let current = current_conditions(Some(&raw), Some(&location()), units, now());
        let daily = daily_series(Some(&raw), units);

        assert!(is_daytime_now(current.as_ref(), &daily, now()));
        assert!(!is_daytime_now(
            current.as_ref(),
            &daily,
            now() + Duration::hours(8)
        ));
        assert!(is_daytime_now(None, &daily, now() + Duration::hours(8)));
        assert!(is_daytime_now(current.as_ref(), &[], now() + Duration::hours(8)));
    }

    #[test]
    fn test_gradient_boundary_ignores_display_unit() {
        let raw = forecast(&[], &[(10.0, 20.0)]);
        let units = UnitPreferences {
            temperature: TemperatureUnit::Fahrenheit,
            ..UnitPreferences::default()
        };
        let current = current_conditions(Some(&raw), Some(&location()), units, now()).unwrap();
        assert_eq!(current.temperature, 77);
        assert_eq!(
            background_gradient(Some(&current), true),
            Gradient::Band {
                band: TemperatureBand::Warm,
                is_day: true
            }
        );
    }

    #[test]
    fn test_gradient_default_without_current() {
        assert_eq!(background_gradient(None, false), Gradient::Default);
        assert_eq!(
            background_gradient(None, false).token(),
            "from-cyan-400 via-teal-500 to-blue-600"
        );
    }

    #[test]
    fn test_wind_speed_in_mph() {
        let raw = forecast(&[now() + Duration::hours(2)], &[(10.0, 20.0)]);
        let units = UnitPreferences {
            windspeed: crate::types::WindSpeedUnit::Mph,
            ..UnitPreferences::default()
        };
        let current = current_conditions(Some(&raw), Some(&location()), units, now()).unwrap();
        assert_eq!(current.wind_speed, 6);
        let hourly = hourly_series(Some(&raw), units, now());
        assert_eq!(hourly[0].wind_speed, 6);
    }
}
