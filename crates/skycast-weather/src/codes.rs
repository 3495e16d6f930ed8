//! WMO weather code table.
//! See: https://open-meteo.com/en/docs#weathervariables

use crate::types::WeatherCondition;

/// Description plus day and night icon keys (Meteocons names)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeInfo {
    pub description: &'static str,
    pub day_icon: &'static str,
    pub night_icon: &'static str,
}

const fn info(
    description: &'static str,
    day_icon: &'static str,
    night_icon: &'static str,
) -> CodeInfo {
    CodeInfo {
        description,
        day_icon,
        night_icon,
    }
}

const CLEAR_SKY: CodeInfo = info("Clear sky", "clear-day", "clear-night");

/// Look up a known code. Returns `None` for codes outside the table.
pub fn lookup(code: i32) -> Option<CodeInfo> {
    let entry = match code {
        0 => CLEAR_SKY,
        1 => info("Mainly clear", "partly-cloudy-day", "partly-cloudy-night"),
        2 => info("Partly cloudy", "partly-cloudy-day", "partly-cloudy-night"),
        3 => info("Overcast", "cloudy", "cloudy"),
        45 => info("Fog", "fog-day", "fog-night"),
        48 => info("Depositing rime fog", "fog-day", "fog-night"),
        51 => info(
            "Light drizzle",
            "partly-cloudy-day-drizzle",
            "partly-cloudy-night-drizzle",
        ),
        53 => info("Moderate drizzle", "drizzle", "drizzle"),
        55 => info("Dense drizzle", "drizzle", "drizzle"),
        56 => info(
            "Light freezing drizzle",
            "partly-cloudy-day-sleet",
            "partly-cloudy-night-sleet",
        ),
        57 => info("Dense freezing drizzle", "sleet", "sleet"),
        61 => info(
            "Slight rain",
            "partly-cloudy-day-rain",
            "partly-cloudy-night-rain",
        ),
        63 => info("Moderate rain", "rain", "rain"),
        65 => info("Heavy rain", "rain", "rain"),
        66 => info(
            "Light freezing rain",
            "partly-cloudy-day-sleet",
            "partly-cloudy-night-sleet",
        ),
        67 => info("Heavy freezing rain", "sleet", "sleet"),
        71 => info(
            "Slight snow fall",
            "partly-cloudy-day-snow",
            "partly-cloudy-night-snow",
        ),
        73 => info("Moderate snow fall", "snow", "snow"),
        75 => info("Heavy snow fall", "snow", "snow"),
        77 => info("Snow grains", "snow", "snow"),
        80 => info(
            "Slight rain showers",
            "partly-cloudy-day-rain",
            "partly-cloudy-night-rain",
        ),
        81 => info("Moderate rain showers", "rain", "rain"),
        82 => info(
            "Violent rain showers",
            "thunderstorms-rain",
            "thunderstorms-rain",
        ),
        85 => info(
            "Slight snow showers",
            "partly-cloudy-day-snow",
            "partly-cloudy-night-snow",
        ),
        86 => info("Heavy snow showers", "snow", "snow"),
        95 => info("Thunderstorm", "thunderstorms-day", "thunderstorms-night"),
        96 => info(
            "Thunderstorm with slight hail",
            "thunderstorms-day-hail",
            "thunderstorms-night-hail",
        ),
        99 => info(
            "Thunderstorm with heavy hail",
            "thunderstorms-day-hail",
            "thunderstorms-night-hail",
        ),
        _ => return None,
    };
    Some(entry)
}

/// Map a weather code to its condition. Unknown codes use the clear-sky entry
/// but keep their own code.
pub fn condition(code: i32, is_day: bool) -> WeatherCondition {
    let entry = lookup(code).unwrap_or(CLEAR_SKY);
    WeatherCondition {
        code,
        description: entry.description,
        icon: if is_day {
            entry.day_icon
        } else {
            entry.night_icon
        },
        is_day,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWN: [i32; 28] = [
        0, 1, 2, 3, 45, 48, 51, 53, 55, 56, 57, 61, 63, 65, 66, 67, 71, 73, 75, 77, 80, 81, 82,
        85, 86, 95, 96, 99,
    ];

    #[test]
    fn test_every_known_code_resolves() {
        for code in KNOWN {
            assert!(lookup(code).is_some(), "code {} missing", code);
        }
    }

    #[test]
    fn test_violent_rain_showers() {
        let c = condition(82, true);
        assert_eq!(c.description, "Violent rain showers");
        assert_eq!(c.icon, "thunderstorms-rain");
    }

    #[test]
    fn test_unknown_code_falls_back_to_clear_sky() {
        assert!(lookup(999).is_none());
        let c = condition(999, true);
        assert_eq!(c.description, "Clear sky");
        assert_eq!(c.icon, "clear-day");
        assert_eq!(c.code, 999);
    }

    #[test]
    fn test_night_icon() {
        assert_eq!(condition(0, false).icon, "clear-night");
        assert_eq!(condition(95, false).icon, "thunderstorms-night");
        assert!(!condition(95, false).is_day);
    }

    #[test]
    fn test_gaps_between_codes_are_unknown() {
        assert!(lookup(4).is_none());
        assert!(lookup(60).is_none());
        assert!(lookup(-1).is_none());
    }
}
