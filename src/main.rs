use anyhow::Result;
use chrono::Utc;
use std::fmt::Write as _;

use skycast_core::App;
use skycast_weather::{codes, DashboardView};

#[tokio::main]
async fn main() -> Result<()> {
    skycast_core::init()?;

    let watch = match std::env::args().nth(1).as_deref() {
        None => false,
        Some("watch") => true,
        Some(other) => anyhow::bail!("Unknown command: {} (expected `watch`)", other),
    };

    let app = App::new()?;
    app.initialize().await?;

    tracing::info!("Skycast started");
    println!("{}", render(&app.context().view(Utc::now()))?);

    if watch {
        let mut changes = app.context().subscribe();
        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => break,
                changed = changes.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let view = app.context().view(Utc::now());
                    if !view.is_loading {
                        println!("{}", render(&view)?);
                    }
                }
            }
        }
    }

    app.shutdown()?;
    Ok(())
}

fn render(view: &DashboardView) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let units = view.units;
    let t = units.temperature.symbol();
    let w = units.windspeed.symbol();

    let place = view
        .location
        .as_ref()
        .map(|l| l.display_name())
        .unwrap_or_else(|| "Locating...".to_string());
    writeln!(out, "== {} ==", place)?;

    if let Some(error) = &view.last_error {
        writeln!(out, "! {}", error)?;
    }

    match &view.current {
        Some(current) => {
            writeln!(
                out,
                "{}{}  {}  wind {} {} from {:.0}°",
                current.temperature,
                t,
                current.condition.description,
                current.wind_speed,
                w,
                current.wind_direction
            )?;
            if let Some(humidity) = current.humidity {
                writeln!(out, "humidity {:.0}%", humidity)?;
            }
        }
        None if view.is_loading => {
            writeln!(out, "Loading...")?;
        }
        None => {
            writeln!(out, "No data")?;
        }
    }

    if !view.hourly.is_empty() {
        writeln!(out, "\nNext 24 hours")?;
        for hour in view.hourly.iter().step_by(3) {
            writeln!(
                out,
                "  {}  {:>4}{}  {:>3.0}%  {}",
                hour.time.format("%H:%M"),
                hour.temperature,
                t,
                hour.precipitation_probability,
                codes::condition(hour.weather_code, true).description
            )?;
        }
    }

    if !view.daily.is_empty() {
        writeln!(
            out,
            "\n{}-day forecast ({}{} .. {}{})",
            view.daily.len(),
            view.temperature_range.min,
            t,
            view.temperature_range.max,
            t
        )?;
        for day in &view.daily {
            writeln!(
                out,
                "  {}  {:>4}{} / {:>4}{}  {:.1} {}  UV {:.0}  {}",
                day.date.format("%a %d"),
                day.temp_min,
                t,
                day.temp_max,
                t,
                day.precipitation,
                units.precipitation.symbol(),
                day.uv_index,
                codes::condition(day.weather_code, true).description
            )?;
        }
    }

    if let Some(updated) = view.last_updated {
        write!(
            out,
            "\nupdated {}  ({}, {})",
            updated.format("%H:%M:%S UTC"),
            if view.is_daytime { "day" } else { "night" },
            view.gradient.token()
        )?;
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_weather::WeatherContext;

    #[test]
    fn test_render_empty_dashboard() {
        let view = WeatherContext::default().view(Utc::now());
        let out = render(&view).unwrap();
        assert!(out.starts_with("== Locating... =="));
        assert!(out.contains("No data"));
        assert!(!out.contains("updated"));
    }
}
