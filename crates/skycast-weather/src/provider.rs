//! Open-Meteo forecast client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;
use url::Url;

use crate::raw::{RawForecast, CURRENT_FIELDS, DAILY_FIELDS, HOURLY_FIELDS};
use crate::types::{Coordinate, WeatherError};

pub const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const FORECAST_DAYS: u32 = 7;

/// Anything that can produce a raw forecast for a coordinate
#[async_trait]
pub trait ForecastSource: Send + Sync {
    async fn fetch_forecast(&self, coordinate: &Coordinate) -> Result<RawForecast, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct WeatherProvider {
    client: Arc<Client>,
    base_url: Url,
}

impl WeatherProvider {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(OPEN_METEO_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    /// Client pointed at a custom endpoint (self-hosted Open-Meteo, test server)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: Url::parse(base_url)?,
        })
    }

    /// Full request URL for `coordinate`
    pub fn forecast_url(&self, coordinate: &Coordinate) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("latitude", &coordinate.latitude.to_string())
            .append_pair("longitude", &coordinate.longitude.to_string())
            .append_pair("current", &CURRENT_FIELDS.join(","))
            .append_pair("hourly", &HOURLY_FIELDS.join(","))
            .append_pair("daily", &DAILY_FIELDS.join(","))
            .append_pair("timezone", "auto")
            .append_pair("forecast_days", &FORECAST_DAYS.to_string());
        url
    }
}

#[async_trait]
impl ForecastSource for WeatherProvider {
    #[instrument(skip(self, coordinate), fields(lat = coordinate.latitude, lon = coordinate.longitude))]
    async fn fetch_forecast(&self, coordinate: &Coordinate) -> Result<RawForecast, WeatherError> {
        let url = self.forecast_url(coordinate);
        tracing::debug!("Fetching forecast from {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!("Forecast request failed with status {}", status);
            return Err(WeatherError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        RawForecast::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_url_carries_all_parameters() {
        let provider = WeatherProvider::new().unwrap();
        let url = provider.forecast_url(&Coordinate::new(52.52, 13.41));
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.host_str(), Some("api.open-meteo.com"));
        assert_eq!(pairs["latitude"], "52.52");
        assert_eq!(pairs["longitude"], "13.41");
        assert_eq!(pairs["timezone"], "auto");
        assert_eq!(pairs["forecast_days"], "7");
        assert_eq!(pairs["current"].split(',').count(), 8);
        assert_eq!(pairs["hourly"].split(',').count(), 5);
        assert_eq!(pairs["daily"].split(',').count(), 9);
        assert!(pairs["daily"].contains("uv_index_max"));
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = WeatherProvider::with_base_url("not a url", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, WeatherError::InvalidUrl(_)));
    }
}
