//! Reverse geocoding: convert coordinates to a place name and country code.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

use crate::types::{Coordinate, WeatherError};

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
pub const DEFAULT_USER_AGENT: &str = "Skycast/0.1.0";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const UNKNOWN_PLACE: &str = "Unknown Location";
const DEFAULT_COUNTRY: &str = "US";

/// A resolved place
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Place {
    pub city_name: String,
    /// ISO 3166-1 alpha-2, uppercase
    pub country_code: String,
}

#[async_trait]
pub trait PlaceLookup: Send + Sync {
    async fn reverse(&self, coordinate: &Coordinate) -> Result<Place, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    display_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    country_code: Option<String>,
}

impl NominatimResponse {
    fn into_place(self) -> Place {
        let address = self.address.unwrap_or_default();
        let from_display = self
            .display_name
            .as_deref()
            .and_then(|d| d.split(',').next())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from);

        // Prefer city > town > village > municipality > county
        let city_name = address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.municipality)
            .or(address.county)
            .or(from_display)
            .unwrap_or_else(|| UNKNOWN_PLACE.to_string());

        let country_code = address
            .country_code
            .filter(|c| !c.is_empty())
            .map(|c| c.to_uppercase())
            .unwrap_or_else(|| DEFAULT_COUNTRY.to_string());

        Place {
            city_name,
            country_code,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: Url,
}

impl NominatimClient {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(
            NOMINATIM_URL,
            DEFAULT_USER_AGENT,
            Duration::from_secs(REQUEST_TIMEOUT_SECS),
        )
    }

    /// Nominatim requires an identifying User-Agent on every request.
    pub fn with_base_url(
        base_url: &str,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(base_url)?,
        })
    }

    fn reverse_url(&self, coordinate: &Coordinate) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("lat", &coordinate.latitude.to_string())
            .append_pair("lon", &coordinate.longitude.to_string())
            .append_pair("zoom", "10")
            .append_pair("addressdetails", "1");
        url
    }
}

#[async_trait]
impl PlaceLookup for NominatimClient {
    async fn reverse(&self, coordinate: &Coordinate) -> Result<Place, WeatherError> {
        let response = self
            .client
            .get(self.reverse_url(coordinate))
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("Reverse geocode request failed: {}", e);
                e
            })?;

        if !response.status().is_success() {
            tracing::debug!("Reverse geocode returned status {}", response.status());
            return Err(WeatherError::Status(response.status().as_u16()));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let place = body.into_place();
        tracing::info!("Reverse geocoded to: {} ({})", place.city_name, place.country_code);
        Ok(place)
    }
}
