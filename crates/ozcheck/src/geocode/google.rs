//! Google Geocoding API, used as a fallback locator.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::Coordinates;
use crate::error::GeocodeError;

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
struct GoogleGeometry {
    location: Coordinates,
}

/// Resolves an address to a point. It does not know census tracts; callers
/// reverse-geocode the point through the Census geocoder.
#[derive(Clone)]
pub struct GoogleGeocoder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl GoogleGeocoder {
    pub fn new(client: Client, base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
        }
    }

    pub async fn locate(&self, address: &str) -> Result<Coordinates, GeocodeError> {
        let url = format!(
            "{}/maps/api/geocode/json?address={}&key={}",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(address),
            urlencoding::encode(&self.api_key)
        );
        debug!("Trying Google Geocoding API as fallback...");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!("Google geocoding HTTP error: {}", status);
            return Err(GeocodeError::Failed(format!(
                "Google API error: {}",
                status.canonical_reason().unwrap_or(status.as_str())
            )));
        }

        let data: GoogleResponse = response.json().await?;
        match data.results.first() {
            Some(result) if data.status == "OK" => Ok(result.geometry.location),
            _ => Err(GeocodeError::Failed(format!(
                "Google geocoding failed: {}",
                data.status
            ))),
        }
    }
}
