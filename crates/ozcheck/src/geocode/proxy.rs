//! Client for the census-geocoder proxy endpoint.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{Coordinates, GeocodeResult, Geocoder};
use crate::error::{ErrorKind, GeocodeError};

/// Proxy request body.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ProxyRequest<'a> {
    Forward {
        address: &'a str,
    },
    Reverse {
        lat: f64,
        lng: f64,
        #[serde(rename = "reverseGeocode")]
        reverse_geocode: bool,
    },
}

/// Proxy response envelope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProxyResponse {
    success: bool,
    #[serde(default)]
    data: Option<GeocodeResult>,
    #[serde(default)]
    error: Option<String>,
    /// Structured failure kind. Older proxies only send `error`.
    #[serde(default)]
    error_kind: Option<ErrorKind>,
}

/// Geocoder that delegates to a proxy such as `POST /api/census-geocoder`.
#[derive(Clone)]
pub struct ProxyGeocoder {
    client: Client,
    endpoint: String,
}

impl ProxyGeocoder {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn post(
        &self,
        body: &ProxyRequest<'_>,
        failure_label: &str,
    ) -> Result<GeocodeResult, GeocodeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(body)
            .send()
            .await
            .inspect_err(|e| error!("Geocoding error: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            error!("Geocoding proxy returned HTTP {}", status);
            return Err(GeocodeError::Unavailable(format!(
                "{}: {}",
                failure_label,
                status.as_u16()
            )));
        }

        let parsed: ProxyResponse = response.json().await?;
        if !parsed.success {
            let message = parsed.error.unwrap_or_else(|| failure_label.to_string());
            let err = match parsed.error_kind {
                Some(kind) => GeocodeError::from_kind(kind, message),
                None => GeocodeError::classify(&message),
            };
            debug!("Geocoding proxy reported {:?}", err);
            return Err(err);
        }

        parsed
            .data
            .ok_or_else(|| GeocodeError::Failed("Geocoding response missing data".to_string()))
    }
}

#[async_trait]
impl Geocoder for ProxyGeocoder {
    async fn geocode_address(&self, address: &str) -> Result<GeocodeResult, GeocodeError> {
        debug!("Geocoding address: {}", address);
        self.post(&ProxyRequest::Forward { address }, "Geocoding failed")
            .await
    }

    async fn reverse_geocode(&self, coords: Coordinates) -> Result<GeocodeResult, GeocodeError> {
        debug!("Reverse geocoding: {}, {}", coords.lat, coords.lng);
        let body = ProxyRequest::Reverse {
            lat: coords.lat,
            lng: coords.lng,
            reverse_geocode: true,
        };
        self.post(&body, "Reverse geocoding failed").await
    }
}
