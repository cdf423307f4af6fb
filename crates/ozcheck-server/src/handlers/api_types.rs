//! Request and response bodies.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use ozcheck::{ErrorKind, GeocodeError, GeocodeResult};

/// Body of `POST /api/census-geocoder`.
///
/// `{ "address": "..." }` geocodes forward; `{ "lat", "lng",
/// "reverseGeocode": true }` reverse-geocodes.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeocoderRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub reverse_geocode: bool,
}

/// Proxy response envelope.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeocoderResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<GeocodeResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl GeocoderResponse {
    pub fn ok(data: GeocodeResult) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            error_kind: None,
        }
    }

    pub fn failure(message: impl Into<String>, kind: Option<ErrorKind>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            error_kind: kind,
        }
    }
}

impl From<GeocodeError> for GeocoderResponse {
    fn from(e: GeocodeError) -> Self {
        Self::failure(e.message(), Some(e.kind()))
    }
}

/// Body of `POST /api/oz-check`: an address or a coordinate pair.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OzCheckRequest {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// `{ "success": false, "error": "..." }` with a status code.
pub fn bad_request(message: impl Into<String>) -> axum::response::Response {
    (
        StatusCode::BAD_REQUEST,
        Json(GeocoderResponse::failure(message, None)),
    )
        .into_response()
}
