//! Census-geocoder proxy endpoint.

use axum::{body::Bytes, extract::State, response::IntoResponse, Json};

use ozcheck::{Coordinates, ErrorKind, GeocodeResult, Geocoder, GeocodeError};

use super::api_types::{bad_request, GeocoderRequest, GeocoderResponse};
use crate::AppState;

const NO_GEOID: &str = "Could not determine census tract GEOID";

/// Forward or reverse geocode through the Census API.
#[utoipa::path(
    post,
    path = "/api/census-geocoder",
    request_body = GeocoderRequest,
    responses(
        (status = 200, description = "Geocoding outcome; `success` is false on failure", body = GeocoderResponse),
        (status = 400, description = "Missing address or malformed body", body = GeocoderResponse)
    ),
    tag = "Geocoding"
)]
pub async fn census_geocoder(State(state): State<AppState>, body: Bytes) -> impl IntoResponse {
    let request: GeocoderRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!("Census geocoder error: {}", e);
            return bad_request(format!("Invalid request body: {}", e));
        }
    };

    let outcome = match request {
        GeocoderRequest {
            reverse_geocode: true,
            lat: Some(lat),
            lng: Some(lng),
            ..
        } => state.geocoder.reverse_geocode(Coordinates::new(lat, lng)).await,
        GeocoderRequest {
            address: Some(address),
            ..
        } if !address.trim().is_empty() => state.geocoder.geocode_address(&address).await,
        _ => return bad_request("Address is required for forward geocoding"),
    };

    Json(respond(outcome)).into_response()
}

fn respond(outcome: Result<GeocodeResult, GeocodeError>) -> GeocoderResponse {
    match outcome {
        Ok(result) if result.geoid.is_some() => GeocoderResponse::ok(result),
        Ok(_) => GeocoderResponse::failure(NO_GEOID, Some(ErrorKind::Failed)),
        Err(e) => {
            tracing::debug!("Geocoding failed: {}", e);
            e.into()
        }
    }
}
