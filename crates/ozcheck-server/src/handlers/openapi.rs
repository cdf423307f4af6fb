//! OpenAPI spec generation and serving.

use axum::{http::StatusCode, response::IntoResponse};
use utoipa::OpenApi;

use super::api;
use super::api_types;
use super::check;
use super::data;
use super::geocoder;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "ozcheck API",
        description = "Opportunity Zone membership checker"
    ),
    paths(
        api::health,
        api::oz_stats,
        geocoder::census_geocoder,
        check::oz_check,
        data::geoid_resource,
    ),
    components(schemas(
        api_types::GeocoderRequest,
        api_types::GeocoderResponse,
        api_types::OzCheckRequest,
        ozcheck::GeocodeResult,
        ozcheck::Coordinates,
        ozcheck::CensusData,
        ozcheck::ErrorKind,
        ozcheck::TractStats,
    )),
    tags(
        (name = "Health", description = "Health check"),
        (name = "Geocoding", description = "Census geocoder proxy"),
        (name = "Opportunity Zones", description = "OZ membership checks and lookup data"),
    )
)]
struct ApiDoc;

/// Serve the OpenAPI spec as JSON.
pub async fn openapi_spec() -> impl IntoResponse {
    let spec = ApiDoc::openapi()
        .to_json()
        .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e));
    (StatusCode::OK, [("content-type", "application/json")], spec)
}
