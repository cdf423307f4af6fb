//! Combined geocode-and-lookup endpoint.

use axum::{extract::State, response::IntoResponse, Json};

use super::api_types::{bad_request, OzCheckRequest};
use crate::AppState;

/// Check an address or coordinate pair against the OZ table.
#[utoipa::path(
    post,
    path = "/api/oz-check",
    request_body = OzCheckRequest,
    responses(
        (status = 200, description = "Check result: `{success, address?, coordinates?, geoid?, isOpportunityZone?, censusData?, matchedAddress?, error?, errorKind?}`"),
        (status = 400, description = "Neither an address nor coordinates were given")
    ),
    tag = "Opportunity Zones"
)]
pub async fn oz_check(
    State(state): State<AppState>,
    Json(request): Json<OzCheckRequest>,
) -> impl IntoResponse {
    let result = match request {
        OzCheckRequest {
            lat: Some(lat),
            lng: Some(lng),
            ..
        } => state.checker.check_coordinates(lat, lng).await,
        OzCheckRequest {
            address: Some(address),
            ..
        } if !address.trim().is_empty() => state.checker.check_address(address.trim()).await,
        _ => return bad_request("An address or lat/lng coordinates are required"),
    };

    if let Some(e) = result.error() {
        tracing::debug!("OZ check failed: {}", e);
    }
    Json(result).into_response()
}
