//! The static GEOID lookup resource.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::AppState;

/// Serve `{ "geoids": [...] }` from the loaded table.
#[utoipa::path(
    get,
    path = "/data/oz-geoid-minimal.json",
    responses(
        (status = 200, description = "OZ tract GEOIDs as `{ \"geoids\": [...] }`"),
        (status = 503, description = "Lookup data could not be loaded")
    ),
    tag = "Opportunity Zones"
)]
pub async fn geoid_resource(State(state): State<AppState>) -> impl IntoResponse {
    let set = match state.checker.initialize().await {
        Ok(set) => set,
        Err(e) => return (StatusCode::SERVICE_UNAVAILABLE, e.to_string()).into_response(),
    };

    let mut body = Vec::new();
    if let Err(e) = ozcheck::data::write_minimal(set.geoids(), &mut body) {
        return (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response();
    }

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json"),
            (header::CACHE_CONTROL, "public, max-age=86400"),
        ],
        body,
    )
        .into_response()
}
