//! Router configuration for the web server.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Geocoder proxy used by ProxyGeocoder clients
        .route("/api/census-geocoder", post(handlers::census_geocoder))
        .route("/api/oz-check", post(handlers::oz_check))
        .route("/api/oz-stats", get(handlers::oz_stats))
        .route("/api/openapi.json", get(handlers::openapi_spec))
        .route("/data/oz-geoid-minimal.json", get(handlers::geoid_resource))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
