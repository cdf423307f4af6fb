//! Health and status endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};

use ozcheck::TractStats;

use crate::AppState;

/// Health check endpoint for container orchestration.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Server is healthy")
    ),
    tag = "Health"
)]
pub async fn health() -> impl IntoResponse {
    StatusCode::OK
}

/// Lookup table statistics.
#[utoipa::path(
    get,
    path = "/api/oz-stats",
    responses(
        (status = 200, description = "Loaded OZ table statistics", body = TractStats)
    ),
    tag = "Opportunity Zones"
)]
pub async fn oz_stats(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.checker.stats())
}
