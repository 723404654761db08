use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

use super::AppState;

/// Health check endpoint
/// Returns 200 OK if the service is running
pub async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "status": "healthy",
            "service": "pricing-desk",
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

/// Readiness check endpoint
/// Returns 200 OK once the pricing tables can be served, 503 otherwise
pub async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.tables().await {
        Ok(tables) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": "pricing-desk",
                "loaded_at": tables.loaded_at,
                "extras": tables.extras.len(),
            })),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "unavailable",
                "service": "pricing-desk",
                "reason": e.to_string(),
            })),
        ),
    }
}
