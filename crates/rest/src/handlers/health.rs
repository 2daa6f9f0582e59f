//! Health check endpoint handler.
//!
//! Provides a simple health check endpoint for monitoring and load balancers.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::debug;

use crate::state::AppState;

/// Handler for the health check endpoint.
///
/// Always answers `200 OK`; an inactive engine is a valid steady state.
///
/// # HTTP Request
///
/// `GET [base]/health`
pub async fn health_handler(State(state): State<AppState>) -> Response {
    debug!("Processing health check request");

    let engine = state.engine();
    let health_response = serde_json::json!({
        "status": "healthy",
        "active": engine.is_active(),
        "reindexing": engine.is_reindexing(),
        "timestamp": chrono::Utc::now().to_rfc3339()
    });

    (StatusCode::OK, Json(health_response)).into_response()
}

/// Handler for a liveness probe.
///
/// # HTTP Request
///
/// `GET [base]/_liveness`
pub async fn liveness_handler() -> impl IntoResponse {
    StatusCode::OK
}
