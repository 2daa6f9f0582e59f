//! Sync route configuration.

use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

/// Creates all routes.
///
/// # Routes
///
/// ## Open
/// - `GET /health` - Health check
/// - `GET /_liveness` - Liveness probe
///
/// ## Admin only
/// - `POST /meilisearch/reindex` - Manual full reindex
/// - `POST /hooks/settings` - Settings record updated
/// - `POST /hooks/items/create` - Record created
/// - `POST /hooks/items/update` - Records updated
/// - `POST /hooks/items/delete` - Records deleted
pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/_liveness", get(handlers::liveness_handler))
        .route("/meilisearch/reindex", post(handlers::reindex_handler))
        .route("/hooks/settings", post(handlers::settings_hook))
        .route("/hooks/items/create", post(handlers::create_hook))
        .route("/hooks/items/update", post(handlers::update_hook))
        .route("/hooks/items/delete", post(handlers::delete_hook))
        .with_state(state)
}
