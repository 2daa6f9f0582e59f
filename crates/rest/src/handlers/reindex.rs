//! Manual reindex endpoint.

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use meilisync_engine::ReindexStart;
use serde_json::json;
use tracing::info;

use crate::error::RestResult;
use crate::extractors::AdminAccess;
use crate::state::AppState;

/// Handler for the manual reindex trigger.
///
/// Re-reads the settings record and launches a full reindex in the
/// background. The response does not wait for the reindex to finish.
///
/// # HTTP Request
///
/// `POST [base]/meilisearch/reindex`
///
/// # Response
///
/// - `200 OK` - Reindex started, or one is already running
/// - `400 Bad Request` - Host or API key missing from the settings
/// - `403 Forbidden` - Caller is not an administrator
/// - `404 Not Found` - Settings record does not exist
/// - `500 Internal Server Error` - Settings record could not be read
pub async fn reindex_handler(
    _admin: AdminAccess,
    State(state): State<AppState>,
) -> RestResult<Response> {
    let message = match state.engine().start_manual_reindex().await? {
        ReindexStart::Started(_) => {
            info!("Reindex started from the admin endpoint");
            "Reindexing started in background."
        }
        ReindexStart::AlreadyRunning => "Reindexing already in progress.",
    };

    Ok((StatusCode::OK, Json(json!({ "message": message }))).into_response())
}
