//! Webhook handlers for record-store events.
//!
//! The record store calls these after its own writes have committed. Index
//! failures are logged by the engine and reported in the body; the status is
//! always `200 OK` so the store never retries or rolls back.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use meilisync_engine::{RecordKey, ReindexStart, SyncOutcome};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::RestResult;
use crate::extractors::AdminAccess;
use crate::state::AppState;

/// Payload of a create event.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateEvent {
    /// Collection the record was created in.
    pub collection: String,
    /// Key of the new record.
    pub key: RecordKey,
}

/// Payload of an update or delete event.
#[derive(Debug, Clone, Deserialize)]
pub struct KeysEvent {
    /// Collection the records belong to.
    pub collection: String,
    /// Keys of the affected records.
    pub keys: Vec<RecordKey>,
}

/// Body returned by the record event hooks.
#[derive(Debug, Clone, Serialize)]
pub struct EventResponse {
    /// Collection named by the event.
    pub collection: String,
    /// What the engine did.
    pub result: SyncOutcome,
}

/// State of the reindex requested by a settings update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReindexRequest {
    /// The update did not ask for a reindex.
    NotRequested,
    /// A reindex was launched.
    Started,
    /// A reindex was already running.
    AlreadyRunning,
}

/// Body returned by the settings hook.
#[derive(Debug, Clone, Serialize)]
pub struct SettingsResponse {
    /// Whether synchronization is active after the reload.
    pub active: bool,
    /// Number of configured collections after the reload.
    pub collections: usize,
    /// What happened to the reindex request.
    pub reindex: ReindexRequest,
}

/// `POST [base]/hooks/settings`
///
/// Reloads the configuration and launches a reindex when the payload sets
/// `force_reindex` to `true`.
pub async fn settings_hook(
    _admin: AdminAccess,
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> RestResult<Json<SettingsResponse>> {
    let Json(payload) = payload?;

    let reindex = match state.engine().on_settings_updated(&payload).await {
        None => ReindexRequest::NotRequested,
        Some(ReindexStart::Started(_)) => ReindexRequest::Started,
        Some(ReindexStart::AlreadyRunning) => ReindexRequest::AlreadyRunning,
    };
    let snapshot = state.engine().cache().current_or_inactive();

    Ok(Json(SettingsResponse {
        active: snapshot.is_active(),
        collections: snapshot.settings().collections.len(),
        reindex,
    }))
}

/// `POST [base]/hooks/items/create`
pub async fn create_hook(
    _admin: AdminAccess,
    State(state): State<AppState>,
    payload: Result<Json<CreateEvent>, JsonRejection>,
) -> RestResult<Json<EventResponse>> {
    let Json(event) = payload?;
    debug!(collection = %event.collection, key = %event.key, "Create event received");

    let result = state.engine().on_create(&event.collection, &event.key).await;
    Ok(Json(EventResponse {
        collection: event.collection,
        result,
    }))
}

/// `POST [base]/hooks/items/update`
pub async fn update_hook(
    _admin: AdminAccess,
    State(state): State<AppState>,
    payload: Result<Json<KeysEvent>, JsonRejection>,
) -> RestResult<Json<EventResponse>> {
    let Json(event) = payload?;
    debug!(collection = %event.collection, keys = event.keys.len(), "Update event received");

    let result = state.engine().on_update(&event.collection, &event.keys).await;
    Ok(Json(EventResponse {
        collection: event.collection,
        result,
    }))
}

/// `POST [base]/hooks/items/delete`
pub async fn delete_hook(
    _admin: AdminAccess,
    State(state): State<AppState>,
    payload: Result<Json<KeysEvent>, JsonRejection>,
) -> RestResult<Json<EventResponse>> {
    let Json(event) = payload?;
    debug!(collection = %event.collection, keys = event.keys.len(), "Delete event received");

    let result = state.engine().on_delete(&event.collection, &event.keys).await;
    Ok(Json(EventResponse {
        collection: event.collection,
        result,
    }))
}
