//! Application state shared by every handler.

use std::sync::Arc;

use meilisync_engine::SyncEngine;

use crate::config::ServerConfig;

/// Shared application state.
///
/// Holds the sync engine and the server configuration. Cloning is cheap:
/// both are reference counted.
///
/// # Example
///
/// ```rust,ignore
/// use meilisync_rest::{AppState, ServerConfig};
///
/// let state = AppState::new(engine, ServerConfig::default());
/// ```
#[derive(Clone)]
pub struct AppState {
    engine: Arc<SyncEngine>,
    config: Arc<ServerConfig>,
}

impl AppState {
    /// Creates a new AppState.
    pub fn new(engine: Arc<SyncEngine>, config: ServerConfig) -> Self {
        Self {
            engine,
            config: Arc::new(config),
        }
    }

    /// Returns the sync engine.
    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    /// Returns the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Returns the configured admin token, if any.
    pub fn admin_token(&self) -> Option<&str> {
        self.config.admin_token.as_deref()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("active", &self.engine.is_active())
            .field("reindexing", &self.engine.is_reindexing())
            .finish_non_exhaustive()
    }
}
