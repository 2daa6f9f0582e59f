//! HTTP test harness.
//!
//! Provides a test server backed by the in-memory record store and index
//! service of `meilisync-engine`.

use std::sync::Arc;
use std::time::Duration;

use axum_test::{TestRequest, TestServer};
use serde_json::Value;

use meilisync_engine::backends::memory::{MemoryIndex, MemoryIndexFactory, MemoryStore};
use meilisync_engine::{SyncEngine, SyncEngineConfig};
use meilisync_rest::{ServerConfig, create_app_with_config};

use super::fixtures::ADMIN_TOKEN;

/// Test harness for the HTTP boundary.
///
/// # Example
///
/// ```rust,ignore
/// let app = TestApp::with_settings(settings(json!([published_only("posts")]))).await;
/// let response = app.admin_post("/meilisearch/reindex").await;
/// response.assert_status_ok();
/// ```
pub struct TestApp {
    /// The test server instance.
    pub server: TestServer,
    /// Records and the settings record.
    pub store: Arc<MemoryStore>,
    /// The index service.
    pub index: Arc<MemoryIndex>,
    /// The engine behind the server.
    pub engine: Arc<SyncEngine>,
}

impl TestApp {
    /// Creates a server with the testing configuration and no settings record.
    pub async fn new() -> Self {
        Self::with_config(ServerConfig::for_testing()).await
    }

    /// Creates a server with the given configuration.
    pub async fn with_config(config: ServerConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let factory = Arc::new(MemoryIndexFactory::new());
        let index = factory.index();
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            store.clone(),
            factory,
            SyncEngineConfig::default(),
        ));
        engine.initialize().await;

        let app = create_app_with_config(Arc::clone(&engine), config);
        let server = TestServer::new(app).expect("Failed to create test server");

        Self {
            server,
            store,
            index,
            engine,
        }
    }

    /// Creates a server whose engine has loaded `settings`.
    pub async fn with_settings(settings: Value) -> Self {
        let app = Self::new().await;
        app.store.set_settings(settings);
        app.engine.initialize().await;
        app
    }

    /// A POST request carrying the admin token.
    pub fn admin_post(&self, path: &str) -> TestRequest {
        self.server
            .post(path)
            .authorization_bearer(ADMIN_TOKEN)
    }

    /// Waits until no reindex is running.
    pub async fn wait_for_reindex(&self) {
        for _ in 0..500 {
            if !self.engine.is_reindexing() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("reindex did not finish in time");
    }
}
