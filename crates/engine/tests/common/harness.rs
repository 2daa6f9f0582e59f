//! Engine test harness.

use std::sync::Arc;

use serde_json::Value;

use meilisync_engine::backends::memory::{MemoryIndex, MemoryIndexFactory, MemoryStore};
use meilisync_engine::{SyncEngine, SyncEngineConfig};

/// An engine wired to an in-memory store and index service.
pub struct TestContext {
    /// Records and settings.
    pub store: Arc<MemoryStore>,
    /// Factory handing out `index`.
    pub factory: Arc<MemoryIndexFactory>,
    /// The index service every client talks to.
    pub index: Arc<MemoryIndex>,
    /// The engine under test.
    pub engine: Arc<SyncEngine>,
}

impl TestContext {
    /// Creates a context with default engine settings and no settings record.
    pub fn new() -> Self {
        Self::with_config(SyncEngineConfig::default())
    }

    /// Creates a context with the given engine settings.
    pub fn with_config(config: SyncEngineConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let factory = Arc::new(MemoryIndexFactory::new());
        let index = factory.index();
        let engine = Arc::new(SyncEngine::new(
            store.clone(),
            store.clone(),
            factory.clone(),
            config,
        ));

        Self {
            store,
            factory,
            index,
            engine,
        }
    }

    /// Installs a settings record and loads it into the engine.
    pub async fn with_settings(settings: Value) -> Self {
        let ctx = Self::new();
        ctx.store.set_settings(settings);
        ctx.engine.initialize().await;
        ctx
    }

    /// Resets the call counters of both backends.
    pub fn reset_calls(&self) {
        self.store.reset_calls();
        self.index.reset_calls();
    }
}
