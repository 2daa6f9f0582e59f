//! In-memory backends.
//!
//! [`MemoryStore`] stands in for the record store and the settings record;
//! [`MemoryIndex`] stands in for the search service. Both count every call
//! they receive so tests can assert exactly how the engine used them.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use meilisync_engine::backends::memory::{MemoryIndexFactory, MemoryStore};
//! use meilisync_engine::{SyncEngine, SyncEngineConfig};
//! use serde_json::json;
//!
//! # tokio_test::block_on(async {
//! let store = Arc::new(MemoryStore::new());
//! store.set_settings(json!({
//!     "host": "http://localhost:7700",
//!     "api_key": "key",
//!     "collections_configuration": [{"collection": "articles"}]
//! }));
//! store.insert("articles", json!({"id": 1, "title": "Hello"}));
//!
//! let factory = Arc::new(MemoryIndexFactory::new());
//! let index = factory.index();
//! let engine = SyncEngine::new(store.clone(), store, factory, SyncEngineConfig::default());
//! engine.initialize().await;
//! engine.run_reindex().await;
//!
//! assert_eq!(index.documents("articles").len(), 1);
//! # });
//! ```

pub mod filter;
mod index;
mod store;

pub use index::{IndexCalls, MemoryIndex, MemoryIndexFactory};
pub use store::{MemoryStore, StoreCalls};
