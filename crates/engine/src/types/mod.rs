//! Core types for the synchronization engine.
//!
//! - [`SyncSettings`], [`IndexingConfiguration`] - The parsed settings record
//! - [`FlattenedDocument`] - The unit written to a search index
//! - [`RecordKey`] - Primary key of a source record
//! - [`TaskHandle`], [`TaskInfo`], [`TaskOutcome`] - Asynchronous index tasks
//!
//! # Example
//!
//! ```
//! use meilisync_engine::types::SyncSettings;
//! use serde_json::json;
//!
//! let settings = SyncSettings::from_record(&json!({
//!     "host": "http://localhost:7700",
//!     "api_key": "masterKey",
//!     "collections_configuration": [
//!         {"collection": "articles", "fields": ["*"], "preserveArrays": true}
//!     ],
//!     "force_reindex": false
//! }))
//! .unwrap();
//!
//! assert!(settings.is_active());
//! assert!(settings.collection("articles").unwrap().preserve_arrays);
//! ```

mod document;
mod key;
mod settings;
mod task;

pub use document::{COLLECTION_FIELD, FlattenedDocument};
pub use key::RecordKey;
pub use settings::{DEFAULT_PRIMARY_KEY, IndexingConfiguration, SyncSettings};
pub use task::{IndexInfo, TaskError, TaskHandle, TaskInfo, TaskOutcome, TaskStatus};
