//! Meilisync Synchronization Engine
//!
//! This crate keeps Meilisearch indexes in step with collections stored in a
//! Directus instance. Each configured collection gets an index of the same
//! name, filled by a paged full reindex and kept current by create, update
//! and delete events.
//!
//! # Features
//!
//! - **Full reindex**: Pages every eligible record into its index, one batch per page
//! - **Incremental sync**: Minimal index mutation per record event, re-checked against an action filter
//! - **Document transformation**: Flattening, rich-text suppression and HTML stripping
//! - **Index provisioning**: Create-if-absent with bounded waiting on the creation task
//! - **Hot reload**: Settings and client swapped atomically when the settings record changes
//!
//! # Backend Features
//!
//! - `meilisearch` (default) - HTTP client for Meilisearch
//! - `directus` (default) - Record reader and settings store over the Directus items API
//!
//! The in-memory backends in [`backends::memory`] are always available.
//!
//! # Architecture
//!
//! - [`types`] - Settings, documents, record keys and index tasks
//! - [`error`] - Error types for all operations
//! - [`core`] - Traits for the index service, record reader and settings store
//! - [`transform`] - Record-to-document transformation
//! - [`provisioner`] - Create-if-absent index provisioning
//! - [`reindex`] - Full reindex and its report
//! - [`incremental`] - Create, update and delete event handlers
//! - [`cache`] - Current settings snapshot
//! - [`engine`] - The [`SyncEngine`] facade
//! - [`backends`] - Meilisearch, Directus and in-memory implementations
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use meilisync_engine::backends::directus::{DirectusClient, DirectusConfig};
//! use meilisync_engine::backends::meilisearch::MeilisearchClientFactory;
//! use meilisync_engine::{ReindexRun, SyncEngine, SyncEngineConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let directus = Arc::new(DirectusClient::new(DirectusConfig {
//!     url: "http://localhost:8055".to_string(),
//!     token: "service-token".to_string(),
//!     ..Default::default()
//! })?);
//!
//! let engine = Arc::new(SyncEngine::new(
//!     directus.clone(),
//!     directus,
//!     Arc::new(MeilisearchClientFactory::new()),
//!     SyncEngineConfig::default(),
//! ));
//! engine.initialize().await;
//!
//! if let ReindexRun::Completed(report) = engine.run_reindex().await {
//!     println!("indexed {} documents", report.total_documents());
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod backends;
pub mod cache;
pub mod core;
pub mod engine;
pub mod error;
pub mod incremental;
pub mod provisioner;
pub mod reindex;
pub mod transform;
pub mod types;

// Re-export commonly used types at crate root
pub use error::{
    ConfigError, IndexError, IndexResult, StoreError, StoreResult, TransformError, TriggerError,
};
pub use types::{FlattenedDocument, IndexingConfiguration, RecordKey, SyncSettings};

// Re-export core traits
pub use core::{IndexClientFactory, RecordReader, SearchIndexClient, SettingsStore};

// Re-export the engine surface
pub use cache::{ConfigurationCache, Snapshot};
pub use engine::{ReindexRun, ReindexStart, SyncEngine, SyncEngineConfig};
pub use incremental::{IncrementalSyncHandler, SyncOutcome};
pub use provisioner::{IndexProvisioner, Provisioned};
pub use reindex::{CollectionOutcome, CollectionReport, FullReindexer, ReindexReport};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
