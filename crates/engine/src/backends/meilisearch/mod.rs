//! Meilisearch index client.
//!
//! Wraps the `meilisearch-sdk` client behind [`SearchIndexClient`]. Every
//! collection maps to an index of the same name.
//!
//! [`SearchIndexClient`]: crate::core::SearchIndexClient
//!
//! | Operation | Request |
//! |-----------|---------|
//! | get index | `GET /indexes/{uid}` |
//! | create index | `POST /indexes`, then `GET /tasks/{uid}` until finished |
//! | upsert documents | `POST /indexes/{uid}/documents` |
//! | delete documents | `POST /indexes/{uid}/documents/delete-batch` |
//!
//! # Example
//!
//! ```ignore
//! use meilisync_engine::backends::meilisearch::{MeilisearchClient, MeilisearchConfig};
//!
//! let client = MeilisearchClient::new(MeilisearchConfig {
//!     host: "http://localhost:7700".to_string(),
//!     api_key: "masterKey".to_string(),
//!     ..Default::default()
//! })?;
//! let index = client.get_index("articles").await?;
//! ```

mod backend;

pub use backend::{MeilisearchClient, MeilisearchClientFactory, MeilisearchConfig};
