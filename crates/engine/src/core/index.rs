//! Search index client trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::error::IndexResult;
use crate::types::{FlattenedDocument, IndexInfo, RecordKey, TaskHandle, TaskInfo};

/// Client for an external full-text search service.
///
/// Indexes are addressed by uid; the engine uses the collection name as the
/// uid. Document writes return as soon as the service has accepted the work,
/// with a [`TaskHandle`]. Index creation is the only call that waits for its
/// task to finish.
#[async_trait]
pub trait SearchIndexClient: Send + Sync {
    /// Returns a human-readable name for the service.
    fn service_name(&self) -> &'static str;

    /// Fetches an existing index.
    ///
    /// # Errors
    ///
    /// * `IndexError::NotFound` - The index does not exist
    async fn get_index(&self, uid: &str) -> IndexResult<IndexInfo>;

    /// Requests creation of an index and waits for the creation task.
    ///
    /// Returns the finished task, whether it succeeded or failed.
    ///
    /// # Errors
    ///
    /// * `IndexError::TaskTimeout` - The task was still pending when `timeout` elapsed
    async fn create_index(
        &self,
        uid: &str,
        primary_key: Option<&str>,
        timeout: Duration,
    ) -> IndexResult<TaskInfo>;

    /// Inserts or replaces documents, keyed by their primary key.
    async fn upsert_documents(
        &self,
        uid: &str,
        documents: &[FlattenedDocument],
        primary_key: Option<&str>,
    ) -> IndexResult<TaskHandle>;

    /// Deletes documents by primary key. Unknown keys are ignored.
    async fn delete_documents(&self, uid: &str, keys: &[RecordKey]) -> IndexResult<TaskHandle>;
}

/// Shared, type-erased index client.
pub type DynIndexClient = Arc<dyn SearchIndexClient>;

/// Builds index clients from connection parameters.
///
/// The configuration cache calls this every time settings are reloaded with a
/// host and API key present.
pub trait IndexClientFactory: Send + Sync {
    /// Creates a client for the given service.
    fn connect(&self, host: &str, api_key: &str) -> IndexResult<DynIndexClient>;
}
