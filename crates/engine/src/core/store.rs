//! Record store and settings store traits.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreResult;
use crate::types::RecordKey;

/// A page request against one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PageQuery {
    /// Fields to project.
    pub fields: Vec<String>,
    /// Eligibility filter, in the store's filter language.
    pub filter: Option<Value>,
    /// Maximum number of records to return.
    pub limit: usize,
    /// Number of records to skip.
    pub offset: usize,
}

/// A by-key read against one collection.
#[derive(Debug, Clone, Copy)]
pub struct KeyQuery<'a> {
    /// Name of the primary key field.
    pub primary_key: &'a str,
    /// Keys to fetch.
    pub keys: &'a [RecordKey],
    /// Fields to project.
    pub fields: &'a [String],
    /// Additional filter the records must satisfy.
    pub filter: Option<&'a Value>,
}

/// Read access to the primary record store.
#[async_trait]
pub trait RecordReader: Send + Sync {
    /// Returns a human-readable name for this store.
    fn store_name(&self) -> &'static str;

    /// Reads one page of records.
    ///
    /// An empty result means the collection has no records past `offset`.
    async fn read_page(&self, collection: &str, query: &PageQuery) -> StoreResult<Vec<Value>>;

    /// Reads the records with the given keys that also match the filter.
    ///
    /// Keys that do not exist, or whose records fail the filter, are simply
    /// absent from the result.
    async fn read_by_keys(&self, collection: &str, query: &KeyQuery<'_>) -> StoreResult<Vec<Value>>;
}

/// Access to the singleton settings record.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Reads the settings record. Returns `None` if it has not been provisioned.
    async fn read_settings(&self) -> StoreResult<Option<Value>>;

    /// Sets `force_reindex` back to false.
    ///
    /// Implementations must use the service's own privileges, not those of
    /// whoever triggered the reindex.
    async fn clear_reindex_flag(&self) -> StoreResult<()>;
}

/// Shared, type-erased record reader.
pub type DynRecordReader = Arc<dyn RecordReader>;

/// Shared, type-erased settings store.
pub type DynSettingsStore = Arc<dyn SettingsStore>;
