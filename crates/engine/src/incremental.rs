//! Per-event index maintenance.
//!
//! Each handler applies the smallest index mutation that keeps one
//! collection consistent after a create, update or delete in the record
//! store. Handlers never fail: problems are logged and reported as
//! [`SyncOutcome::Failed`].

use std::fmt;
use std::slice;

use serde::Serialize;
use tracing::{debug, error, info};

use crate::cache::Snapshot;
use crate::core::{DynRecordReader, KeyQuery, SearchIndexClient};
use crate::transform::transform;
use crate::types::{IndexingConfiguration, RecordKey};

/// What an incremental handler did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum SyncOutcome {
    /// Nothing was done.
    Skipped(String),
    /// A document was written.
    Upserted,
    /// Documents were removed.
    Deleted,
    /// The store or the index reported an error.
    Failed(String),
}

impl SyncOutcome {
    fn skipped(reason: &str) -> Self {
        SyncOutcome::Skipped(reason.to_string())
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOutcome::Skipped(reason) => write!(f, "skipped: {}", reason),
            SyncOutcome::Upserted => write!(f, "upserted"),
            SyncOutcome::Deleted => write!(f, "deleted"),
            SyncOutcome::Failed(message) => write!(f, "failed: {}", message),
        }
    }
}

/// Applies create, update and delete events to the index.
pub struct IncrementalSyncHandler {
    reader: DynRecordReader,
}

impl IncrementalSyncHandler {
    /// Creates a handler reading records through `reader`.
    pub fn new(reader: DynRecordReader) -> Self {
        Self { reader }
    }

    /// Indexes a newly created record.
    pub async fn on_create(&self, snapshot: &Snapshot, collection: &str, key: &RecordKey) -> SyncOutcome {
        let (config, client) = match resolve(snapshot, collection) {
            Ok(resolved) => resolved,
            Err(outcome) => return outcome,
        };

        let query = KeyQuery {
            primary_key: config.primary_key(),
            keys: slice::from_ref(key),
            fields: &config.fields,
            filter: None,
        };
        let records = match self.reader.read_by_keys(collection, &query).await {
            Ok(records) => records,
            Err(e) => return failed(collection, "create", e),
        };
        let Some(record) = records.first() else {
            debug!(collection = %collection, key = %key, "Created record not readable, skipping");
            return SyncOutcome::skipped("record not found");
        };

        let outcome = upsert(client, config, record).await;
        if outcome == SyncOutcome::Upserted {
            info!(collection = %collection, key = %key, "Indexed created record");
        }
        outcome
    }

    /// Re-evaluates updated records against the action filter.
    ///
    /// If none of the records still qualifies, all `keys` are removed from
    /// the index. Otherwise the first qualifying record is re-indexed.
    pub async fn on_update(&self, snapshot: &Snapshot, collection: &str, keys: &[RecordKey]) -> SyncOutcome {
        let (config, client) = match resolve(snapshot, collection) {
            Ok(resolved) => resolved,
            Err(outcome) => return outcome,
        };
        if keys.is_empty() {
            return SyncOutcome::skipped("no keys");
        }

        let query = KeyQuery {
            primary_key: config.primary_key(),
            keys,
            fields: &config.fields,
            filter: config.action_filter.as_ref(),
        };
        let records = match self.reader.read_by_keys(collection, &query).await {
            Ok(records) => records,
            Err(e) => return failed(collection, "update", e),
        };

        let Some(record) = records.first() else {
            return match client.delete_documents(collection, keys).await {
                Ok(_) => {
                    info!(
                        collection = %collection,
                        keys = keys.len(),
                        "Removed records that no longer match the action filter"
                    );
                    SyncOutcome::Deleted
                }
                Err(e) => failed(collection, "update", e),
            };
        };

        let outcome = upsert(client, config, record).await;
        if outcome == SyncOutcome::Upserted {
            info!(collection = %collection, key = %keys[0], "Indexed updated record");
        }
        outcome
    }

    /// Removes deleted records from the index.
    pub async fn on_delete(&self, snapshot: &Snapshot, collection: &str, keys: &[RecordKey]) -> SyncOutcome {
        let (_, client) = match resolve(snapshot, collection) {
            Ok(resolved) => resolved,
            Err(outcome) => return outcome,
        };
        if keys.is_empty() {
            return SyncOutcome::skipped("no keys");
        }

        match client.delete_documents(collection, keys).await {
            Ok(_) => {
                info!(collection = %collection, keys = keys.len(), "Removed deleted records");
                SyncOutcome::Deleted
            }
            Err(e) => failed(collection, "delete", e),
        }
    }
}

impl fmt::Debug for IncrementalSyncHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncrementalSyncHandler")
            .field("reader", &self.reader.store_name())
            .finish()
    }
}

fn resolve<'a>(
    snapshot: &'a Snapshot,
    collection: &str,
) -> Result<(&'a IndexingConfiguration, &'a dyn SearchIndexClient), SyncOutcome> {
    let client = snapshot
        .client()
        .ok_or_else(|| SyncOutcome::skipped("synchronization inactive"))?;
    let config = snapshot
        .collection(collection)
        .ok_or_else(|| SyncOutcome::skipped("collection not configured"))?;
    Ok((config, client))
}

async fn upsert(
    client: &dyn SearchIndexClient,
    config: &IndexingConfiguration,
    record: &serde_json::Value,
) -> SyncOutcome {
    let collection = config.collection.as_str();
    let document = match transform(record, collection, config.preserve_arrays) {
        Ok(document) => document,
        Err(e) => return failed(collection, "transform", e),
    };

    match client
        .upsert_documents(collection, slice::from_ref(&document), Some(config.primary_key()))
        .await
    {
        Ok(_) => SyncOutcome::Upserted,
        Err(e) => failed(collection, "upsert", e),
    }
}

fn failed(collection: &str, stage: &'static str, e: impl fmt::Display) -> SyncOutcome {
    error!(collection = %collection, stage = stage, error = %e, "Incremental sync failed");
    SyncOutcome::Failed(e.to_string())
}
