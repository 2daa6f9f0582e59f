//! In-memory record store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use serde_json::{Map, Value};

use super::filter;
use crate::core::{KeyQuery, PageQuery, RecordReader, SettingsStore};
use crate::error::{StoreError, StoreResult};

/// Counters of the calls made to a [`MemoryStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreCalls {
    /// Paged reads.
    pub read_page: usize,
    /// By-key reads.
    pub read_by_keys: usize,
    /// Settings reads.
    pub read_settings: usize,
    /// Flag clears.
    pub clear_reindex_flag: usize,
    /// `(collection, limit, offset, returned)` of every paged read.
    pub pages: Vec<(String, usize, usize, usize)>,
}

#[derive(Debug, Default)]
struct StoreState {
    collections: HashMap<String, Vec<Value>>,
    settings: Option<Value>,
    settings_error: Option<String>,
    read_errors: HashMap<String, String>,
}

/// A record store kept in memory.
///
/// Records are returned in insertion order. Filters use the Directus
/// operators implemented in [`filter`](super::filter) and field lists support
/// `*`, `a.b` and `a.*`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<StoreState>,
    calls: Mutex<StoreCalls>,
}

impl MemoryStore {
    /// Creates an empty store with no settings record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record to a collection.
    pub fn insert(&self, collection: &str, record: Value) {
        self.state
            .write()
            .collections
            .entry(collection.to_string())
            .or_default()
            .push(record);
    }

    /// Appends several records to a collection.
    pub fn insert_many(&self, collection: &str, records: impl IntoIterator<Item = Value>) {
        self.state
            .write()
            .collections
            .entry(collection.to_string())
            .or_default()
            .extend(records);
    }

    /// Replaces the record whose `id` equals the record's `id`, or appends it.
    pub fn put(&self, collection: &str, record: Value) {
        let mut state = self.state.write();
        let records = state
            .collections
            .entry(collection.to_string())
            .or_default();
        let id = record.get("id").cloned();
        match records
            .iter_mut()
            .find(|existing| id.is_some() && existing.get("id") == id.as_ref())
        {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    /// Removes the record whose `id` equals `id`.
    pub fn remove(&self, collection: &str, id: &Value) {
        if let Some(records) = self.state.write().collections.get_mut(collection) {
            records.retain(|record| record.get("id") != Some(id));
        }
    }

    /// Number of records in a collection.
    pub fn len(&self, collection: &str) -> usize {
        self.state
            .read()
            .collections
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Installs the settings record.
    pub fn set_settings(&self, settings: Value) {
        let mut state = self.state.write();
        state.settings = Some(settings);
        state.settings_error = None;
    }

    /// Removes the settings record.
    pub fn remove_settings(&self) {
        self.state.write().settings = None;
    }

    /// Returns the settings record.
    pub fn settings(&self) -> Option<Value> {
        self.state.read().settings.clone()
    }

    /// Makes settings reads fail until settings are set again.
    pub fn fail_settings_reads(&self, message: &str) {
        self.state.write().settings_error = Some(message.to_string());
    }

    /// Makes every read of a collection fail.
    pub fn fail_reads(&self, collection: &str, message: &str) {
        self.state
            .write()
            .read_errors
            .insert(collection.to_string(), message.to_string());
    }

    /// Returns a copy of the call counters.
    pub fn calls(&self) -> StoreCalls {
        self.calls.lock().clone()
    }

    /// Resets the call counters.
    pub fn reset_calls(&self) {
        *self.calls.lock() = StoreCalls::default();
    }

    fn check_readable(&self, state: &StoreState, collection: &str) -> StoreResult<()> {
        match state.read_errors.get(collection) {
            Some(message) => Err(StoreError::Request {
                collection: collection.to_string(),
                status: 503,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RecordReader for MemoryStore {
    fn store_name(&self) -> &'static str {
        "memory"
    }

    async fn read_page(&self, collection: &str, query: &PageQuery) -> StoreResult<Vec<Value>> {
        let state = self.state.read();
        let result = self.check_readable(&state, collection).map(|()| {
            state
                .collections
                .get(collection)
                .map(|records| {
                    records
                        .iter()
                        .filter(|record| {
                            query
                                .filter
                                .as_ref()
                                .is_none_or(|f| filter::matches(record, f))
                        })
                        .skip(query.offset)
                        .take(query.limit)
                        .map(|record| project(record, &query.fields))
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()
        });

        let mut calls = self.calls.lock();
        calls.read_page += 1;
        calls.pages.push((
            collection.to_string(),
            query.limit,
            query.offset,
            result.as_ref().map_or(0, Vec::len),
        ));
        result
    }

    async fn read_by_keys(&self, collection: &str, query: &KeyQuery<'_>) -> StoreResult<Vec<Value>> {
        self.calls.lock().read_by_keys += 1;

        let state = self.state.read();
        self.check_readable(&state, collection)?;

        let records = state
            .collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| {
                        record
                            .get(query.primary_key)
                            .is_some_and(|id| query.keys.iter().any(|key| key.matches(id)))
                    })
                    .filter(|record| query.filter.is_none_or(|f| filter::matches(record, f)))
                    .map(|record| project(record, query.fields))
                    .collect()
            })
            .unwrap_or_default();
        Ok(records)
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn read_settings(&self) -> StoreResult<Option<Value>> {
        self.calls.lock().read_settings += 1;

        let state = self.state.read();
        if let Some(message) = &state.settings_error {
            return Err(StoreError::Unavailable {
                message: message.clone(),
            });
        }
        Ok(state.settings.clone())
    }

    async fn clear_reindex_flag(&self) -> StoreResult<()> {
        self.calls.lock().clear_reindex_flag += 1;

        if let Some(Value::Object(settings)) = self.state.write().settings.as_mut() {
            settings.insert("force_reindex".to_string(), Value::Bool(false));
        }
        Ok(())
    }
}

/// Applies a Directus field list to a record.
fn project(record: &Value, fields: &[String]) -> Value {
    if fields.is_empty() || fields.iter().any(|f| f == "*") {
        return record.clone();
    }
    let Some(source) = record.as_object() else {
        return record.clone();
    };

    let mut out = Map::new();
    for field in fields {
        let path: Vec<&str> = field.split('.').collect();
        copy_path(source, &path, &mut out);
    }
    Value::Object(out)
}

fn copy_path(source: &Map<String, Value>, path: &[&str], out: &mut Map<String, Value>) {
    let Some((head, rest)) = path.split_first() else {
        return;
    };
    let Some(value) = source.get(*head) else {
        return;
    };

    if rest.is_empty() || rest == ["*"] {
        out.insert(head.to_string(), value.clone());
        return;
    }

    match value {
        Value::Object(child) => {
            let slot = out
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(slot) = slot {
                copy_path(child, rest, slot);
            }
        }
        // A relation that is not expanded stays as its raw value.
        other => {
            out.insert(head.to_string(), other.clone());
        }
    }
}
