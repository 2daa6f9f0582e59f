//! In-memory search index service.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use serde_json::Value;

use crate::core::{DynIndexClient, IndexClientFactory, SearchIndexClient};
use crate::error::{IndexError, IndexResult};
use crate::types::{
    FlattenedDocument, IndexInfo, RecordKey, TaskError, TaskHandle, TaskInfo, TaskStatus,
};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Counters of the calls made to a [`MemoryIndex`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexCalls {
    /// Index fetches.
    pub get_index: usize,
    /// Index creation requests.
    pub create_index: usize,
    /// Upsert batches.
    pub upsert_documents: usize,
    /// Delete batches.
    pub delete_documents: usize,
    /// `(index, batch size)` of every upsert.
    pub upserts: Vec<(String, usize)>,
    /// `(index, keys)` of every delete.
    pub deletes: Vec<(String, Vec<RecordKey>)>,
}

impl IndexCalls {
    /// Total number of calls of any kind.
    pub fn total(&self) -> usize {
        self.get_index
            + self.create_index
            + self.upsert_documents
            + self.delete_documents
    }
}

#[derive(Debug)]
struct StoredIndex {
    info: IndexInfo,
    documents: BTreeMap<String, FlattenedDocument>,
}

#[derive(Debug, Default)]
struct IndexState {
    indexes: BTreeMap<String, StoredIndex>,
    tasks: HashMap<u64, TaskInfo>,
    next_task_uid: u64,
    creation_failures: HashMap<String, String>,
    stalled_creations: HashSet<String>,
    write_failures: HashMap<String, String>,
}

impl IndexState {
    fn enqueue(&mut self, uid: &str, kind: &str, status: TaskStatus, error: Option<TaskError>) -> TaskHandle {
        let task_uid = self.next_task_uid;
        self.next_task_uid += 1;
        let now = Utc::now();

        self.tasks.insert(
            task_uid,
            TaskInfo {
                uid: task_uid,
                index_uid: Some(uid.to_string()),
                status,
                kind: kind.to_string(),
                error,
                enqueued_at: Some(now),
                finished_at: status.is_terminal().then_some(now),
            },
        );

        TaskHandle {
            task_uid,
            index_uid: Some(uid.to_string()),
            status: TaskStatus::Enqueued,
            kind: kind.to_string(),
            enqueued_at: Some(now),
        }
    }

    fn index_mut(&mut self, uid: &str, primary_key: Option<&str>) -> &mut StoredIndex {
        self.indexes
            .entry(uid.to_string())
            .or_insert_with(|| StoredIndex {
                info: IndexInfo {
                    uid: uid.to_string(),
                    primary_key: primary_key.map(str::to_string),
                    created_at: Some(Utc::now()),
                    updated_at: Some(Utc::now()),
                },
                documents: BTreeMap::new(),
            })
    }
}

/// A search index service kept in memory.
///
/// Documents are stored per index and keyed by the string form of their
/// primary key, so repeated upserts replace. Index creation goes through a
/// task that can be made to fail or to never finish, which exercises the
/// provisioning paths without a running server.
#[derive(Debug, Default)]
pub struct MemoryIndex {
    state: Mutex<IndexState>,
    calls: Mutex<IndexCalls>,
}

impl MemoryIndex {
    /// Creates a service with no indexes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index directly, without a task.
    pub fn seed_index(&self, uid: &str, primary_key: Option<&str>) {
        self.state.lock().index_mut(uid, primary_key);
    }

    /// Makes the creation task of `uid` fail with `message`.
    pub fn fail_creation(&self, uid: &str, message: &str) {
        self.state
            .lock()
            .creation_failures
            .insert(uid.to_string(), message.to_string());
    }

    /// Makes the creation task of `uid` stay enqueued forever.
    pub fn stall_creation(&self, uid: &str) {
        self.state.lock().stalled_creations.insert(uid.to_string());
    }

    /// Makes document writes to `uid` fail with `message`.
    pub fn fail_writes(&self, uid: &str, message: &str) {
        self.state
            .lock()
            .write_failures
            .insert(uid.to_string(), message.to_string());
    }

    /// Removes every injected failure.
    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.creation_failures.clear();
        state.stalled_creations.clear();
        state.write_failures.clear();
    }

    /// Returns true if the index exists.
    pub fn has_index(&self, uid: &str) -> bool {
        self.state.lock().indexes.contains_key(uid)
    }

    /// Returns the documents of an index, ordered by key.
    pub fn documents(&self, uid: &str) -> Vec<FlattenedDocument> {
        self.state
            .lock()
            .indexes
            .get(uid)
            .map(|index| index.documents.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Returns one document by key.
    pub fn document(&self, uid: &str, key: impl Into<RecordKey>) -> Option<FlattenedDocument> {
        let key = key.into().to_string();
        self.state
            .lock()
            .indexes
            .get(uid)
            .and_then(|index| index.documents.get(&key).cloned())
    }

    /// Returns a copy of the call counters.
    pub fn calls(&self) -> IndexCalls {
        self.calls.lock().clone()
    }

    /// Resets the call counters.
    pub fn reset_calls(&self) {
        *self.calls.lock() = IndexCalls::default();
    }

    fn task(&self, task_uid: u64) -> Option<TaskInfo> {
        self.state.lock().tasks.get(&task_uid).cloned()
    }

    fn enqueue_creation(&self, uid: &str, primary_key: Option<&str>) -> TaskHandle {
        let mut state = self.state.lock();

        if state.stalled_creations.contains(uid) {
            return state.enqueue(uid, "indexCreation", TaskStatus::Enqueued, None);
        }
        if let Some(message) = state.creation_failures.get(uid).cloned() {
            let error = TaskError {
                message,
                code: "index_creation_failed".to_string(),
                kind: "internal".to_string(),
                link: String::new(),
            };
            return state.enqueue(uid, "indexCreation", TaskStatus::Failed, Some(error));
        }
        if state.indexes.contains_key(uid) {
            let error = TaskError {
                message: format!("Index `{}` already exists.", uid),
                code: "index_already_exists".to_string(),
                kind: "invalid_request".to_string(),
                link: String::new(),
            };
            return state.enqueue(uid, "indexCreation", TaskStatus::Failed, Some(error));
        }

        state.index_mut(uid, primary_key);
        state.enqueue(uid, "indexCreation", TaskStatus::Succeeded, None)
    }

    fn check_writable(state: &IndexState, uid: &str) -> IndexResult<()> {
        match state.write_failures.get(uid) {
            Some(message) => Err(IndexError::Api {
                code: "unavailable".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl SearchIndexClient for MemoryIndex {
    fn service_name(&self) -> &'static str {
        "memory"
    }

    async fn get_index(&self, uid: &str) -> IndexResult<IndexInfo> {
        self.calls.lock().get_index += 1;
        self.state
            .lock()
            .indexes
            .get(uid)
            .map(|index| index.info.clone())
            .ok_or_else(|| IndexError::NotFound {
                uid: uid.to_string(),
            })
    }

    async fn create_index(
        &self,
        uid: &str,
        primary_key: Option<&str>,
        timeout: Duration,
    ) -> IndexResult<TaskInfo> {
        self.calls.lock().create_index += 1;
        let handle = self.enqueue_creation(uid, primary_key);
        let task_uid = handle.task_uid;

        let poll = async {
            loop {
                match self.task(task_uid) {
                    Some(task) if task.status.is_terminal() => return task,
                    _ => tokio::time::sleep(POLL_INTERVAL).await,
                }
            }
        };

        tokio::time::timeout(timeout, poll)
            .await
            .map_err(|_| IndexError::TaskTimeout {
                task_uid,
                timeout_ms: timeout.as_millis() as u64,
            })
    }

    async fn upsert_documents(
        &self,
        uid: &str,
        documents: &[FlattenedDocument],
        primary_key: Option<&str>,
    ) -> IndexResult<TaskHandle> {
        {
            let mut calls = self.calls.lock();
            calls.upsert_documents += 1;
            calls.upserts.push((uid.to_string(), documents.len()));
        }

        let mut state = self.state.lock();
        Self::check_writable(&state, uid)?;

        let index = state.index_mut(uid, primary_key);
        let field = index
            .info
            .primary_key
            .clone()
            .or_else(|| primary_key.map(str::to_string))
            .unwrap_or_else(|| "id".to_string());

        let mut keyed = Vec::with_capacity(documents.len());
        for document in documents {
            let key = document
                .primary_key(&field)
                .and_then(key_string)
                .ok_or_else(|| IndexError::Api {
                    code: "missing_document_id".to_string(),
                    message: format!("Document doesn't have a `{}` attribute.", field),
                })?;
            keyed.push((key, document.clone()));
        }
        index.documents.extend(keyed);
        index.info.updated_at = Some(Utc::now());

        Ok(state.enqueue(uid, "documentAdditionOrUpdate", TaskStatus::Succeeded, None))
    }

    async fn delete_documents(&self, uid: &str, keys: &[RecordKey]) -> IndexResult<TaskHandle> {
        {
            let mut calls = self.calls.lock();
            calls.delete_documents += 1;
            calls.deletes.push((uid.to_string(), keys.to_vec()));
        }

        let mut state = self.state.lock();
        Self::check_writable(&state, uid)?;

        if let Some(index) = state.indexes.get_mut(uid) {
            for key in keys {
                index.documents.remove(&key.to_string());
            }
        }
        Ok(state.enqueue(uid, "documentDeletion", TaskStatus::Succeeded, None))
    }
}

/// Hands out one shared [`MemoryIndex`] for every connection.
#[derive(Debug, Default)]
pub struct MemoryIndexFactory {
    index: Arc<MemoryIndex>,
    connections: AtomicUsize,
    refuse: Mutex<Option<String>>,
    last_host: Mutex<Option<String>>,
}

impl MemoryIndexFactory {
    /// Creates a factory around a fresh index service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a factory around an existing index service.
    pub fn with_index(index: Arc<MemoryIndex>) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// The shared index service.
    pub fn index(&self) -> Arc<MemoryIndex> {
        Arc::clone(&self.index)
    }

    /// Number of clients handed out.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Host of the most recent connection.
    pub fn last_host(&self) -> Option<String> {
        self.last_host.lock().clone()
    }

    /// Makes every later connection attempt fail.
    pub fn refuse_connections(&self, message: &str) {
        *self.refuse.lock() = Some(message.to_string());
    }
}

impl IndexClientFactory for MemoryIndexFactory {
    fn connect(&self, host: &str, _api_key: &str) -> IndexResult<DynIndexClient> {
        if let Some(message) = self.refuse.lock().clone() {
            return Err(IndexError::InvalidConfiguration { message });
        }
        self.connections.fetch_add(1, Ordering::SeqCst);
        *self.last_host.lock() = Some(host.to_string());
        Ok(self.index())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::transform;
    use serde_json::json;

    fn doc(id: i64, title: &str) -> FlattenedDocument {
        transform(&json!({"id": id, "title": title}), "articles", false).unwrap()
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_key() {
        let index = MemoryIndex::new();

        index
            .upsert_documents("articles", &[doc(1, "first"), doc(2, "second")], Some("id"))
            .await
            .unwrap();
        index
            .upsert_documents("articles", &[doc(1, "replaced")], Some("id"))
            .await
            .unwrap();

        assert_eq!(index.documents("articles").len(), 2);
        assert_eq!(
            index.document("articles", 1).unwrap().get("title"),
            Some(&json!("replaced"))
        );
        assert_eq!(index.calls().upserts, vec![
            ("articles".to_string(), 2),
            ("articles".to_string(), 1)
        ]);
    }

    #[tokio::test]
    async fn test_delete_ignores_unknown_keys() {
        let index = MemoryIndex::new();
        index
            .upsert_documents("articles", &[doc(1, "a")], Some("id"))
            .await
            .unwrap();

        index
            .delete_documents("articles", &[RecordKey::from(1), RecordKey::from(99)])
            .await
            .unwrap();

        assert!(index.documents("articles").is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_creation_fails_task() {
        let index = MemoryIndex::new();
        index.seed_index("articles", Some("id"));

        let task = index
            .create_index("articles", Some("id"), Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Failed);
        assert_eq!(task.error.unwrap().code, "index_already_exists");
    }

    #[tokio::test]
    async fn test_missing_primary_key_rejected() {
        let index = MemoryIndex::new();
        let document = transform(&json!({"title": "no id"}), "articles", false).unwrap();

        let err = index
            .upsert_documents("articles", &[document], Some("id"))
            .await
            .unwrap_err();

        assert!(matches!(err, IndexError::Api { ref code, .. } if code == "missing_document_id"));
    }
}
