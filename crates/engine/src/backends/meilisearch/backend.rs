//! Meilisearch client implementation.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use meilisearch_sdk::client::Client;
use meilisearch_sdk::errors::{Error as MeiliError, ErrorCode, MeilisearchError};
use meilisearch_sdk::task_info::TaskInfo as MeiliTaskInfo;
use meilisearch_sdk::tasks::Task;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{DynIndexClient, IndexClientFactory, SearchIndexClient};
use crate::error::{IndexError, IndexResult};
use crate::types::{
    FlattenedDocument, IndexInfo, RecordKey, TaskError, TaskHandle, TaskInfo, TaskStatus,
};

/// Configuration for the Meilisearch client.
#[derive(Clone, Serialize, Deserialize)]
pub struct MeilisearchConfig {
    /// Base URL of the Meilisearch instance.
    pub host: String,

    /// API key sent as a bearer token.
    #[serde(default)]
    pub api_key: String,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Interval between task status polls in milliseconds (default: 50).
    #[serde(default = "default_task_poll_interval_ms")]
    pub task_poll_interval_ms: u64,
}

fn default_request_timeout_ms() -> u64 {
    30000
}

fn default_task_poll_interval_ms() -> u64 {
    50
}

impl Default for MeilisearchConfig {
    fn default() -> Self {
        Self {
            host: "http://localhost:7700".to_string(),
            api_key: String::new(),
            request_timeout_ms: default_request_timeout_ms(),
            task_poll_interval_ms: default_task_poll_interval_ms(),
        }
    }
}

impl fmt::Debug for MeilisearchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeilisearchConfig")
            .field("host", &self.host)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("request_timeout_ms", &self.request_timeout_ms)
            .field("task_poll_interval_ms", &self.task_poll_interval_ms)
            .finish()
    }
}

/// Client for one Meilisearch instance, built on `meilisearch-sdk`.
pub struct MeilisearchClient {
    client: Client,
    config: MeilisearchConfig,
}

impl fmt::Debug for MeilisearchClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MeilisearchClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MeilisearchClient {
    /// Creates a client. Fails if the host is not a valid URL.
    pub fn new(config: MeilisearchConfig) -> IndexResult<Self> {
        let host = config.host.trim_end_matches('/').to_string();
        reqwest::Url::parse(&host).map_err(|e| IndexError::InvalidConfiguration {
            message: format!("Invalid host URL '{}': {}", config.host, e),
        })?;

        let api_key = (!config.api_key.is_empty()).then(|| config.api_key.clone());
        let client = Client::new(host, api_key).map_err(|e| IndexError::InvalidConfiguration {
            message: format!("Failed to build Meilisearch client: {}", e),
        })?;

        Ok(Self { client, config })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &MeilisearchConfig {
        &self.config
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.config.request_timeout_ms)
    }

    /// Runs one SDK request under the configured request timeout.
    async fn bounded<T>(
        &self,
        request: impl Future<Output = Result<T, MeiliError>>,
    ) -> IndexResult<Result<T, MeiliError>> {
        tokio::time::timeout(self.request_timeout(), request)
            .await
            .map_err(|_| IndexError::Connection {
                message: format!(
                    "request timed out after {}ms",
                    self.config.request_timeout_ms
                ),
            })
    }
}

fn is_index_not_found(err: &MeiliError) -> bool {
    matches!(
        err,
        MeiliError::Meilisearch(MeilisearchError {
            error_code: ErrorCode::IndexNotFound,
            ..
        })
    )
}

fn index_error(err: MeiliError) -> IndexError {
    match err {
        MeiliError::Meilisearch(api) => IndexError::Api {
            code: api.error_code.to_string(),
            message: api.error_message,
        },
        MeiliError::MeilisearchCommunication(comm) => IndexError::Http {
            status: comm.status_code,
            message: comm.message.unwrap_or_default(),
        },
        MeiliError::ParseError(e) => IndexError::Serialization {
            message: format!("Failed to decode response: {}", e),
        },
        other => IndexError::Connection {
            message: other.to_string(),
        },
    }
}

fn to_utc(timestamp: time::OffsetDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.unix_timestamp(), timestamp.nanosecond())
}

fn task_handle(info: &MeiliTaskInfo, kind: &str) -> TaskHandle {
    TaskHandle {
        task_uid: u64::from(info.task_uid),
        index_uid: info.index_uid.clone(),
        status: serde_json::from_value(serde_json::Value::String(info.status.clone()))
            .unwrap_or(TaskStatus::Enqueued),
        kind: kind.to_string(),
        enqueued_at: to_utc(info.enqueued_at),
    }
}

#[async_trait]
impl SearchIndexClient for MeilisearchClient {
    fn service_name(&self) -> &'static str {
        "meilisearch"
    }

    async fn get_index(&self, uid: &str) -> IndexResult<IndexInfo> {
        match self.bounded(self.client.get_index(uid)).await? {
            Ok(index) => Ok(IndexInfo {
                uid: index.uid,
                primary_key: index.primary_key,
                created_at: index.created_at.and_then(to_utc),
                updated_at: index.updated_at.and_then(to_utc),
            }),
            Err(e) if is_index_not_found(&e) => Err(IndexError::NotFound {
                uid: uid.to_string(),
            }),
            Err(e) => Err(index_error(e)),
        }
    }

    async fn create_index(
        &self,
        uid: &str,
        primary_key: Option<&str>,
        timeout: Duration,
    ) -> IndexResult<TaskInfo> {
        debug!(index = %uid, "Requesting index creation");
        let enqueued = self
            .bounded(self.client.create_index(uid, primary_key))
            .await?
            .map_err(index_error)?;
        let task_uid = u64::from(enqueued.task_uid);
        let enqueued_at = to_utc(enqueued.enqueued_at);

        let interval = Duration::from_millis(self.config.task_poll_interval_ms.max(1));
        let finished = enqueued
            .wait_for_completion(&self.client, Some(interval), Some(timeout))
            .await
            .map_err(|e| match e {
                MeiliError::Timeout => IndexError::TaskTimeout {
                    task_uid,
                    timeout_ms: timeout.as_millis() as u64,
                },
                other => index_error(other),
            })?;

        let (status, error) = match finished {
            Task::Succeeded { .. } => (TaskStatus::Succeeded, None),
            Task::Failed { content } => (
                TaskStatus::Failed,
                Some(TaskError {
                    message: content.error.error_message,
                    code: content.error.error_code.to_string(),
                    kind: content.error.error_type.to_string(),
                    link: content.error.error_link,
                }),
            ),
            _ => (TaskStatus::Canceled, None),
        };

        Ok(TaskInfo {
            uid: task_uid,
            index_uid: Some(uid.to_string()),
            status,
            kind: "indexCreation".to_string(),
            error,
            enqueued_at,
            finished_at: Some(Utc::now()),
        })
    }

    async fn upsert_documents(
        &self,
        uid: &str,
        documents: &[FlattenedDocument],
        primary_key: Option<&str>,
    ) -> IndexResult<TaskHandle> {
        let index = self.client.index(uid);
        let info = self
            .bounded(index.add_or_replace(documents, primary_key))
            .await?
            .map_err(index_error)?;
        debug!(
            index = %uid,
            documents = documents.len(),
            task_uid = info.task_uid,
            "Documents enqueued"
        );
        Ok(task_handle(&info, "documentAdditionOrUpdate"))
    }

    async fn delete_documents(&self, uid: &str, keys: &[RecordKey]) -> IndexResult<TaskHandle> {
        let index = self.client.index(uid);
        let info = self
            .bounded(index.delete_documents(keys))
            .await?
            .map_err(index_error)?;
        Ok(task_handle(&info, "documentDeletion"))
    }
}

/// Builds [`MeilisearchClient`]s for the configuration cache.
#[derive(Debug, Clone)]
pub struct MeilisearchClientFactory {
    request_timeout_ms: u64,
    task_poll_interval_ms: u64,
}

impl Default for MeilisearchClientFactory {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            task_poll_interval_ms: default_task_poll_interval_ms(),
        }
    }
}

impl MeilisearchClientFactory {
    /// Creates a factory with the default timeouts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the request timeout of created clients.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the task poll interval of created clients.
    pub fn with_task_poll_interval(mut self, interval: Duration) -> Self {
        self.task_poll_interval_ms = interval.as_millis() as u64;
        self
    }
}

impl IndexClientFactory for MeilisearchClientFactory {
    fn connect(&self, host: &str, api_key: &str) -> IndexResult<DynIndexClient> {
        let client = MeilisearchClient::new(MeilisearchConfig {
            host: host.to_string(),
            api_key: api_key.to_string(),
            request_timeout_ms: self.request_timeout_ms,
            task_poll_interval_ms: self.task_poll_interval_ms,
        })?;
        Ok(Arc::new(client))
    }
}
