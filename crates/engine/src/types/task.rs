//! Asynchronous index-service tasks.
//!
//! Index creation and document writes are accepted by the index service and
//! processed later. The service answers with a [`TaskHandle`]; a finished
//! index creation is reported as a [`TaskInfo`] and summarized as a
//! [`TaskOutcome`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Accepted, not yet started.
    Enqueued,
    /// Being processed.
    Processing,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Cancelled before completion.
    Canceled,
}

impl TaskStatus {
    /// Returns true once the task can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Succeeded | TaskStatus::Failed | TaskStatus::Canceled
        )
    }
}

/// Reference to an enqueued task, as returned by a mutating call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskHandle {
    /// Task identifier.
    pub task_uid: u64,
    /// Index the task operates on.
    #[serde(default)]
    pub index_uid: Option<String>,
    /// State when the handle was issued.
    pub status: TaskStatus,
    /// Task kind (e.g. `indexCreation`).
    #[serde(rename = "type")]
    pub kind: String,
    /// When the task was accepted.
    #[serde(default)]
    pub enqueued_at: Option<DateTime<Utc>>,
}

/// Error details attached to a failed task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskError {
    /// Human-readable message.
    pub message: String,
    /// Machine-readable code.
    #[serde(default)]
    pub code: String,
    /// Error category.
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Documentation link.
    #[serde(default)]
    pub link: String,
}

/// Current state of a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInfo {
    /// Task identifier.
    pub uid: u64,
    /// Index the task operates on.
    #[serde(default)]
    pub index_uid: Option<String>,
    /// Current state.
    pub status: TaskStatus,
    /// Task kind.
    #[serde(rename = "type")]
    pub kind: String,
    /// Error details when `status` is `failed`.
    #[serde(default)]
    pub error: Option<TaskError>,
    /// When the task was accepted.
    #[serde(default)]
    pub enqueued_at: Option<DateTime<Utc>>,
    /// When the task finished.
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

/// Success flag and message of a finished task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOutcome {
    pub success: bool,
    /// Empty on success.
    pub message: String,
}

impl TaskOutcome {
    /// Summarizes a task. Anything but `succeeded` is a failure; a failure
    /// without error details gets a generic message.
    pub fn from_task(task: &TaskInfo) -> Self {
        if task.status == TaskStatus::Succeeded {
            return Self {
                success: true,
                message: String::new(),
            };
        }
        let message = match &task.error {
            Some(error) => error.message.clone(),
            None => format!("task {} ended as {:?}", task.uid, task.status),
        };
        Self {
            success: false,
            message,
        }
    }
}

/// Metadata of an existing index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexInfo {
    /// Index identifier.
    pub uid: String,
    /// Primary key attribute, once known.
    #[serde(default)]
    pub primary_key: Option<String>,
    /// Creation time.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last update time.
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}
