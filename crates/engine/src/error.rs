//! Error types for the synchronization engine.
//!
//! Errors are grouped by the collaborator they originate from: the search
//! index service, the primary record store, the document transformation and
//! the settings record. [`TriggerError`] covers the preconditions of a manual
//! reindex.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use thiserror::Error;

/// Errors returned by a search index client.
#[derive(Error, Debug)]
pub enum IndexError {
    /// The requested index does not exist.
    #[error("index not found: {uid}")]
    NotFound { uid: String },

    /// The service answered with an error payload.
    #[error("index service error ({code}): {message}")]
    Api { code: String, message: String },

    /// The service answered with an unexpected HTTP status and no error payload.
    #[error("index service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The service could not be reached.
    #[error("connection to index service failed: {message}")]
    Connection { message: String },

    /// An asynchronous task did not finish in time.
    #[error("task {task_uid} did not finish within {timeout_ms}ms")]
    TaskTimeout { task_uid: u64, timeout_ms: u64 },

    /// A request or response body could not be (de)serialized.
    #[error("index serialization error: {message}")]
    Serialization { message: String },

    /// The client could not be constructed from the given parameters.
    #[error("invalid index client configuration: {message}")]
    InvalidConfiguration { message: String },
}

impl IndexError {
    /// Returns true if this error means the index is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexError::NotFound { .. })
    }
}

/// Errors returned by the primary record store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("record store unavailable: {message}")]
    Unavailable { message: String },

    /// The store rejected a request.
    #[error("record store request on {collection} failed ({status}): {message}")]
    Request {
        collection: String,
        status: u16,
        message: String,
    },

    /// The store returned a body that could not be decoded.
    #[error("record store serialization error: {message}")]
    Serialization { message: String },
}

/// Errors produced while transforming a record into a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The record is not a JSON object.
    #[error("record is not an object (found {kind})")]
    NotAnObject { kind: &'static str },

    /// The record nests deeper than the flattener allows.
    #[error("record nesting exceeds {max_depth} levels at '{path}'")]
    TooDeep { path: String, max_depth: usize },
}

/// Errors related to the settings record.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The settings payload has an unexpected shape.
    #[error("invalid settings: {message}")]
    Invalid { message: String },
}

/// Preconditions that stop a manual reindex before any background work starts.
#[derive(Error, Debug)]
pub enum TriggerError {
    /// The settings record has not been provisioned.
    #[error("Meilisearch settings not found.")]
    SettingsNotFound,

    /// Host or API key is missing.
    #[error("Meilisearch not configured.")]
    NotConfigured,

    /// The settings record could not be read.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type alias for index client operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Result type alias for record store operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for IndexError {
    fn from(err: serde_json::Error) -> Self {
        IndexError::Serialization {
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_display() {
        let err = IndexError::NotFound {
            uid: "articles".to_string(),
        };
        assert_eq!(err.to_string(), "index not found: articles");
        assert!(err.is_not_found());

        let err = IndexError::TaskTimeout {
            task_uid: 7,
            timeout_ms: 10_000,
        };
        assert_eq!(err.to_string(), "task 7 did not finish within 10000ms");
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_trigger_error_messages() {
        assert_eq!(
            TriggerError::SettingsNotFound.to_string(),
            "Meilisearch settings not found."
        );
        assert_eq!(
            TriggerError::NotConfigured.to_string(),
            "Meilisearch not configured."
        );
    }
}
