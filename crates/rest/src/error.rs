//! Error types for the HTTP boundary.
//!
//! Every error renders as a JSON body of the form `{"error": "<message>"}`.
//!
//! # Error Mapping
//!
//! | Error | HTTP Status |
//! |-------|-------------|
//! | Forbidden | 403 |
//! | NotFound | 404 |
//! | BadRequest | 400 |
//! | InternalError | 500 |
//!
//! Manual-trigger preconditions from the engine map as follows:
//!
//! | [`TriggerError`] | HTTP Status |
//! |------------------|-------------|
//! | SettingsNotFound | 404 |
//! | NotConfigured | 400 |
//! | Store | 500 |

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use meilisync_engine::TriggerError;
use serde_json::json;
use thiserror::Error;

/// Message returned to callers that fail the admin check.
pub const FORBIDDEN_MESSAGE: &str = "Forbidden. Admin access required.";

/// The error type of every handler.
#[derive(Debug, Error)]
pub enum RestError {
    /// The caller is not an administrator (HTTP 403).
    #[error("{message}")]
    Forbidden {
        /// Error message.
        message: String,
    },

    /// A required entity does not exist (HTTP 404).
    #[error("{message}")]
    NotFound {
        /// Error message.
        message: String,
    },

    /// The request or the stored configuration is invalid (HTTP 400).
    #[error("{message}")]
    BadRequest {
        /// Error message.
        message: String,
    },

    /// Something failed on the server side (HTTP 500).
    #[error("{message}")]
    InternalError {
        /// Error message.
        message: String,
    },
}

impl RestError {
    /// The rejection for callers without admin access.
    pub fn forbidden() -> Self {
        RestError::Forbidden {
            message: FORBIDDEN_MESSAGE.to_string(),
        }
    }

    /// Returns the HTTP status code of this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RestError::Forbidden { .. } => StatusCode::FORBIDDEN,
            RestError::NotFound { .. } => StatusCode::NOT_FOUND,
            RestError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            RestError::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RestError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<TriggerError> for RestError {
    fn from(err: TriggerError) -> Self {
        let message = err.to_string();
        match err {
            TriggerError::SettingsNotFound => RestError::NotFound { message },
            TriggerError::NotConfigured => RestError::BadRequest { message },
            TriggerError::Store(_) => RestError::InternalError { message },
        }
    }
}

impl From<JsonRejection> for RestError {
    fn from(rejection: JsonRejection) -> Self {
        RestError::BadRequest {
            message: rejection.body_text(),
        }
    }
}

/// Result type alias for handlers.
pub type RestResult<T> = Result<T, RestError>;

#[cfg(test)]
mod tests {
    use super::*;
    use meilisync_engine::StoreError;

    #[test]
    fn test_trigger_error_mapping() {
        let cases = [
            (TriggerError::SettingsNotFound, StatusCode::NOT_FOUND),
            (TriggerError::NotConfigured, StatusCode::BAD_REQUEST),
            (
                TriggerError::Store(StoreError::Unavailable {
                    message: "down".to_string(),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];

        for (trigger, status) in cases {
            assert_eq!(RestError::from(trigger).status_code(), status);
        }
    }

    #[test]
    fn test_forbidden_message() {
        let err = RestError::forbidden();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert_eq!(err.to_string(), "Forbidden. Admin access required.");
    }

    #[test]
    fn test_trigger_messages_pass_through() {
        let err = RestError::from(TriggerError::SettingsNotFound);
        assert_eq!(err.to_string(), "Meilisearch settings not found.");
    }
}
