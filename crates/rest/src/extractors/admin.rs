//! Admin access extractor.
//!
//! Protected routes take an [`AdminAccess`] argument. Extraction succeeds
//! only when the request carries `Authorization: Bearer <token>` and the
//! token equals the configured admin token.

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
};
use tracing::warn;

use crate::error::RestError;
use crate::state::AppState;

/// Proof that the caller presented the admin token.
#[derive(Debug, Clone, Copy)]
pub struct AdminAccess;

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
        .filter(|token| !token.is_empty())
}

fn constant_time_eq(expected: &str, presented: &str) -> bool {
    let expected_bytes = expected.as_bytes();
    let presented_bytes = presented.as_bytes();
    let max_len = expected_bytes.len().max(presented_bytes.len());
    let mut diff = expected_bytes.len() ^ presented_bytes.len();

    for idx in 0..max_len {
        let left = expected_bytes.get(idx).copied().unwrap_or(0);
        let right = presented_bytes.get(idx).copied().unwrap_or(0);
        diff |= usize::from(left ^ right);
    }

    diff == 0
}

impl FromRequestParts<AppState> for AdminAccess {
    type Rejection = RestError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.admin_token() else {
            warn!(path = %parts.uri.path(), "Admin route called but no admin token is configured");
            return Err(RestError::forbidden());
        };

        match bearer_token(&parts.headers) {
            Some(presented) if constant_time_eq(expected, presented) => Ok(AdminAccess),
            _ => {
                warn!(path = %parts.uri.path(), "Rejected request without admin access");
                Err(RestError::forbidden())
            }
        }
    }
}
