//! Axum extractors.
//!
//! - [`AdminAccess`] - Rejects callers without the admin bearer token

mod admin;

pub use admin::AdminAccess;
