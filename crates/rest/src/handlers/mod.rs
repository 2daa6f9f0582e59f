//! HTTP request handlers.
//!
//! - [`reindex`] - Manual full reindex trigger
//! - [`hooks`] - Settings and record event webhooks
//! - [`health`] - Health check endpoint

pub mod health;
pub mod hooks;
pub mod reindex;

pub use health::{health_handler, liveness_handler};
pub use hooks::{create_hook, delete_hook, settings_hook, update_hook};
pub use reindex::reindex_handler;
