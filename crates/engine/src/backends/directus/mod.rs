//! Directus items API backend.
//!
//! Reads records and the settings record through the Directus REST API,
//! authenticating with a static token. The token must belong to a role that
//! can read every synchronized collection and update the settings record.

mod backend;

pub use backend::{DirectusClient, DirectusConfig};
