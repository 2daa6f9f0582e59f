//! Collaborator implementations.
//!
//! - [`meilisearch`] - HTTP client for Meilisearch (feature `meilisearch`)
//! - [`directus`] - Record reader and settings store over the Directus items API (feature `directus`)
//! - [`memory`] - In-memory record store and index service

#[cfg(feature = "meilisearch")]
pub mod meilisearch;

#[cfg(feature = "directus")]
pub mod directus;

pub mod memory;
