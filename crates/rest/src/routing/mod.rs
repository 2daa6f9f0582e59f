//! Route configuration.
//!
//! This module contains the routing configuration that maps HTTP paths
//! to handlers.

pub mod sync_routes;

pub use sync_routes::create_routes;
