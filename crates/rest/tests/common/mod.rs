//! Common test utilities for the HTTP boundary.
//!
//! - [`harness`] - Test server wired to in-memory backends
//! - [`fixtures`] - Settings and record fixtures

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
