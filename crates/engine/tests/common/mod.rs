//! Test infrastructure for the synchronization engine.
//!
//! - [`harness`] - An engine wired to in-memory backends
//! - [`fixtures`] - Settings records and source records

#![allow(dead_code)]

pub mod fixtures;
pub mod harness;

pub use fixtures::*;
pub use harness::*;
