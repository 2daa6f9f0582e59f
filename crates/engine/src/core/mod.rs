//! Collaborator traits consumed by the engine.
//!
//! The engine owns no storage and no search index. It talks to them through
//! three narrow seams:
//!
//! - [`SearchIndexClient`] - The external search service (one index per collection)
//! - [`RecordReader`] - Paged and by-key reads from the primary record store
//! - [`SettingsStore`] - The singleton settings record
//!
//! ```text
//!             ┌──────────────────┐
//!  events ───►│    SyncEngine    │◄─── manual / CLI / settings triggers
//!             └──┬─────────┬─────┘
//!                │         │
//!       RecordReader   SearchIndexClient
//!       SettingsStore  (built per settings snapshot
//!                       by an IndexClientFactory)
//! ```
//!
//! Implementations live in [`crate::backends`].

mod index;
mod store;

pub use index::{DynIndexClient, IndexClientFactory, SearchIndexClient};
pub use store::{DynRecordReader, DynSettingsStore, KeyQuery, PageQuery, RecordReader, SettingsStore};
