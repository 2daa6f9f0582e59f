//! The synchronization engine facade.
//!
//! [`SyncEngine`] wires the configuration cache, the full reindexer and the
//! incremental handler together and is what the HTTP layer and the CLI talk
//! to. Full reindexes are single-flight: while one runs, further triggers
//! report [`ReindexStart::AlreadyRunning`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::cache::{ConfigurationCache, Snapshot};
use crate::core::{DynRecordReader, DynSettingsStore, IndexClientFactory};
use crate::error::TriggerError;
use crate::incremental::{IncrementalSyncHandler, SyncOutcome};
use crate::provisioner::{DEFAULT_PROVISION_TIMEOUT, IndexProvisioner};
use crate::reindex::{DEFAULT_PAGE_SIZE, FullReindexer, ReindexReport};
use crate::types::RecordKey;

/// Tunables of the engine.
#[derive(Debug, Clone)]
pub struct SyncEngineConfig {
    /// Records per page during a full reindex.
    pub page_size: usize,
    /// Bound on waiting for index creation.
    pub provision_timeout: Duration,
}

impl Default for SyncEngineConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            provision_timeout: DEFAULT_PROVISION_TIMEOUT,
        }
    }
}

/// Result of running a full reindex.
#[derive(Debug, Clone, PartialEq)]
pub enum ReindexRun {
    /// The run finished; see the report for per-collection outcomes.
    Completed(ReindexReport),
    /// No index client is configured.
    Inactive,
    /// Another reindex holds the single-flight guard.
    AlreadyRunning,
}

/// Result of launching a background reindex.
#[derive(Debug)]
pub enum ReindexStart {
    /// The reindex is running in its own task.
    Started(JoinHandle<ReindexRun>),
    /// Another reindex is already running.
    AlreadyRunning,
}

impl ReindexStart {
    /// Returns true if a new reindex was launched.
    pub fn is_started(&self) -> bool {
        matches!(self, ReindexStart::Started(_))
    }
}

/// Releases the single-flight flag when dropped, including on panic.
struct ReindexGuard {
    flag: Arc<AtomicBool>,
}

impl ReindexGuard {
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self {
                flag: Arc::clone(flag),
            })
    }
}

impl Drop for ReindexGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Keeps search indexes synchronized with the record store.
pub struct SyncEngine {
    cache: ConfigurationCache,
    settings_store: DynSettingsStore,
    reindexer: FullReindexer,
    incremental: IncrementalSyncHandler,
    reindexing: Arc<AtomicBool>,
}

impl SyncEngine {
    /// Creates an engine. Nothing is loaded until [`initialize`](Self::initialize).
    pub fn new(
        reader: DynRecordReader,
        settings_store: DynSettingsStore,
        factory: Arc<dyn IndexClientFactory>,
        config: SyncEngineConfig,
    ) -> Self {
        let reindexer = FullReindexer::new(Arc::clone(&reader), Arc::clone(&settings_store))
            .with_page_size(config.page_size)
            .with_provisioner(IndexProvisioner::new(config.provision_timeout));

        Self {
            cache: ConfigurationCache::new(Arc::clone(&settings_store), factory),
            settings_store,
            reindexer,
            incremental: IncrementalSyncHandler::new(reader),
            reindexing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Loads the settings for the first time.
    pub async fn initialize(&self) -> Arc<Snapshot> {
        let snapshot = self.cache.refresh().await;
        info!(active = snapshot.is_active(), "Sync engine ready");
        snapshot
    }

    /// The configuration cache.
    pub fn cache(&self) -> &ConfigurationCache {
        &self.cache
    }

    /// Returns true if the current snapshot has an index client.
    pub fn is_active(&self) -> bool {
        self.cache.current().is_some_and(|s| s.is_active())
    }

    /// Returns true while a full reindex is running.
    pub fn is_reindexing(&self) -> bool {
        self.reindexing.load(Ordering::Acquire)
    }

    /// Runs a full reindex on the current task and waits for it.
    ///
    /// Settings are loaded first if the cache has no active snapshot.
    pub async fn run_reindex(&self) -> ReindexRun {
        let Some(guard) = ReindexGuard::acquire(&self.reindexing) else {
            warn!("Reindex requested while another is running");
            return ReindexRun::AlreadyRunning;
        };
        let snapshot = self.active_or_refreshed().await;
        self.reindex_with(guard, snapshot).await
    }

    /// Launches a full reindex in a background task.
    pub fn spawn_reindex(self: &Arc<Self>) -> ReindexStart {
        let Some(guard) = ReindexGuard::acquire(&self.reindexing) else {
            warn!("Reindex requested while another is running");
            return ReindexStart::AlreadyRunning;
        };
        let engine = Arc::clone(self);
        ReindexStart::Started(tokio::spawn(async move {
            let snapshot = engine.active_or_refreshed().await;
            engine.reindex_with(guard, snapshot).await
        }))
    }

    /// Handles a manual reindex request.
    ///
    /// The settings record is re-read so that missing or incomplete settings
    /// are reported to the caller before any background work starts.
    ///
    /// # Errors
    ///
    /// * `TriggerError::SettingsNotFound` - The settings record does not exist
    /// * `TriggerError::NotConfigured` - Host or API key is missing
    /// * `TriggerError::Store` - The settings record could not be read
    pub async fn start_manual_reindex(self: &Arc<Self>) -> Result<ReindexStart, TriggerError> {
        let record = self
            .settings_store
            .read_settings()
            .await?
            .ok_or(TriggerError::SettingsNotFound)?;

        let snapshot = self.cache.install(Some(&record));
        if !snapshot.is_active() {
            return Err(TriggerError::NotConfigured);
        }

        info!("Manual reindex requested");
        Ok(self.spawn_reindex())
    }

    /// Reacts to an update of the settings record.
    ///
    /// Reloads the cache and, if the update set `force_reindex`, launches a
    /// reindex. Returns the launch result when one was requested.
    pub async fn on_settings_updated(self: &Arc<Self>, payload: &Value) -> Option<ReindexStart> {
        self.cache.refresh().await;

        let requested = payload.get("force_reindex").and_then(Value::as_bool) == Some(true);
        if !requested {
            return None;
        }
        info!("Reindex requested through settings update");
        Some(self.spawn_reindex())
    }

    /// Applies a create event.
    pub async fn on_create(&self, collection: &str, key: &RecordKey) -> SyncOutcome {
        let snapshot = self.cache.current_or_inactive();
        self.incremental.on_create(&snapshot, collection, key).await
    }

    /// Applies an update event.
    pub async fn on_update(&self, collection: &str, keys: &[RecordKey]) -> SyncOutcome {
        let snapshot = self.cache.current_or_inactive();
        self.incremental.on_update(&snapshot, collection, keys).await
    }

    /// Applies a delete event.
    pub async fn on_delete(&self, collection: &str, keys: &[RecordKey]) -> SyncOutcome {
        let snapshot = self.cache.current_or_inactive();
        self.incremental.on_delete(&snapshot, collection, keys).await
    }

    async fn active_or_refreshed(&self) -> Arc<Snapshot> {
        match self.cache.current() {
            Some(snapshot) if snapshot.is_active() => snapshot,
            _ => self.cache.refresh().await,
        }
    }

    async fn reindex_with(&self, _guard: ReindexGuard, snapshot: Arc<Snapshot>) -> ReindexRun {
        let Some(client) = snapshot.client() else {
            info!("Synchronization inactive, reindex skipped");
            return ReindexRun::Inactive;
        };
        ReindexRun::Completed(self.reindexer.reindex_all(snapshot.settings(), client).await)
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("cache", &self.cache)
            .field("reindexer", &self.reindexer)
            .field("reindexing", &self.is_reindexing())
            .finish()
    }
}
