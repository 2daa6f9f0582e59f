//! Cached settings and index client.
//!
//! The cache holds one immutable [`Snapshot`] at a time. Refreshing builds a
//! new snapshot and swaps it in as a unit, so readers always see settings and
//! client that belong together.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::core::{DynIndexClient, DynSettingsStore, IndexClientFactory, SearchIndexClient};
use crate::types::{IndexingConfiguration, SyncSettings};

/// Settings together with the client built from them.
#[derive(Clone)]
pub struct Snapshot {
    settings: SyncSettings,
    client: Option<DynIndexClient>,
    loaded_at: DateTime<Utc>,
}

impl Snapshot {
    /// A snapshot with no settings and no client.
    pub fn inactive() -> Self {
        Self::new(SyncSettings::default(), None)
    }

    /// Creates a snapshot.
    pub fn new(settings: SyncSettings, client: Option<DynIndexClient>) -> Self {
        Self {
            settings,
            client,
            loaded_at: Utc::now(),
        }
    }

    /// The parsed settings.
    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// The index client, present only when synchronization is active.
    pub fn client(&self) -> Option<&dyn SearchIndexClient> {
        self.client.as_deref()
    }

    /// Returns true if an index client is available.
    pub fn is_active(&self) -> bool {
        self.client.is_some()
    }

    /// Looks up the configuration of a collection.
    pub fn collection(&self, name: &str) -> Option<&IndexingConfiguration> {
        self.settings.collection(name)
    }

    /// When the snapshot was built.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }
}

impl fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("settings", &self.settings)
            .field("client", &self.client.as_ref().map(|c| c.service_name()))
            .field("loaded_at", &self.loaded_at)
            .finish()
    }
}

/// Holds the current [`Snapshot`] and rebuilds it from the settings store.
pub struct ConfigurationCache {
    settings_store: DynSettingsStore,
    factory: Arc<dyn IndexClientFactory>,
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl ConfigurationCache {
    /// Creates an empty cache.
    pub fn new(settings_store: DynSettingsStore, factory: Arc<dyn IndexClientFactory>) -> Self {
        Self {
            settings_store,
            factory,
            current: RwLock::new(None),
        }
    }

    /// Returns the current snapshot, or `None` if nothing has been loaded yet.
    pub fn current(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Returns the current snapshot, or an inactive one if nothing is loaded.
    pub fn current_or_inactive(&self) -> Arc<Snapshot> {
        self.current()
            .unwrap_or_else(|| Arc::new(Snapshot::inactive()))
    }

    /// Re-reads the settings record and installs a new snapshot.
    ///
    /// A read error keeps the previous snapshot if there is one.
    pub async fn refresh(&self) -> Arc<Snapshot> {
        match self.settings_store.read_settings().await {
            Ok(record) => self.install(record.as_ref()),
            Err(e) => {
                error!(error = %e, "Failed to read settings");
                if let Some(previous) = self.current() {
                    return previous;
                }
                self.swap(Snapshot::inactive())
            }
        }
    }

    /// Builds a snapshot from a settings record and installs it.
    ///
    /// `None` means the record does not exist; the snapshot is inactive.
    pub fn install(&self, record: Option<&Value>) -> Arc<Snapshot> {
        let snapshot = match record {
            None => {
                info!("Settings record not found, synchronization inactive");
                Snapshot::inactive()
            }
            Some(record) => self.build(record),
        };
        self.swap(snapshot)
    }

    fn build(&self, record: &Value) -> Snapshot {
        let settings = match SyncSettings::from_record(record) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(error = %e, "Unparseable settings, synchronization inactive");
                return Snapshot::inactive();
            }
        };

        if !settings.is_active() {
            info!("Host or API key missing, synchronization inactive");
            return Snapshot::new(settings, None);
        }

        match self.factory.connect(&settings.host, &settings.api_key) {
            Ok(client) => {
                info!(
                    host = %settings.host,
                    collections = settings.collections.len(),
                    "Settings reloaded"
                );
                Snapshot::new(settings, Some(client))
            }
            Err(e) => {
                error!(host = %settings.host, error = %e, "Failed to build index client");
                Snapshot::new(settings, None)
            }
        }
    }

    fn swap(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        *self.current.write() = Some(Arc::clone(&snapshot));
        snapshot
    }
}

impl fmt::Debug for ConfigurationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigurationCache")
            .field("current", &self.current.read())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::memory::{MemoryIndexFactory, MemoryStore};
    use serde_json::json;

    fn cache_with(store: &Arc<MemoryStore>) -> (ConfigurationCache, Arc<MemoryIndexFactory>) {
        let factory = Arc::new(MemoryIndexFactory::new());
        let cache = ConfigurationCache::new(store.clone(), factory.clone());
        (cache, factory)
    }

    #[tokio::test]
    async fn test_empty_until_refreshed() {
        let store = Arc::new(MemoryStore::new());
        let (cache, _) = cache_with(&store);

        assert!(cache.current().is_none());
        assert!(!cache.current_or_inactive().is_active());
    }

    #[tokio::test]
    async fn test_missing_settings_is_inactive() {
        let store = Arc::new(MemoryStore::new());
        let (cache, factory) = cache_with(&store);

        let snapshot = cache.refresh().await;
        assert!(!snapshot.is_active());
        assert_eq!(factory.connections(), 0);
    }

    #[tokio::test]
    async fn test_active_settings_build_client() {
        let store = Arc::new(MemoryStore::new());
        store.set_settings(json!({
            "host": "http://localhost:7700",
            "api_key": "key",
            "collections_configuration": [{"collection": "articles"}]
        }));
        let (cache, factory) = cache_with(&store);

        let snapshot = cache.refresh().await;
        assert!(snapshot.is_active());
        assert!(snapshot.collection("articles").is_some());
        assert_eq!(factory.connections(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_inactive() {
        let store = Arc::new(MemoryStore::new());
        store.set_settings(json!({"host": "http://localhost:7700", "api_key": ""}));
        let (cache, factory) = cache_with(&store);

        assert!(!cache.refresh().await.is_active());
        assert_eq!(factory.connections(), 0);
    }

    #[tokio::test]
    async fn test_read_error_keeps_previous_snapshot() {
        let store = Arc::new(MemoryStore::new());
        store.set_settings(json!({"host": "http://localhost:7700", "api_key": "key"}));
        let (cache, _) = cache_with(&store);

        let first = cache.refresh().await;
        store.fail_settings_reads("connection reset");
        let second = cache.refresh().await;

        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.is_active());
    }
}
