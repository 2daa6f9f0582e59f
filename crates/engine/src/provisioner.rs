//! Create-if-absent index provisioning.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::core::SearchIndexClient;
use crate::types::{IndexInfo, TaskOutcome, TaskStatus};

/// Default bound on waiting for an index-creation task.
pub const DEFAULT_PROVISION_TIMEOUT: Duration = Duration::from_secs(10);

/// Error code the index service reports when a concurrent creation won the race.
const INDEX_ALREADY_EXISTS: &str = "index_already_exists";

/// Result of [`IndexProvisioner::ensure_index`].
#[derive(Debug, Clone, PartialEq)]
pub enum Provisioned {
    /// The index exists and can be written to.
    Ready(IndexInfo),
    /// The index could not be obtained; the message says why.
    Unavailable(String),
}

impl Provisioned {
    /// Returns true if the index is ready.
    pub fn is_ready(&self) -> bool {
        matches!(self, Provisioned::Ready(_))
    }
}

/// Ensures an index exists before it is written to.
///
/// This is the only component that waits for an index task to finish.
#[derive(Debug, Clone, Copy)]
pub struct IndexProvisioner {
    timeout: Duration,
}

impl Default for IndexProvisioner {
    fn default() -> Self {
        Self::new(DEFAULT_PROVISION_TIMEOUT)
    }
}

impl IndexProvisioner {
    /// Creates a provisioner that waits at most `timeout` for index creation.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Returns the creation timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches the index for `collection`, creating it if it does not exist.
    ///
    /// Never fails: every error is folded into [`Provisioned::Unavailable`].
    pub async fn ensure_index(
        &self,
        client: &dyn SearchIndexClient,
        collection: &str,
        primary_key: &str,
    ) -> Provisioned {
        match client.get_index(collection).await {
            Ok(info) => Provisioned::Ready(info),
            Err(e) if e.is_not_found() => self.create(client, collection, primary_key).await,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Failed to fetch index");
                Provisioned::Unavailable(e.to_string())
            }
        }
    }

    async fn create(
        &self,
        client: &dyn SearchIndexClient,
        collection: &str,
        primary_key: &str,
    ) -> Provisioned {
        debug!(collection = %collection, primary_key = %primary_key, "Index not found, creating");

        let task = match client
            .create_index(collection, Some(primary_key), self.timeout)
            .await
        {
            Ok(task) => task,
            Err(e) => {
                warn!(collection = %collection, error = %e, "Index creation did not complete");
                return Provisioned::Unavailable(e.to_string());
            }
        };

        let lost_race = task.status == TaskStatus::Failed
            && task
                .error
                .as_ref()
                .is_some_and(|err| err.code == INDEX_ALREADY_EXISTS);
        if lost_race {
            debug!(collection = %collection, "Index created concurrently");
            return match client.get_index(collection).await {
                Ok(info) => Provisioned::Ready(info),
                Err(e) => Provisioned::Unavailable(e.to_string()),
            };
        }

        let outcome = TaskOutcome::from_task(&task);
        if !outcome.success {
            warn!(collection = %collection, reason = %outcome.message, "Index creation failed");
            return Provisioned::Unavailable(outcome.message);
        }

        info!(collection = %collection, task_uid = task.uid, "Created index");
        Provisioned::Ready(IndexInfo {
            uid: collection.to_string(),
            primary_key: Some(primary_key.to_string()),
            created_at: task.finished_at,
            updated_at: task.finished_at,
        })
    }
}
