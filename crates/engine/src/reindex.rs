//! Full reindex of every configured collection.
//!
//! A full reindex walks the settings' collection list in order. Each
//! collection is handled independently: its index is provisioned, its
//! eligible records are paged through, transformed and upserted one page at
//! a time. A problem with one collection never stops the others.
//!
//! Once every collection has been visited the `force_reindex` flag is
//! cleared through the settings store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::core::{DynRecordReader, DynSettingsStore, PageQuery, SearchIndexClient};
use crate::provisioner::{IndexProvisioner, Provisioned};
use crate::transform::transform;
use crate::types::{IndexingConfiguration, SyncSettings};

/// Number of records read and upserted per page.
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// What happened to one collection during a full reindex.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CollectionOutcome {
    /// Every page was read and written.
    Completed {
        /// Documents upserted.
        documents: u64,
        /// Non-empty pages read.
        pages: u64,
        /// Records skipped because they could not be transformed.
        failed_records: u64,
    },
    /// The index could not be provisioned; nothing was read.
    Skipped {
        /// Why the index was unavailable.
        reason: String,
    },
    /// A read or write failed part way through.
    Failed {
        /// The error that stopped the collection.
        error: String,
        /// Documents upserted before the failure.
        documents: u64,
    },
}

impl CollectionOutcome {
    /// Returns true if the collection was fully processed.
    pub fn is_completed(&self) -> bool {
        matches!(self, CollectionOutcome::Completed { .. })
    }

    /// Number of documents written to the index.
    pub fn documents(&self) -> u64 {
        match self {
            CollectionOutcome::Completed { documents, .. }
            | CollectionOutcome::Failed { documents, .. } => *documents,
            CollectionOutcome::Skipped { .. } => 0,
        }
    }
}

/// Outcome of one collection, tagged with its name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionReport {
    /// Collection name.
    pub collection: String,
    /// What happened.
    #[serde(flatten)]
    pub outcome: CollectionOutcome,
}

/// Summary of a full reindex run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReindexReport {
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the run finished.
    pub completed_at: Option<DateTime<Utc>>,
    /// Per-collection outcomes, in processing order.
    pub collections: Vec<CollectionReport>,
    /// Whether `force_reindex` was cleared afterwards.
    pub flag_cleared: bool,
}

impl ReindexReport {
    /// Starts an empty report.
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            completed_at: None,
            collections: Vec::new(),
            flag_cleared: false,
        }
    }

    /// Returns the outcome recorded for a collection.
    pub fn outcome(&self, collection: &str) -> Option<&CollectionOutcome> {
        self.collections
            .iter()
            .find(|c| c.collection == collection)
            .map(|c| &c.outcome)
    }

    /// Total documents upserted across all collections.
    pub fn total_documents(&self) -> u64 {
        self.collections.iter().map(|c| c.outcome.documents()).sum()
    }

    /// Number of collections that completed.
    pub fn completed_count(&self) -> usize {
        self.collections
            .iter()
            .filter(|c| c.outcome.is_completed())
            .count()
    }

    /// Returns true if any collection was skipped or failed.
    pub fn has_failures(&self) -> bool {
        self.completed_count() < self.collections.len()
    }

    /// Duration of the run in milliseconds, once finished.
    pub fn elapsed_ms(&self) -> Option<i64> {
        self.completed_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

impl Default for ReindexReport {
    fn default() -> Self {
        Self::new()
    }
}

/// Pages every eligible record of every configured collection into its index.
pub struct FullReindexer {
    reader: DynRecordReader,
    settings_store: DynSettingsStore,
    provisioner: IndexProvisioner,
    page_size: usize,
}

impl FullReindexer {
    /// Creates a reindexer with the default page size and provisioning timeout.
    pub fn new(reader: DynRecordReader, settings_store: DynSettingsStore) -> Self {
        Self {
            reader,
            settings_store,
            provisioner: IndexProvisioner::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Sets the page size. Values below 1 are raised to 1.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Sets the provisioner used before writing to each index.
    pub fn with_provisioner(mut self, provisioner: IndexProvisioner) -> Self {
        self.provisioner = provisioner;
        self
    }

    /// Returns the page size.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Reindexes every configured collection, then clears `force_reindex`.
    ///
    /// Errors never escape: each is logged and recorded in the report.
    pub async fn reindex_all(
        &self,
        settings: &SyncSettings,
        client: &dyn SearchIndexClient,
    ) -> ReindexReport {
        let mut report = ReindexReport::new();
        info!(
            service = client.service_name(),
            collections = settings.collections.len(),
            "Starting full reindex"
        );

        for config in &settings.collections {
            let outcome = self.reindex_collection(config, client).await;
            match &outcome {
                CollectionOutcome::Completed {
                    documents,
                    pages,
                    failed_records,
                } => info!(
                    collection = %config.collection,
                    documents = documents,
                    pages = pages,
                    failed_records = failed_records,
                    "Reindexed collection"
                ),
                CollectionOutcome::Skipped { reason } => warn!(
                    collection = %config.collection,
                    reason = %reason,
                    "Skipped collection, index unavailable"
                ),
                CollectionOutcome::Failed { error, documents } => error!(
                    collection = %config.collection,
                    documents = documents,
                    error = %error,
                    "Reindex of collection aborted"
                ),
            }
            report.collections.push(CollectionReport {
                collection: config.collection.clone(),
                outcome,
            });
        }

        match self.settings_store.clear_reindex_flag().await {
            Ok(()) => report.flag_cleared = true,
            Err(e) => error!(error = %e, "Failed to clear force_reindex flag"),
        }

        report.completed_at = Some(Utc::now());
        info!(
            documents = report.total_documents(),
            completed = report.completed_count(),
            collections = report.collections.len(),
            elapsed_ms = report.elapsed_ms().unwrap_or_default(),
            "Full reindex finished"
        );
        report
    }

    async fn reindex_collection(
        &self,
        config: &IndexingConfiguration,
        client: &dyn SearchIndexClient,
    ) -> CollectionOutcome {
        let collection = config.collection.as_str();
        let primary_key = config.primary_key();

        if let Provisioned::Unavailable(reason) = self
            .provisioner
            .ensure_index(client, collection, primary_key)
            .await
        {
            return CollectionOutcome::Skipped { reason };
        }

        let mut documents_written = 0u64;
        let mut pages = 0u64;
        let mut failed_records = 0u64;
        let mut offset = 0usize;

        loop {
            let query = PageQuery {
                fields: config.fields.clone(),
                filter: config.query_filter.clone(),
                limit: self.page_size,
                offset,
            };

            let records = match self.reader.read_page(collection, &query).await {
                Ok(records) => records,
                Err(e) => {
                    return CollectionOutcome::Failed {
                        error: e.to_string(),
                        documents: documents_written,
                    };
                }
            };
            if records.is_empty() {
                break;
            }
            pages += 1;

            let mut documents = Vec::with_capacity(records.len());
            for record in &records {
                match transform(record, collection, config.preserve_arrays) {
                    Ok(document) => documents.push(document),
                    Err(e) => {
                        failed_records += 1;
                        warn!(
                            collection = %collection,
                            offset = offset,
                            error = %e,
                            "Skipping record that failed to transform"
                        );
                    }
                }
            }

            if !documents.is_empty() {
                if let Err(e) = client
                    .upsert_documents(collection, &documents, Some(primary_key))
                    .await
                {
                    return CollectionOutcome::Failed {
                        error: e.to_string(),
                        documents: documents_written,
                    };
                }
                documents_written += documents.len() as u64;
            }

            debug!(
                collection = %collection,
                offset = offset,
                records = records.len(),
                "Indexed page"
            );

            // A short page is the last one.
            if records.len() < self.page_size {
                break;
            }
            offset += self.page_size;
        }

        CollectionOutcome::Completed {
            documents: documents_written,
            pages,
            failed_records,
        }
    }
}

impl std::fmt::Debug for FullReindexer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FullReindexer")
            .field("reader", &self.reader.store_name())
            .field("provisioner", &self.provisioner)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_totals() {
        let mut report = ReindexReport::new();
        report.collections.push(CollectionReport {
            collection: "articles".to_string(),
            outcome: CollectionOutcome::Completed {
                documents: 250,
                pages: 3,
                failed_records: 0,
            },
        });
        report.collections.push(CollectionReport {
            collection: "pages".to_string(),
            outcome: CollectionOutcome::Skipped {
                reason: "timeout".to_string(),
            },
        });

        assert_eq!(report.total_documents(), 250);
        assert_eq!(report.completed_count(), 1);
        assert!(report.has_failures());
        assert!(report.outcome("pages").is_some());
        assert!(report.outcome("missing").is_none());
    }

    #[test]
    fn test_collection_report_serialization() {
        let report = CollectionReport {
            collection: "articles".to_string(),
            outcome: CollectionOutcome::Failed {
                error: "boom".to_string(),
                documents: 100,
            },
        };

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["collection"], "articles");
        assert_eq!(json["status"], "failed");
        assert_eq!(json["documents"], 100);
    }
}
