//! Parsed form of the singleton settings record.
//!
//! The persisted shape is:
//!
//! ```json
//! {
//!   "host": "https://search.example.com",
//!   "api_key": "...",
//!   "collections_configuration": [
//!     {
//!       "collection": "articles",
//!       "fields": ["id", "title", "content", "tags"],
//!       "queryFilter": {"status": {"_eq": "published"}},
//!       "actionFilter": {"status": {"_eq": "published"}},
//!       "preserveArrays": true
//!     }
//!   ],
//!   "force_reindex": false
//! }
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::ConfigError;

/// Primary key field used when a configuration does not name one.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// Indexing configuration for one synchronized collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingConfiguration {
    /// Source collection name; also the index uid.
    pub collection: String,

    /// Fields to project when reading records.
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<String>,

    /// Filter selecting which records a full reindex includes.
    #[serde(default)]
    pub query_filter: Option<Value>,

    /// Filter re-applied on update events to decide whether a record stays indexed.
    #[serde(default)]
    pub action_filter: Option<Value>,

    /// Keep arrays intact instead of flattening them into indexed keys.
    #[serde(default, deserialize_with = "null_as_default")]
    pub preserve_arrays: bool,

    /// Primary key field of the collection (defaults to `id`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<String>,
}

impl IndexingConfiguration {
    /// Creates a configuration projecting all fields with no filters.
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            fields: vec!["*".to_string()],
            query_filter: None,
            action_filter: None,
            preserve_arrays: false,
            primary_key: None,
        }
    }

    /// Sets the projected fields.
    pub fn with_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the full-reindex filter.
    pub fn with_query_filter(mut self, filter: Value) -> Self {
        self.query_filter = Some(filter);
        self
    }

    /// Sets the update-event eligibility filter.
    pub fn with_action_filter(mut self, filter: Value) -> Self {
        self.action_filter = Some(filter);
        self
    }

    /// Enables array preservation.
    pub fn preserving_arrays(mut self) -> Self {
        self.preserve_arrays = true;
        self
    }

    /// Sets the primary key field.
    pub fn with_primary_key(mut self, field: impl Into<String>) -> Self {
        self.primary_key = Some(field.into());
        self
    }

    /// Returns the primary key field name.
    pub fn primary_key(&self) -> &str {
        self.primary_key.as_deref().unwrap_or(DEFAULT_PRIMARY_KEY)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Connection parameters and per-collection configurations.
#[derive(Clone, Default, PartialEq)]
pub struct SyncSettings {
    /// Index service URL.
    pub host: String,
    /// Index service API key.
    pub api_key: String,
    /// Collections to synchronize, in processing order.
    pub collections: Vec<IndexingConfiguration>,
    /// The "reindex requested" flag.
    pub force_reindex: bool,
}

impl fmt::Debug for SyncSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncSettings")
            .field("host", &self.host)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "***" })
            .field("collections", &self.collections)
            .field("force_reindex", &self.force_reindex)
            .finish()
    }
}

impl SyncSettings {
    /// Parses the settings record as returned by the record store.
    ///
    /// Missing or null connection fields parse as empty strings, which leaves
    /// the engine inactive. `collections_configuration` may be an array or a
    /// string holding a JSON array. Entries that fail to parse are skipped with
    /// a warning; a repeated collection name keeps its first entry.
    pub fn from_record(record: &Value) -> Result<Self, ConfigError> {
        let object = record.as_object().ok_or_else(|| ConfigError::Invalid {
            message: "settings record is not an object".to_string(),
        })?;

        let text = |name: &str| {
            object
                .get(name)
                .and_then(Value::as_str)
                .map(|s| s.trim().to_string())
                .unwrap_or_default()
        };

        let entries = match object.get("collections_configuration") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries.clone(),
            Some(Value::String(raw)) if raw.trim().is_empty() => Vec::new(),
            Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
                Ok(Value::Array(entries)) => entries,
                Ok(_) => {
                    return Err(ConfigError::Invalid {
                        message: "collections_configuration must be an array".to_string(),
                    });
                }
                Err(e) => {
                    return Err(ConfigError::Invalid {
                        message: format!("collections_configuration is not valid JSON: {}", e),
                    });
                }
            },
            Some(_) => {
                return Err(ConfigError::Invalid {
                    message: "collections_configuration must be an array".to_string(),
                });
            }
        };

        let mut seen = HashSet::new();
        let mut collections = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            match serde_json::from_value::<IndexingConfiguration>(entry) {
                Ok(config) if config.collection.is_empty() => {
                    warn!(position, "Skipping collection configuration without a name");
                }
                Ok(config) => {
                    if seen.insert(config.collection.clone()) {
                        collections.push(config);
                    } else {
                        warn!(
                            collection = %config.collection,
                            "Ignoring duplicate collection configuration"
                        );
                    }
                }
                Err(e) => {
                    warn!(position, error = %e, "Skipping invalid collection configuration");
                }
            }
        }

        Ok(Self {
            host: text("host"),
            api_key: text("api_key"),
            collections,
            force_reindex: object
                .get("force_reindex")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    /// Returns true if both connection parameters are present.
    pub fn is_active(&self) -> bool {
        !self.host.is_empty() && !self.api_key.is_empty()
    }

    /// Looks up the configuration for a collection.
    pub fn collection(&self, name: &str) -> Option<&IndexingConfiguration> {
        self.collections.iter().find(|c| c.collection == name)
    }
}
