//! Flattened search documents.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Attribute injected into every document, naming its source collection.
pub const COLLECTION_FIELD: &str = "collection";

/// A flat, sanitized representation of one source record.
///
/// Keys are dot-separated paths into the original record. Values are scalars,
/// or whole arrays when the collection is configured to preserve arrays.
/// Documents are built by [`crate::transform::transform`] and are never
/// mutated after they are handed to an index client.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlattenedDocument(Map<String, Value>);

impl FlattenedDocument {
    /// Creates an empty document.
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Returns the value stored under a flattened key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Returns true if the document holds the key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the document has no keys.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the flattened keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    /// Iterates over key/value pairs in sorted key order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Returns the source collection tag, if set.
    pub fn collection(&self) -> Option<&str> {
        self.0.get(COLLECTION_FIELD).and_then(Value::as_str)
    }

    /// Returns the value of the primary key field.
    pub fn primary_key(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns the underlying map.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Consumes the document, returning the underlying map.
    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    pub(crate) fn insert(&mut self, key: String, value: Value) {
        self.0.insert(key, value);
    }

    pub(crate) fn retain<F>(&mut self, keep: F)
    where
        F: FnMut(&String, &mut Value) -> bool,
    {
        self.0.retain(keep);
    }
}

impl From<FlattenedDocument> for Value {
    fn from(document: FlattenedDocument) -> Self {
        Value::Object(document.0)
    }
}
