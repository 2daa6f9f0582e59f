//! Test fixtures for the HTTP boundary.

use serde_json::{Value, json};

/// Admin token configured by [`ServerConfig::for_testing`](meilisync_rest::ServerConfig::for_testing).
pub const ADMIN_TOKEN: &str = "test-admin-token";

/// A settings record with the given collection configurations.
pub fn settings(collections: Value) -> Value {
    json!({
        "id": 1,
        "host": "http://search.test:7700",
        "api_key": "test-key",
        "collections_configuration": collections,
        "force_reindex": false
    })
}

/// A configuration that indexes published records of `name`.
pub fn published_only(name: &str) -> Value {
    json!({
        "collection": name,
        "fields": ["*"],
        "queryFilter": {"status": {"_eq": "published"}},
        "actionFilter": {"status": {"_eq": "published"}}
    })
}

/// A published post.
pub fn post(id: i64) -> Value {
    json!({
        "id": id,
        "status": "published",
        "title": format!("Post {}", id),
        "body": {"content": "<p>Hello</p>"}
    })
}

/// A draft post.
pub fn draft(id: i64) -> Value {
    let mut record = post(id);
    record["status"] = json!("draft");
    record
}
