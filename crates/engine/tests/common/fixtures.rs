//! Test fixtures.

use serde_json::{Value, json};

/// Host used by every settings fixture.
pub const HOST: &str = "http://search.test:7700";

/// A settings record with the given collection configurations.
pub fn settings(collections: Value) -> Value {
    json!({
        "id": 1,
        "host": HOST,
        "api_key": "test-key",
        "collections_configuration": collections,
        "force_reindex": false
    })
}

/// A configuration for `collection` with all fields and no filters.
pub fn collection(name: &str) -> Value {
    json!({"collection": name, "fields": ["*"]})
}

/// A configuration that only indexes published records.
pub fn published_only(name: &str) -> Value {
    json!({
        "collection": name,
        "fields": ["*"],
        "queryFilter": {"status": {"_eq": "published"}},
        "actionFilter": {"status": {"_eq": "published"}}
    })
}

/// An article with nested rich text, tags and a null field.
pub fn article(id: i64) -> Value {
    json!({
        "id": id,
        "status": "published",
        "title": format!("Article {}", id),
        "subtitle": null,
        "tags": ["rust", "search"],
        "article": {
            "content": format!("<p>Body of <b>article</b> {}</p>", id),
            "summary": "<em>Short</em> summary"
        },
        "body": {
            "blocks": [{"type": "paragraph", "data": {"text": "block text"}}]
        }
    })
}

/// `count` published articles with ids starting at 1.
pub fn articles(count: i64) -> Vec<Value> {
    (1..=count).map(article).collect()
}

/// An article whose status is `draft`.
pub fn draft(id: i64) -> Value {
    let mut record = article(id);
    record["status"] = json!("draft");
    record
}
