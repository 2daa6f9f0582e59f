//! Directus backend tests against a mock HTTP server.
#![cfg(feature = "directus")]

use std::collections::HashMap;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meilisync_engine::backends::directus::{DirectusClient, DirectusConfig};
use meilisync_engine::core::{KeyQuery, PageQuery};
use meilisync_engine::{RecordKey, RecordReader, SettingsStore, StoreError};

fn client(server: &MockServer) -> DirectusClient {
    DirectusClient::new(DirectusConfig {
        url: server.uri(),
        token: "static-token".to_string(),
        ..Default::default()
    })
    .unwrap()
}

/// Query parameters of the only request the server received.
async fn single_query(server: &MockServer) -> HashMap<String, String> {
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

// ── Records ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_read_page_sends_paging_parameters() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/articles"))
        .and(header("authorization", "Bearer static-token"))
        .and(query_param("fields", "id,title"))
        .and(query_param("limit", "100"))
        .and(query_param("offset", "200"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 201, "title": "A"}, {"id": 202, "title": "B"}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let query = PageQuery {
        fields: vec!["id".to_string(), "title".to_string()],
        filter: Some(json!({"status": {"_eq": "published"}})),
        limit: 100,
        offset: 200,
    };
    let records = client(&server).read_page("articles", &query).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["id"], json!(201));

    let params = single_query(&server).await;
    let filter: Value = serde_json::from_str(&params["filter"]).unwrap();
    assert_eq!(filter, json!({"status": {"_eq": "published"}}));
}

#[tokio::test]
async fn test_read_page_without_fields_requests_everything() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/articles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&server)
        .await;

    let query = PageQuery {
        fields: Vec::new(),
        filter: None,
        limit: 10,
        offset: 0,
    };
    let records = client(&server).read_page("articles", &query).await.unwrap();

    assert!(records.is_empty());
    let params = single_query(&server).await;
    assert_eq!(params["fields"], "*");
    assert!(!params.contains_key("filter"));
}

#[tokio::test]
async fn test_read_by_keys_combines_keys_and_action_filter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/articles"))
        .and(query_param("limit", "-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1, "status": "published"}]
        })))
        .mount(&server)
        .await;

    let keys = [RecordKey::from(1), RecordKey::from(2)];
    let fields = vec!["*".to_string()];
    let action_filter = json!({"status": {"_eq": "published"}});
    let query = KeyQuery {
        primary_key: "id",
        keys: &keys,
        fields: &fields,
        filter: Some(&action_filter),
    };
    let records = client(&server)
        .read_by_keys("articles", &query)
        .await
        .unwrap();

    assert_eq!(records.len(), 1);
    let params = single_query(&server).await;
    let filter: Value = serde_json::from_str(&params["filter"]).unwrap();
    assert_eq!(
        filter,
        json!({"_and": [
            {"id": {"_in": [1, 2]}},
            {"status": {"_eq": "published"}}
        ]})
    );
}

#[tokio::test]
async fn test_read_by_keys_without_keys_skips_request() {
    let server = MockServer::start().await;

    let query = KeyQuery {
        primary_key: "id",
        keys: &[],
        fields: &[],
        filter: None,
    };
    let records = client(&server)
        .read_by_keys("articles", &query)
        .await
        .unwrap();

    assert!(records.is_empty());
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_request_errors_carry_directus_message() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/secret"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "errors": [{
                "message": "Invalid query. Invalid filter.",
                "extensions": {"code": "INVALID_QUERY"}
            }]
        })))
        .mount(&server)
        .await;

    let query = PageQuery {
        fields: Vec::new(),
        filter: None,
        limit: 1,
        offset: 0,
    };
    let err = client(&server).read_page("secret", &query).await.unwrap_err();

    match err {
        StoreError::Request {
            collection,
            status,
            message,
        } => {
            assert_eq!(collection, "secret");
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid query. Invalid filter.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

// ── Settings record ─────────────────────────────────────────────

#[tokio::test]
async fn test_read_settings_returns_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/meilisearch_settings/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": 1, "host": "http://search:7700", "api_key": "k", "force_reindex": true}
        })))
        .mount(&server)
        .await;

    let record = client(&server).read_settings().await.unwrap().unwrap();

    assert_eq!(record["host"], json!("http://search:7700"));
    assert_eq!(record["force_reindex"], json!(true));
}

#[tokio::test]
async fn test_missing_settings_record_reads_as_none() {
    for status in [403, 404] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/items/meilisearch_settings/1"))
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "errors": [{"message": "You don't have permission to access this."}]
            })))
            .mount(&server)
            .await;

        assert!(client(&server).read_settings().await.unwrap().is_none());
    }
}

#[tokio::test]
async fn test_settings_server_error_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/items/meilisearch_settings/1"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client(&server).read_settings().await.unwrap_err();

    assert!(matches!(err, StoreError::Request { status: 503, .. }));
}

#[tokio::test]
async fn test_clear_reindex_flag_patches_record() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/items/search_settings/main"))
        .and(body_json(json!({"force_reindex": false})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"id": "main", "force_reindex": false}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DirectusClient::new(DirectusConfig {
        url: server.uri(),
        settings_collection: "search_settings".to_string(),
        settings_id: "main".to_string(),
        ..Default::default()
    })
    .unwrap();

    client.clear_reindex_flag().await.unwrap();
}

// ── Construction ────────────────────────────────────────────────

#[test]
fn test_invalid_url_is_rejected() {
    let result = DirectusClient::new(DirectusConfig {
        url: "::not a url".to_string(),
        ..Default::default()
    });
    assert!(matches!(result, Err(StoreError::Unavailable { .. })));
}

#[test]
fn test_token_is_redacted_in_debug() {
    let config = DirectusConfig {
        token: "static-token".to_string(),
        ..Default::default()
    };
    let rendered = format!("{:?}", config);
    assert!(!rendered.contains("static-token"));
    assert!(rendered.contains("meilisearch_settings"));
}
