//! Meilisearch client tests against a mock HTTP server.
#![cfg(feature = "meilisearch")]

use std::time::Duration;

use serde_json::{Value, json};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use meilisync_engine::backends::meilisearch::{
    MeilisearchClient, MeilisearchClientFactory, MeilisearchConfig,
};
use meilisync_engine::transform::transform;
use meilisync_engine::types::TaskStatus;
use meilisync_engine::{
    IndexClientFactory, IndexError, IndexProvisioner, Provisioned, RecordKey, SearchIndexClient,
};

const ENQUEUED_AT: &str = "2024-05-01T10:00:00.000000Z";
const FINISHED_AT: &str = "2024-05-01T10:00:00.004000Z";

fn client(server: &MockServer) -> MeilisearchClient {
    MeilisearchClient::new(MeilisearchConfig {
        host: server.uri(),
        api_key: "test-key".to_string(),
        task_poll_interval_ms: 10,
        ..Default::default()
    })
    .unwrap()
}

fn enqueued(task_uid: u32, index_uid: &str, kind: &str) -> Value {
    json!({
        "taskUid": task_uid,
        "indexUid": index_uid,
        "status": "enqueued",
        "type": kind,
        "enqueuedAt": ENQUEUED_AT
    })
}

/// Full `/tasks/{uid}` body of an index creation task.
fn creation_task(task_uid: u32, index_uid: &str, status: &str, error: Option<Value>) -> Value {
    let terminal = matches!(status, "succeeded" | "failed");
    json!({
        "uid": task_uid,
        "indexUid": index_uid,
        "status": status,
        "type": "indexCreation",
        "canceledBy": null,
        "details": {"primaryKey": "id"},
        "error": error,
        "duration": if terminal { json!("PT0.004S") } else { Value::Null },
        "enqueuedAt": ENQUEUED_AT,
        "startedAt": if status == "enqueued" { Value::Null } else { json!(ENQUEUED_AT) },
        "finishedAt": if terminal { json!(FINISHED_AT) } else { Value::Null }
    })
}

fn api_error(message: &str, code: &str, kind: &str) -> Value {
    json!({
        "message": message,
        "code": code,
        "type": kind,
        "link": format!("https://docs.meilisearch.com/errors#{}", code)
    })
}

async fn requests_to(server: &MockServer, route: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap()
        .iter()
        .filter(|request| request.url.path() == route)
        .count()
}

// ── Indexes ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_index_returns_metadata() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/articles"))
        .and(header("authorization", "Bearer test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": "articles",
            "primaryKey": "id",
            "createdAt": ENQUEUED_AT,
            "updatedAt": ENQUEUED_AT
        })))
        .expect(1)
        .mount(&server)
        .await;

    let info = client(&server).get_index("articles").await.unwrap();

    assert_eq!(info.uid, "articles");
    assert_eq!(info.primary_key.as_deref(), Some("id"));
    assert!(info.created_at.is_some());
}

#[tokio::test]
async fn test_get_index_maps_404_to_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_json(api_error(
            "Index `missing` not found.",
            "index_not_found",
            "invalid_request",
        )))
        .mount(&server)
        .await;

    let err = client(&server).get_index("missing").await.unwrap_err();

    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_create_index_waits_for_task() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes"))
        .and(body_json(json!({"uid": "articles", "primaryKey": "id"})))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(enqueued(7, "articles", "indexCreation")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(creation_task(7, "articles", "processing", None)),
        )
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(creation_task(7, "articles", "succeeded", None)),
        )
        .mount(&server)
        .await;

    let task = client(&server)
        .create_index("articles", Some("id"), Duration::from_secs(5))
        .await
        .unwrap();

    assert_eq!(task.uid, 7);
    assert_eq!(task.status, TaskStatus::Succeeded);
    assert_eq!(task.kind, "indexCreation");
    assert_eq!(requests_to(&server, "/tasks/7").await, 3);
}

#[tokio::test]
async fn test_create_index_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(enqueued(9, "articles", "indexCreation")),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/9"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(creation_task(9, "articles", "enqueued", None)),
        )
        .mount(&server)
        .await;

    let err = client(&server)
        .create_index("articles", Some("id"), Duration::from_millis(100))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        IndexError::TaskTimeout {
            task_uid: 9,
            timeout_ms: 100
        }
    ));
}

#[tokio::test]
async fn test_provisioner_creates_missing_index() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/articles"))
        .respond_with(ResponseTemplate::new(404).set_body_json(api_error(
            "Index `articles` not found.",
            "index_not_found",
            "invalid_request",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/indexes"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(enqueued(3, "articles", "indexCreation")),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/tasks/3"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(creation_task(3, "articles", "succeeded", None)),
        )
        .mount(&server)
        .await;

    let provisioned = IndexProvisioner::default()
        .ensure_index(&client(&server), "articles", "id")
        .await;

    match provisioned {
        Provisioned::Ready(info) => assert_eq!(info.primary_key.as_deref(), Some("id")),
        other => panic!("expected ready, got {:?}", other),
    }
}

#[tokio::test]
async fn test_provisioner_reports_failed_creation_task() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/broken"))
        .respond_with(ResponseTemplate::new(404).set_body_json(api_error(
            "Index `broken` not found.",
            "index_not_found",
            "invalid_request",
        )))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/indexes"))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(enqueued(4, "broken", "indexCreation")),
        )
        .mount(&server)
        .await;
    let error = api_error(
        "`broken` is not a valid index uid.",
        "invalid_index_uid",
        "invalid_request",
    );
    Mock::given(method("GET"))
        .and(path("/tasks/4"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(creation_task(4, "broken", "failed", Some(error))),
        )
        .mount(&server)
        .await;

    let provisioned = IndexProvisioner::default()
        .ensure_index(&client(&server), "broken", "id")
        .await;

    assert_eq!(
        provisioned,
        Provisioned::Unavailable("`broken` is not a valid index uid.".to_string())
    );
}

// ── Documents ───────────────────────────────────────────────────

#[tokio::test]
async fn test_upsert_posts_documents_with_primary_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/articles/documents"))
        .and(query_param("primaryKey", "id"))
        .and(header("authorization", "Bearer test-key"))
        .and(body_json(json!([
            {"id": 1, "title": "Hello", "collection": "articles"}
        ])))
        .respond_with(
            ResponseTemplate::new(202)
                .set_body_json(enqueued(11, "articles", "documentAdditionOrUpdate")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let document = transform(&json!({"id": 1, "title": "Hello"}), "articles", false).unwrap();
    let handle = client(&server)
        .upsert_documents("articles", &[document], Some("id"))
        .await
        .unwrap();

    assert_eq!(handle.task_uid, 11);
    assert_eq!(handle.status, TaskStatus::Enqueued);
    assert_eq!(handle.index_uid.as_deref(), Some("articles"));
}

#[tokio::test]
async fn test_delete_posts_key_batch() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/articles/documents/delete-batch"))
        .and(body_json(json!([1, "two"])))
        .respond_with(
            ResponseTemplate::new(202).set_body_json(enqueued(12, "articles", "documentDeletion")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let handle = client(&server)
        .delete_documents("articles", &[RecordKey::from(1), RecordKey::from("two")])
        .await
        .unwrap();

    assert_eq!(handle.task_uid, 12);
    assert_eq!(handle.kind, "documentDeletion");
}

// ── Errors ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_api_errors_carry_code_and_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/indexes/articles/documents"))
        .respond_with(ResponseTemplate::new(403).set_body_json(api_error(
            "The provided API key is invalid.",
            "invalid_api_key",
            "auth",
        )))
        .mount(&server)
        .await;

    let err = client(&server)
        .upsert_documents("articles", &[], None)
        .await
        .unwrap_err();

    match err {
        IndexError::Api { code, message } => {
            assert_eq!(code, "invalid_api_key");
            assert_eq!(message, "The provided API key is invalid.");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_non_json_error_keeps_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/articles"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client(&server).get_index("articles").await.unwrap_err();

    assert!(matches!(err, IndexError::Http { status: 502, .. }));
    assert!(!err.is_not_found());
}

#[tokio::test]
async fn test_unreachable_host_is_a_connection_error() {
    let client = MeilisearchClient::new(MeilisearchConfig {
        host: "http://127.0.0.1:9".to_string(),
        request_timeout_ms: 500,
        ..Default::default()
    })
    .unwrap();

    let err = client.get_index("articles").await.unwrap_err();

    assert!(matches!(err, IndexError::Connection { .. }));
}

// ── Factory ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_factory_clients_send_api_key() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/indexes/articles"))
        .and(header("authorization", "Bearer from-settings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "uid": "articles",
            "primaryKey": null,
            "createdAt": ENQUEUED_AT,
            "updatedAt": ENQUEUED_AT
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = MeilisearchClientFactory::new()
        .connect(&server.uri(), "from-settings")
        .unwrap();

    assert_eq!(client.service_name(), "meilisearch");
    client.get_index("articles").await.unwrap();
}

#[test]
fn test_factory_rejects_invalid_host() {
    let result = MeilisearchClientFactory::new().connect("not a url", "key");
    assert!(matches!(result, Err(IndexError::InvalidConfiguration { .. })));
}
