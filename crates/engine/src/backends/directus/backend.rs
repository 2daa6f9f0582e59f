//! Directus client implementation.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::core::{KeyQuery, PageQuery, RecordReader, SettingsStore};
use crate::error::{StoreError, StoreResult};

/// Configuration for the Directus backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct DirectusConfig {
    /// Base URL of the Directus instance.
    pub url: String,

    /// Static access token.
    #[serde(default)]
    pub token: String,

    /// Collection holding the settings record (default: `meilisearch_settings`).
    #[serde(default = "default_settings_collection")]
    pub settings_collection: String,

    /// Primary key of the settings record (default: `1`).
    #[serde(default = "default_settings_id")]
    pub settings_id: String,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_settings_collection() -> String {
    "meilisearch_settings".to_string()
}

fn default_settings_id() -> String {
    "1".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for DirectusConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8055".to_string(),
            token: String::new(),
            settings_collection: default_settings_collection(),
            settings_id: default_settings_id(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl fmt::Debug for DirectusConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectusConfig")
            .field("url", &self.url)
            .field("token", &if self.token.is_empty() { "" } else { "***" })
            .field("settings_collection", &self.settings_collection)
            .field("settings_id", &self.settings_id)
            .field("request_timeout_ms", &self.request_timeout_ms)
            .finish()
    }
}

/// `{"data": ...}` envelope of every Directus response.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    message: String,
}

/// HTTP client for the Directus items API.
pub struct DirectusClient {
    http: Client,
    config: DirectusConfig,
    base_url: String,
}

impl fmt::Debug for DirectusClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectusClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DirectusClient {
    /// Creates a client. Fails if the URL is invalid.
    pub fn new(config: DirectusConfig) -> StoreResult<Self> {
        let base_url = config.url.trim_end_matches('/').to_string();
        reqwest::Url::parse(&base_url).map_err(|e| StoreError::Unavailable {
            message: format!("Invalid Directus URL '{}': {}", config.url, e),
        })?;

        let http = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| StoreError::Unavailable {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            config,
            base_url,
        })
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &DirectusConfig {
        &self.config
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if self.config.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.config.token)
        }
    }

    fn settings_path(&self) -> String {
        format!(
            "/items/{}/{}",
            self.config.settings_collection, self.config.settings_id
        )
    }

    async fn send(&self, collection: &str, builder: RequestBuilder) -> StoreResult<Response> {
        let response = builder.send().await.map_err(|e| StoreError::Unavailable {
            message: e.to_string(),
        })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&text)
            .ok()
            .and_then(|body| body.errors.into_iter().next())
            .map(|entry| entry.message)
            .unwrap_or_else(|| {
                if text.is_empty() {
                    status.to_string()
                } else {
                    text
                }
            });

        Err(StoreError::Request {
            collection: collection.to_string(),
            status: status.as_u16(),
            message,
        })
    }

    async fn read_items(
        &self,
        collection: &str,
        params: Vec<(&'static str, String)>,
    ) -> StoreResult<Vec<Value>> {
        let builder = self
            .request(Method::GET, &format!("/items/{}", collection))
            .query(&params);
        let response = self.send(collection, builder).await?;
        let envelope: Envelope<Vec<Value>> =
            response.json().await.map_err(|e| StoreError::Serialization {
                message: format!("Failed to decode items of {}: {}", collection, e),
            })?;
        Ok(envelope.data)
    }
}

fn fields_param(fields: &[String]) -> String {
    if fields.is_empty() {
        "*".to_string()
    } else {
        fields.join(",")
    }
}

/// Combines the key restriction with an optional extra filter.
fn key_filter(query: &KeyQuery<'_>) -> Value {
    let keys: Vec<Value> = query.keys.iter().map(|k| k.to_value()).collect();
    let mut by_key = Map::new();
    by_key.insert(query.primary_key.to_string(), json!({ "_in": keys }));
    let by_key = Value::Object(by_key);
    match query.filter {
        Some(filter) => json!({ "_and": [by_key, filter] }),
        None => by_key,
    }
}

#[async_trait]
impl RecordReader for DirectusClient {
    fn store_name(&self) -> &'static str {
        "directus"
    }

    async fn read_page(&self, collection: &str, query: &PageQuery) -> StoreResult<Vec<Value>> {
        let mut params = vec![
            ("fields", fields_param(&query.fields)),
            ("limit", query.limit.to_string()),
            ("offset", query.offset.to_string()),
        ];
        if let Some(filter) = &query.filter {
            params.push(("filter", filter.to_string()));
        }
        debug!(
            collection = %collection,
            limit = query.limit,
            offset = query.offset,
            "Reading page"
        );
        self.read_items(collection, params).await
    }

    async fn read_by_keys(&self, collection: &str, query: &KeyQuery<'_>) -> StoreResult<Vec<Value>> {
        if query.keys.is_empty() {
            return Ok(Vec::new());
        }
        let params = vec![
            ("fields", fields_param(query.fields)),
            ("filter", key_filter(query).to_string()),
            ("limit", "-1".to_string()),
        ];
        self.read_items(collection, params).await
    }
}

#[async_trait]
impl SettingsStore for DirectusClient {
    async fn read_settings(&self) -> StoreResult<Option<Value>> {
        let collection = self.config.settings_collection.as_str();
        let result = self
            .send(collection, self.request(Method::GET, &self.settings_path()))
            .await;

        let response = match result {
            Ok(response) => response,
            // Directus answers 403 for records and collections that do not exist.
            Err(StoreError::Request { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16()
                    || status == StatusCode::FORBIDDEN.as_u16() =>
            {
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let envelope: Envelope<Option<Value>> =
            response.json().await.map_err(|e| StoreError::Serialization {
                message: format!("Failed to decode settings: {}", e),
            })?;
        Ok(envelope.data)
    }

    async fn clear_reindex_flag(&self) -> StoreResult<()> {
        let collection = self.config.settings_collection.as_str();
        let builder = self
            .request(Method::PATCH, &self.settings_path())
            .json(&json!({ "force_reindex": false }));
        self.send(collection, builder).await?;
        debug!("Cleared force_reindex flag");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RecordKey;

    #[test]
    fn test_key_filter_with_action_filter() {
        let keys = [RecordKey::from(1), RecordKey::from(2)];
        let fields = vec!["*".to_string()];
        let action = json!({"status": {"_eq": "published"}});
        let query = KeyQuery {
            primary_key: "id",
            keys: &keys,
            fields: &fields,
            filter: Some(&action),
        };

        assert_eq!(
            key_filter(&query),
            json!({"_and": [{"id": {"_in": [1, 2]}}, {"status": {"_eq": "published"}}]})
        );
    }

    #[test]
    fn test_key_filter_without_action_filter() {
        let keys = [RecordKey::from("a-1")];
        let query = KeyQuery {
            primary_key: "slug",
            keys: &keys,
            fields: &[],
            filter: None,
        };

        assert_eq!(key_filter(&query), json!({"slug": {"_in": ["a-1"]}}));
    }

    #[test]
    fn test_fields_param() {
        assert_eq!(fields_param(&[]), "*");
        assert_eq!(
            fields_param(&["id".to_string(), "author.name".to_string()]),
            "id,author.name"
        );
    }

    #[test]
    fn test_config_defaults() {
        let config: DirectusConfig =
            serde_json::from_str(r#"{"url": "http://cms:8055"}"#).unwrap();
        assert_eq!(config.settings_collection, "meilisearch_settings");
        assert_eq!(config.settings_id, "1");
    }
}
