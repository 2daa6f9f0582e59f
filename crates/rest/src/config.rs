//! Server configuration for the webhook and admin endpoints.
//!
//! This module provides configuration types for the server, supporting
//! both programmatic configuration and environment variable overrides.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `MEILISYNC_PORT` | 8080 | Server port |
//! | `MEILISYNC_HOST` | 127.0.0.1 | Host to bind |
//! | `MEILISYNC_LOG_LEVEL` | info | Log level |
//! | `MEILISYNC_MAX_BODY_SIZE` | 1048576 | Max request body (bytes) |
//! | `MEILISYNC_REQUEST_TIMEOUT` | 30 | Request timeout (seconds) |
//! | `MEILISYNC_ENABLE_CORS` | false | Enable CORS |
//! | `MEILISYNC_CORS_ORIGINS` | * | Allowed origins |
//! | `MEILISYNC_CORS_METHODS` | GET,POST,OPTIONS | Allowed methods |
//! | `MEILISYNC_CORS_HEADERS` | Content-Type,Authorization | Allowed headers |
//! | `MEILISYNC_ADMIN_TOKEN` | - | Bearer token required by the protected routes |
//! | `MEILISYNC_DIRECTUS_URL` | http://localhost:8055 | Directus base URL |
//! | `MEILISYNC_DIRECTUS_TOKEN` | - | Directus static token |
//! | `MEILISYNC_SETTINGS_COLLECTION` | meilisearch_settings | Collection of the settings record |
//! | `MEILISYNC_SETTINGS_ID` | 1 | Key of the settings record |
//! | `MEILISYNC_MEILISEARCH_TIMEOUT` | 30 | Meilisearch request timeout (seconds) |
//! | `MEILISYNC_PAGE_SIZE` | 100 | Records per page during a full reindex |
//! | `MEILISYNC_PROVISION_TIMEOUT` | 10 | Index creation timeout (seconds) |
//!
//! # Example
//!
//! ```rust
//! use meilisync_rest::ServerConfig;
//!
//! let config = ServerConfig {
//!     port: 3000,
//!     admin_token: Some("secret".to_string()),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::time::Duration;

use clap::Args;

#[cfg(feature = "directus")]
use meilisync_engine::backends::directus::DirectusConfig;
use meilisync_engine::SyncEngineConfig;

/// Server configuration.
///
/// Flattened into the CLI of the `meilisync` binary, so every field can be
/// given as a flag or through its `MEILISYNC_*` variable.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Port to listen on.
    #[arg(short, long, env = "MEILISYNC_PORT", default_value = "8080")]
    pub port: u16,

    /// Host address to bind to.
    #[arg(long, env = "MEILISYNC_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long, env = "MEILISYNC_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum request body size in bytes.
    #[arg(long, env = "MEILISYNC_MAX_BODY_SIZE", default_value = "1048576")]
    pub max_body_size: usize,

    /// Request timeout in seconds.
    #[arg(long, env = "MEILISYNC_REQUEST_TIMEOUT", default_value = "30")]
    pub request_timeout: u64,

    /// Enable CORS.
    #[arg(long, env = "MEILISYNC_ENABLE_CORS", default_value = "false")]
    pub enable_cors: bool,

    /// Allowed CORS origins (comma-separated, or * for all).
    #[arg(long, env = "MEILISYNC_CORS_ORIGINS", default_value = "*")]
    pub cors_origins: String,

    /// Allowed CORS methods (comma-separated, or * for all).
    #[arg(long, env = "MEILISYNC_CORS_METHODS", default_value = "GET,POST,OPTIONS")]
    pub cors_methods: String,

    /// Allowed CORS headers (comma-separated, or * for all).
    #[arg(
        long,
        env = "MEILISYNC_CORS_HEADERS",
        default_value = "Content-Type,Authorization"
    )]
    pub cors_headers: String,

    /// Bearer token for the reindex and webhook routes. Unset rejects every call.
    #[arg(long, env = "MEILISYNC_ADMIN_TOKEN", hide_env_values = true)]
    pub admin_token: Option<String>,

    /// Base URL of the Directus instance.
    #[arg(long, env = "MEILISYNC_DIRECTUS_URL", default_value = "http://localhost:8055")]
    pub directus_url: String,

    /// Static token used to read records and update the settings record.
    #[arg(long, env = "MEILISYNC_DIRECTUS_TOKEN", hide_env_values = true)]
    pub directus_token: Option<String>,

    /// Collection holding the settings record.
    #[arg(
        long,
        env = "MEILISYNC_SETTINGS_COLLECTION",
        default_value = "meilisearch_settings"
    )]
    pub settings_collection: String,

    /// Key of the settings record.
    #[arg(long, env = "MEILISYNC_SETTINGS_ID", default_value = "1")]
    pub settings_id: String,

    /// Meilisearch request timeout in seconds.
    #[arg(long, env = "MEILISYNC_MEILISEARCH_TIMEOUT", default_value = "30")]
    pub meilisearch_timeout: u64,

    /// Records read per page during a full reindex.
    #[arg(long, env = "MEILISYNC_PAGE_SIZE", default_value = "100")]
    pub page_size: usize,

    /// Seconds to wait for an index to be created.
    #[arg(long, env = "MEILISYNC_PROVISION_TIMEOUT", default_value = "10")]
    pub provision_timeout: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            log_level: "info".to_string(),
            max_body_size: 1024 * 1024, // 1MB
            request_timeout: 30,
            enable_cors: false,
            cors_origins: "*".to_string(),
            cors_methods: "GET,POST,OPTIONS".to_string(),
            cors_headers: "Content-Type,Authorization".to_string(),
            admin_token: None,
            directus_url: "http://localhost:8055".to_string(),
            directus_token: None,
            settings_collection: "meilisearch_settings".to_string(),
            settings_id: "1".to_string(),
            meilisearch_timeout: 30,
            page_size: 100,
            provision_timeout: 10,
        }
    }
}

impl ServerConfig {
    /// Returns the socket address to bind to.
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Tunables handed to the sync engine.
    pub fn engine_config(&self) -> SyncEngineConfig {
        SyncEngineConfig {
            page_size: self.page_size,
            provision_timeout: Duration::from_secs(self.provision_timeout),
        }
    }

    /// Connection settings of the Directus backend.
    #[cfg(feature = "directus")]
    pub fn directus_config(&self) -> DirectusConfig {
        DirectusConfig {
            url: self.directus_url.clone(),
            token: self.directus_token.clone().unwrap_or_default(),
            settings_collection: self.settings_collection.clone(),
            settings_id: self.settings_id.clone(),
            request_timeout_ms: self.request_timeout.saturating_mul(1000),
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.port == 0 {
            errors.push("Port cannot be 0".to_string());
        }

        if self.max_body_size == 0 {
            errors.push("Max body size cannot be 0".to_string());
        }

        if self.request_timeout == 0 {
            errors.push("Request timeout cannot be 0".to_string());
        }

        if self.page_size == 0 {
            errors.push("Page size cannot be 0".to_string());
        }

        if self.provision_timeout == 0 {
            errors.push("Provision timeout cannot be 0".to_string());
        }

        if self.settings_collection.trim().is_empty() {
            errors.push("Settings collection cannot be empty".to_string());
        }

        if self
            .admin_token
            .as_deref()
            .is_some_and(|token| token.trim().is_empty())
        {
            errors.push("Admin token cannot be blank".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// This uses ephemeral port 0, a fixed admin token and short timeouts.
    pub fn for_testing() -> Self {
        Self {
            port: 0,
            log_level: "debug".to_string(),
            request_timeout: 5,
            admin_token: Some("test-admin-token".to_string()),
            ..Default::default()
        }
    }
}
