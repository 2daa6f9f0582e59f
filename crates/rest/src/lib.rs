//! # meilisync-rest - HTTP boundary of the sync engine
//!
//! This crate exposes the [`meilisync_engine::SyncEngine`] over HTTP: an admin
//! endpoint that starts a full reindex, webhooks through which the record
//! store reports settings changes and record writes, and a health check.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use meilisync_rest::{ServerConfig, build_engine, create_app_with_config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::default();
//!     let engine = build_engine(&config)?;
//!     engine.initialize().await;
//!
//!     let app = create_app_with_config(engine, config.clone());
//!     let listener = tokio::net::TcpListener::bind(config.socket_addr()).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## API Endpoints
//!
//! | Endpoint | Method | Access | Body |
//! |----------|--------|--------|------|
//! | `/health` | GET | open | - |
//! | `/_liveness` | GET | open | - |
//! | `/meilisearch/reindex` | POST | admin | - |
//! | `/hooks/settings` | POST | admin | updated settings fields |
//! | `/hooks/items/create` | POST | admin | `{"collection", "key"}` |
//! | `/hooks/items/update` | POST | admin | `{"collection", "keys"}` |
//! | `/hooks/items/delete` | POST | admin | `{"collection", "keys"}` |
//!
//! Admin routes require `Authorization: Bearer <MEILISYNC_ADMIN_TOKEN>`.
//!
//! ## Error Handling
//!
//! Errors are returned as `{"error": "<message>"}`. Record event hooks always
//! answer `200 OK`; index failures are reported in the body.

// Enforce documentation
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routing;
pub mod state;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{RestError, RestResult};
pub use state::AppState;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use meilisync_engine::SyncEngine;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Creates the Axum application with default configuration.
///
/// For more control, use [`create_app_with_config`].
pub fn create_app(engine: Arc<SyncEngine>) -> Router {
    create_app_with_config(engine, ServerConfig::default())
}

/// Creates the Axum application with custom configuration.
///
/// # Arguments
///
/// * `engine` - The sync engine, already initialized or not
/// * `config` - Server configuration
pub fn create_app_with_config(engine: Arc<SyncEngine>, config: ServerConfig) -> Router {
    info!(
        admin_token = config.admin_token.is_some(),
        cors = config.enable_cors,
        "Creating HTTP application"
    );

    let state = AppState::new(engine, config.clone());
    let router = routing::create_routes(state);

    let service_builder = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            axum::http::StatusCode::REQUEST_TIMEOUT,
            std::time::Duration::from_secs(config.request_timeout),
        ));

    let router = router.layer(DefaultBodyLimit::max(config.max_body_size));

    let router = if config.enable_cors {
        router.layer(build_cors_layer(&config))
    } else {
        router
    };

    router.layer(service_builder)
}

/// Builds the CORS layer based on configuration.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let mut cors = CorsLayer::new();

    if config.cors_origins == "*" {
        cors = cors.allow_origin(Any);
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_origin(origins);
    }

    if config.cors_methods == "*" {
        cors = cors.allow_methods(Any);
    } else {
        let methods: Vec<_> = config
            .cors_methods
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_methods(methods);
    }

    if config.cors_headers == "*" {
        cors = cors.allow_headers(Any);
    } else {
        let headers: Vec<_> = config
            .cors_headers
            .split(',')
            .filter_map(|s| s.trim().parse().ok())
            .collect();
        cors = cors.allow_headers(headers);
    }

    cors
}

/// Builds an engine that reads from Directus and writes to Meilisearch.
///
/// The engine is not initialized; call [`SyncEngine::initialize`] before
/// serving requests.
#[cfg(all(feature = "meilisearch", feature = "directus"))]
pub fn build_engine(config: &ServerConfig) -> anyhow::Result<Arc<SyncEngine>> {
    use meilisync_engine::backends::directus::DirectusClient;
    use meilisync_engine::backends::meilisearch::MeilisearchClientFactory;

    let directus = Arc::new(DirectusClient::new(config.directus_config())?);
    let factory = MeilisearchClientFactory::new().with_request_timeout(
        std::time::Duration::from_secs(config.meilisearch_timeout),
    );

    info!(
        directus = %config.directus_url,
        settings = %config.settings_collection,
        "Record store configured"
    );

    Ok(Arc::new(SyncEngine::new(
        directus.clone(),
        directus,
        Arc::new(factory),
        config.engine_config(),
    )))
}

/// Initializes the tracing subscriber for logging.
///
/// This should be called once at application startup.
///
/// # Arguments
///
/// * `level` - The log level (error, warn, info, debug, trace)
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "meilisync={level},meilisync_rest={level},meilisync_engine={level},tower_http=debug"
        ))
    });

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();
}
