//! meilisync
//!
//! Keeps Meilisearch indexes in sync with Directus collections. `serve`
//! (the default) runs the webhook server; `reindex` runs one full reindex
//! in the foreground and exits.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use meilisync_engine::{CollectionOutcome, ReindexReport, ReindexRun, SyncEngine};
use meilisync_rest::{ServerConfig, build_engine, create_app_with_config, init_logging};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "meilisync", version, about)]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the webhook and admin HTTP server.
    Serve,
    /// Run a full reindex of every configured collection, then exit.
    Reindex,
}

/// Starts the Axum HTTP server.
async fn serve(engine: Arc<SyncEngine>, config: &ServerConfig) -> anyhow::Result<()> {
    let app = create_app_with_config(engine, config.clone());
    let addr = config.socket_addr();
    info!(address = %addr, "Server listening");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

/// Runs a foreground reindex and prints its summary.
async fn reindex(engine: Arc<SyncEngine>) -> anyhow::Result<()> {
    match engine.run_reindex().await {
        ReindexRun::Completed(report) => {
            print_report(&report);
            if report.has_failures() {
                anyhow::bail!(
                    "{} of {} collections did not complete",
                    report.collections.len() - report.completed_count(),
                    report.collections.len()
                );
            }
            Ok(())
        }
        ReindexRun::Inactive => {
            anyhow::bail!("Meilisearch is not configured; check the settings record")
        }
        ReindexRun::AlreadyRunning => anyhow::bail!("Reindexing already in progress."),
    }
}

fn print_report(report: &ReindexReport) {
    for entry in &report.collections {
        let detail = match &entry.outcome {
            CollectionOutcome::Completed {
                documents,
                pages,
                failed_records,
            } => format!(
                "completed: {} documents in {} pages ({} records rejected)",
                documents, pages, failed_records
            ),
            CollectionOutcome::Skipped { reason } => {
                format!("skipped: {}", reason)
            }
            CollectionOutcome::Failed { error, documents } => {
                format!("failed after {} documents: {}", documents, error)
            }
        };
        println!("{:<24} {}", entry.collection, detail);
    }

    println!(
        "{} documents, {}/{} collections completed{}",
        report.total_documents(),
        report.completed_count(),
        report.collections.len(),
        report
            .elapsed_ms()
            .map(|ms| format!(" in {} ms", ms))
            .unwrap_or_default()
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = cli.config;
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        directus = %config.directus_url,
        version = meilisync_engine::VERSION,
        "Starting meilisync"
    );

    let engine = build_engine(&config)?;
    let snapshot = engine.initialize().await;
    info!(
        active = snapshot.is_active(),
        collections = snapshot.settings().collections.len(),
        "Settings loaded"
    );

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(engine, &config).await,
        Command::Reindex => reindex(engine).await,
    }
}
