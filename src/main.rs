//! vsarchiv - archive and full-text search for German domestic
//! intelligence reports.
//!
//! Ingests scanned report PDFs into a searchable SQLite corpus with
//! per-page text, rendered page images and token statistics, and keeps
//! bulk-download bundles in sync with the source files.

mod analytics;
mod archive;
mod cli;
mod config;
mod images;
mod ingest;
mod models;
mod pdf;
mod reports;
mod repository;
mod search;
mod text;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "vsarchiv=info"
    } else {
        "vsarchiv=warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    cli::run().await
}
