//! disclosure-fetch - resumable downloader for gated, paginated disclosure datasets.

use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use disclosure_fetch::cli::{self, Cli};
use disclosure_fetch::storage::OutputLayout;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (before anything else)
    let _ = dotenvy::dotenv();

    let args = Cli::parse();
    let settings = args.settings().await?;

    let layout = OutputLayout::prepare(&settings.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(layout.log_path())
        .with_context(|| format!("Failed to open log file {}", layout.log_path().display()))?;

    // Initialize logging based on verbosity
    let default_filter = if cli::is_verbose() {
        "disclosure_fetch=debug"
    } else {
        "disclosure_fetch=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(log_file)),
        )
        .init();

    info!(
        "Starting scrape+download: out={} datasets={}..{} headless={}",
        layout.root().display(),
        settings.dataset_start,
        settings.dataset_end,
        settings.browser.headless
    );

    cli::run(settings).await
}
