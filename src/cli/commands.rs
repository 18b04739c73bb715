//! CLI arguments and the top-level run.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use console::style;
use tracing::{info, warn};

use crate::config::{resolve_path, Settings};
use crate::services::RunStats;

#[derive(Parser, Debug)]
#[command(name = "disclosure-fetch")]
#[command(about = "Download every document of a gated, paginated disclosure site")]
#[command(version)]
pub struct Cli {
    /// Output directory
    #[arg(long, env = "DISCLOSURE_FETCH_OUT")]
    pub out: PathBuf,

    /// First dataset to process [default: 1]
    #[arg(long, env = "DISCLOSURE_FETCH_DATASET_START")]
    pub dataset_start: Option<u32>,

    /// Last dataset to process, inclusive [default: 12]
    #[arg(long, env = "DISCLOSURE_FETCH_DATASET_END")]
    pub dataset_end: Option<u32>,

    /// Base sleep between downloads, in seconds [default: 0.6]
    #[arg(long, env = "DISCLOSURE_FETCH_SLEEP")]
    pub sleep: Option<f64>,

    /// Random jitter added to the sleep, in seconds [default: 0.4]
    #[arg(long, env = "DISCLOSURE_FETCH_JITTER")]
    pub jitter: Option<f64>,

    /// Run headless (default is headed)
    #[arg(long)]
    pub headless: bool,

    /// Run headed (overrides --headless)
    #[arg(long)]
    pub headed: bool,

    /// Prefer Google Chrome over Chromium
    #[arg(long)]
    pub use_chrome_channel: bool,

    /// Safety cap on pagination pages per dataset [default: 5000]
    #[arg(long, env = "DISCLOSURE_FETCH_MAX_INDEX_PAGES")]
    pub max_index_pages: Option<u32>,

    /// Consecutive listing pages without new links before stopping [default: 1]
    #[arg(long)]
    pub stale_pages: Option<u32>,

    /// Minimum size for an existing file to count as downloaded [default: 1024]
    #[arg(long)]
    pub min_bytes: Option<u64>,

    /// Browser executable to launch
    #[arg(long, env = "DISCLOSURE_FETCH_CHROME_PATH")]
    pub chrome_path: Option<String>,

    /// Connect to a running browser's DevTools endpoint instead of launching one
    #[arg(long, env = "DISCLOSURE_FETCH_REMOTE_BROWSER")]
    pub remote_browser: Option<String>,

    /// Proxy server for the browser
    #[arg(long, env = "DISCLOSURE_FETCH_PROXY")]
    pub proxy: Option<String>,

    /// TOML settings file; flags override its values
    #[arg(long, env = "DISCLOSURE_FETCH_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

impl Cli {
    /// Build settings from the optional file plus flag overrides.
    pub async fn settings(&self) -> anyhow::Result<Settings> {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        let mut settings = match self.config {
            Some(ref path) => {
                let path = resolve_path(path, &cwd);
                Settings::load_from_path(&path).await?
            }
            None => Settings::default(),
        };
        self.apply(&mut settings, &cwd);
        settings.validate()?;
        Ok(settings)
    }

    fn apply(&self, settings: &mut Settings, cwd: &std::path::Path) {
        settings.output_dir = resolve_path(&self.out.to_string_lossy(), cwd);

        if let Some(start) = self.dataset_start {
            settings.dataset_start = start;
        }
        if let Some(end) = self.dataset_end {
            settings.dataset_end = end;
        }
        if let Some(sleep) = self.sleep {
            settings.pacing.download.base_secs = sleep;
        }
        if let Some(jitter) = self.jitter {
            settings.pacing.download.jitter_secs = jitter;
        }
        if let Some(pages) = self.max_index_pages {
            settings.max_index_pages = pages;
        }
        if let Some(stale) = self.stale_pages {
            settings.stale_page_lookahead = stale;
        }
        if let Some(min) = self.min_bytes {
            settings.min_document_bytes = min;
        }

        if self.headed {
            settings.browser.headless = false;
        } else if self.headless {
            settings.browser.headless = true;
        }
        if self.use_chrome_channel {
            settings.browser.channel = crate::browser::BrowserChannel::Chrome;
        }
        if let Some(ref path) = self.chrome_path {
            settings.browser.chrome_executable = Some(resolve_path(path, cwd));
        }
        if let Some(ref url) = self.remote_browser {
            settings.browser.remote_url = Some(url.clone());
        }
        if let Some(ref proxy) = self.proxy {
            settings.browser.proxy = Some(proxy.clone());
        }
    }
}

/// Launch the browser and run every configured dataset.
#[cfg(feature = "browser")]
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    use crate::browser::{BrowsingSurface, ChromiumSurface};
    use crate::services::{
        CrawlContext, GateHandler, LinkCollector, LinkExtractor, Navigator, Orchestrator,
    };
    use crate::session::SessionStore;
    use crate::storage::OutputLayout;

    let layout = OutputLayout::prepare(&settings.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            settings.output_dir.display()
        )
    })?;
    let sessions = SessionStore::new(layout.session_path());

    let mut surface = ChromiumSurface::launch(settings.browser.clone())
        .await
        .context("Failed to start browser")?;

    match sessions.restore(&mut surface).await {
        Ok(0) => info!("No saved session; starting fresh"),
        Ok(_) => {}
        Err(e) => warn!("Ignoring saved session {:?}: {}", sessions.path(), e),
    }

    let extractor = LinkExtractor::new(&settings.site).context("Invalid site layout")?;
    let collector = LinkCollector::new(
        extractor,
        settings.max_index_pages,
        settings.stale_page_lookahead,
    );
    let orchestrator = Orchestrator::new(
        layout,
        settings.datasets(),
        collector,
        settings.min_document_bytes,
    );

    let mut ctx = CrawlContext::new(
        surface,
        Navigator::new(settings.navigation.clone()),
        GateHandler::new(settings.gate.clone()),
        sessions,
        settings.site.clone(),
        settings.pacing.clone(),
    );

    let result = orchestrator.run(&mut ctx).await;

    let mut surface = ctx.into_surface();
    if let Err(e) = surface.close().await {
        warn!("Browser did not close cleanly: {}", e);
    }

    let stats = result?;
    print_summary(&stats);
    Ok(())
}

#[cfg(not(feature = "browser"))]
pub async fn run(_settings: Settings) -> anyhow::Result<()> {
    Err(anyhow::anyhow!(
        "Browser support not compiled. Rebuild with: cargo build --features browser"
    ))
}

fn print_summary(stats: &RunStats) {
    println!("\n{}", style("Run Summary").bold());
    println!("{}", "-".repeat(40));
    println!("  {:<22} {}", "Datasets:", stats.datasets);
    println!("  {:<22} {}", "Links found:", stats.total_links);
    println!(
        "  {:<22} {}",
        "Downloaded:",
        style(stats.downloaded).green()
    );
    println!("  {:<22} {}", "Already present:", stats.skipped);
    println!("  {:<22} {}", "Replaced invalid:", stats.redownloaded_invalid);

    let access_denied = if stats.access_denied > 0 {
        style(stats.access_denied).yellow().to_string()
    } else {
        stats.access_denied.to_string()
    };
    println!("  {:<22} {}", "Access denied:", access_denied);

    let failed = if stats.failed > 0 {
        style(stats.failed).red().to_string()
    } else {
        stats.failed.to_string()
    };
    println!("  {:<22} {}", "Failed:", failed);
    println!("  {:<22} {}", "Not a PDF:", stats.content_mismatch);

    if stats.access_denied > 0 || stats.content_mismatch > 0 {
        println!(
            "\n{} Some documents were refused. Try --headed and/or --use-chrome-channel.",
            style("!").yellow()
        );
    }
}
