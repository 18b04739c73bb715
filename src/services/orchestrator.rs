//! Sequences datasets and documents for a full run.

use std::io;
use std::ops::RangeInclusive;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::collector::LinkCollector;
use super::context::CrawlContext;
use super::download::{inspect, DownloadState, Downloader, ItemOutcome, RunStats};
use super::pacing::{Delay, PacingConfig};
use crate::browser::BrowsingSurface;
use crate::storage::OutputLayout;

/// Failures that end the run.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("cannot create dataset directory {path}: {source}")]
    DatasetDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub struct Orchestrator {
    layout: OutputLayout,
    datasets: RangeInclusive<u32>,
    collector: LinkCollector,
    downloader: Downloader,
    min_document_bytes: u64,
}

impl Orchestrator {
    pub fn new(
        layout: OutputLayout,
        datasets: RangeInclusive<u32>,
        collector: LinkCollector,
        min_document_bytes: u64,
    ) -> Self {
        Self {
            layout,
            datasets,
            collector,
            downloader: Downloader,
            min_document_bytes,
        }
    }

    /// Prime the session, then collect and download every dataset in order.
    pub async fn run<S: BrowsingSurface>(
        &self,
        ctx: &mut CrawlContext<S>,
    ) -> Result<RunStats, RunError> {
        self.prime_session(ctx).await;

        let mut failure = None;
        for dataset in self.datasets.clone() {
            if let Err(e) = self.run_dataset(ctx, dataset).await {
                failure = Some(e);
                break;
            }
        }

        match ctx.save_session().await {
            Ok(count) => debug!("Final session save: {} cookies", count),
            Err(e) => warn!("Final session save failed: {}", e),
        }
        if let Some(e) = failure {
            return Err(e);
        }

        let stats = ctx.stats.clone();
        info!(
            "Done. datasets={} total_links={} downloaded={} skipped={} redownloaded_invalid={} access_denied={} failed={} content_mismatch={}",
            stats.datasets,
            stats.total_links,
            stats.downloaded,
            stats.skipped,
            stats.redownloaded_invalid,
            stats.access_denied,
            stats.failed,
            stats.content_mismatch
        );
        Ok(stats)
    }

    /// Visit the site home, clear the gate if shown, and save the session.
    async fn prime_session<S: BrowsingSurface>(&self, ctx: &mut CrawlContext<S>) {
        let home = ctx.site.home_url();
        match ctx.navigate(&home, None).await {
            Ok(load) if ctx.gate.is_gated(&load.final_url) => {
                ctx.satisfy_gate().await;
            }
            Ok(_) => debug!("No consent gate at {}", home),
            Err(e) => warn!("Could not load {} to prime the session: {}", home, e),
        }

        match ctx.save_session().await {
            Ok(_) => info!("Saved session state to {:?}", ctx.sessions.path()),
            Err(e) => warn!("Could not save session state: {}", e),
        }
    }

    async fn run_dataset<S: BrowsingSurface>(
        &self,
        ctx: &mut CrawlContext<S>,
        dataset: u32,
    ) -> Result<(), RunError> {
        let dir = self
            .layout
            .ensure_dataset_dir(dataset)
            .map_err(|source| RunError::DatasetDir {
                path: self.layout.dataset_dir(dataset),
                source,
            })?;

        let report = self.collector.collect(ctx, dataset).await;
        let docs = report.index.into_sorted();
        ctx.stats.datasets += 1;
        ctx.stats.total_links += docs.len();
        info!(
            dataset,
            "Dataset {}: total collected across {} page(s) = {} ({:?})",
            dataset,
            report.pages_visited,
            docs.len(),
            report.stop
        );

        for doc in docs {
            let dest = dir.join(doc.filename());
            let state = match inspect(&dest, self.min_document_bytes) {
                Ok(state) => state,
                Err(e) => {
                    warn!(file = %doc.filename(), "Could not inspect {}: {}", dest.display(), e);
                    DownloadState::Invalid
                }
            };

            match state {
                DownloadState::Valid => {
                    ctx.stats.skipped += 1;
                    debug!(file = %doc.filename(), "Already downloaded");
                    continue;
                }
                DownloadState::Invalid => {
                    info!(file = %doc.filename(), "Existing file is invalid; re-downloading")
                }
                DownloadState::Absent => {}
            }

            let outcome = self.downloader.download(ctx, &doc, &dest).await;
            ctx.stats.record(&outcome, state == DownloadState::Invalid);

            delay_for(&outcome, &ctx.pacing).pause().await;
        }

        Ok(())
    }
}

/// Pause to take after a document, by how it went.
fn delay_for(outcome: &ItemOutcome, pacing: &PacingConfig) -> Delay {
    match outcome {
        ItemOutcome::Downloaded { .. } => pacing.download,
        ItemOutcome::AccessDenied => pacing.access_denied,
        _ => pacing.failure,
    }
}
