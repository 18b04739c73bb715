//! Fetching, validating and storing individual documents.

mod types;
pub mod validity;

use std::path::Path;

use tracing::{info, warn};

pub use types::{ItemOutcome, RunStats};
pub use validity::{inspect, is_valid_document, looks_like_gate_bounce, DownloadState};

use super::context::CrawlContext;
use super::navigator::NavigationError;
use crate::browser::BrowsingSurface;
use crate::models::{DocumentRef, FetchOutcome};
use crate::site::is_gate_url;
use crate::storage::write_atomic;

/// Fetches one document, recovering from a gate bounce at most once.
#[derive(Debug, Clone, Copy, Default)]
pub struct Downloader;

impl Downloader {
    /// Fetch the raw bytes of `doc`.
    ///
    /// If the response looks like the gate (or an HTML shell standing in for
    /// it), the bounce page is loaded, the gate handler runs, and the fetch is
    /// repeated exactly once if the gate was satisfied.
    pub async fn fetch<S: BrowsingSurface>(
        &self,
        ctx: &mut CrawlContext<S>,
        doc: &DocumentRef,
    ) -> Result<FetchOutcome, NavigationError> {
        let outcome = ctx
            .fetch_document(doc.source_url(), Some(doc.referer_url()))
            .await?;
        if !looks_like_gate_bounce(&outcome) {
            return Ok(outcome);
        }

        info!(
            file = %doc.filename(),
            "Got HTML/gate response (status={}, ctype={}); re-verifying then retrying once",
            outcome.status_label(),
            outcome.content_type
        );

        let landing = if is_gate_url(&outcome.final_url) {
            outcome.final_url.clone()
        } else {
            ctx.site.home_url()
        };
        if let Err(e) = ctx.navigate(&landing, Some(doc.referer_url())).await {
            warn!(file = %doc.filename(), "Could not load gate page for recovery: {}", e);
            return Ok(outcome);
        }
        if !ctx.satisfy_gate().await {
            return Ok(outcome);
        }

        ctx.fetch_document(doc.source_url(), Some(doc.referer_url()))
            .await
    }

    /// Fetch `doc`, classify the result and write it to `dest` if valid.
    pub async fn download<S: BrowsingSurface>(
        &self,
        ctx: &mut CrawlContext<S>,
        doc: &DocumentRef,
        dest: &Path,
    ) -> ItemOutcome {
        let file = doc.filename();
        let outcome = match self.fetch(ctx, doc).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(file = %file, "Fetch failed: {}", e);
                return ItemOutcome::NetworkError {
                    error: e.to_string(),
                };
            }
        };

        let result = classify(&outcome);
        match &result {
            ItemOutcome::AccessDenied => warn!(
                file = %file,
                "401 at {}. Suggest running --headed and/or --use-chrome-channel",
                doc.source_url()
            ),
            ItemOutcome::HttpError { .. } => warn!(
                file = %file,
                "Error status={} final_url={}; skipping",
                outcome.status_label(),
                outcome.final_url
            ),
            ItemOutcome::ContentMismatch { content_type } => warn!(
                file = %file,
                "Status 200 but not a PDF (ctype={}, final_url={}); skipping",
                content_type,
                outcome.final_url
            ),
            _ => {}
        }
        if !result.is_success() {
            return result;
        }

        match write_atomic(dest, &outcome.body) {
            Ok(()) => {
                info!(
                    file = %file,
                    dataset = doc.dataset(),
                    "Downloaded {} bytes -> {}",
                    outcome.body.len(),
                    dest.display()
                );
                result
            }
            Err(e) => {
                warn!(file = %file, "Could not write {}: {}", dest.display(), e);
                ItemOutcome::WriteFailed {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Map a final fetch outcome to an item result. Writing is left to the caller.
pub fn classify(outcome: &FetchOutcome) -> ItemOutcome {
    match outcome.status {
        Some(401) => ItemOutcome::AccessDenied,
        Some(200) if is_valid_document(outcome) => ItemOutcome::Downloaded {
            bytes: outcome.body.len(),
        },
        Some(200) => ItemOutcome::ContentMismatch {
            content_type: outcome.content_type.clone(),
        },
        status => ItemOutcome::HttpError { status },
    }
}
