//! Walks a dataset's paginated listing and gathers document links.

use regex::Regex;
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use super::context::CrawlContext;
use crate::browser::BrowsingSurface;
use crate::models::{DocumentRef, LinkIndex};
use crate::site::SiteLayout;

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("invalid document pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid selector: {0}")]
    Selector(String),
}

/// Pulls document references out of listing HTML.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    pattern: Regex,
    marker: String,
    anchors: Selector,
}

impl LinkExtractor {
    pub fn new(site: &SiteLayout) -> Result<Self, ExtractorError> {
        let anchors = Selector::parse("a[href]")
            .map_err(|e| ExtractorError::Selector(format!("{:?}", e)))?;
        Ok(Self {
            pattern: site.document_pattern()?,
            marker: site.document_path_marker(),
            anchors,
        })
    }

    /// All document links on the page that belong to `dataset`, in page order.
    ///
    /// Relative hrefs are resolved against `page_url`, which also becomes
    /// each ref's referer.
    pub fn extract(&self, html: &str, page_url: &str, dataset: u32) -> Vec<DocumentRef> {
        let base = Url::parse(page_url).ok();
        let document = Html::parse_document(html);

        document
            .select(&self.anchors)
            .filter_map(|el| el.value().attr("href"))
            .filter_map(|href| {
                let absolute = match &base {
                    Some(base) => base.join(href.trim()).ok()?.to_string(),
                    None => href.trim().to_string(),
                };
                if !absolute.to_lowercase().contains(&self.marker) {
                    return None;
                }

                let caps = self.pattern.captures(&absolute)?;
                let found_dataset: u32 = caps.get(1)?.as_str().parse().ok()?;
                if found_dataset != dataset {
                    return None;
                }
                let id = caps.get(2)?.as_str().to_string();
                Some(DocumentRef::new(id, dataset, absolute, page_url))
            })
            .collect()
    }
}

/// Why a collection pass stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStop {
    /// Lookahead pages in a row produced nothing new; `page` was the last one visited.
    Exhausted { page: u32 },
    /// Hit the page ceiling.
    PageCeiling,
    /// A listing page could not be loaded or read.
    NavigationFailed { page: u32 },
}

#[derive(Debug, Clone)]
pub struct CollectionReport {
    pub index: LinkIndex,
    pub pages_visited: u32,
    pub stop: CollectionStop,
}

#[derive(Debug, Clone)]
pub struct LinkCollector {
    extractor: LinkExtractor,
    max_pages: u32,
    stale_page_lookahead: u32,
}

impl LinkCollector {
    pub fn new(extractor: LinkExtractor, max_pages: u32, stale_page_lookahead: u32) -> Self {
        Self {
            extractor,
            max_pages,
            stale_page_lookahead: stale_page_lookahead.max(1),
        }
    }

    /// Collect every document link for `dataset`.
    pub async fn collect<S: BrowsingSurface>(
        &self,
        ctx: &mut CrawlContext<S>,
        dataset: u32,
    ) -> CollectionReport {
        let mut index = LinkIndex::new();
        let mut stale_run = 0;
        let mut pages_visited = 0;

        for page in 0..self.max_pages {
            let url = ctx.site.listing_url(dataset, page);

            let load = match ctx.navigate(&url, None).await {
                Ok(load) => load,
                Err(e) => {
                    warn!(dataset, page, "Listing page failed, ending dataset pass: {}", e);
                    return CollectionReport {
                        index,
                        pages_visited,
                        stop: CollectionStop::NavigationFailed { page },
                    };
                }
            };

            if ctx.gate.is_gated(&load.final_url) {
                info!(
                    dataset,
                    page, "Listing redirected to the consent gate; verifying then retrying"
                );
                ctx.satisfy_gate().await;
                if let Err(e) = ctx.navigate(&url, None).await {
                    warn!(dataset, page, "Listing page failed after gate, ending dataset pass: {}", e);
                    return CollectionReport {
                        index,
                        pages_visited,
                        stop: CollectionStop::NavigationFailed { page },
                    };
                }
            }
            pages_visited += 1;

            let Some(html) = read_listing(&mut ctx.surface, dataset, page).await else {
                return CollectionReport {
                    index,
                    pages_visited,
                    stop: CollectionStop::NavigationFailed { page },
                };
            };
            let links = self.extractor.extract(&html, &url, dataset);
            let found = links.len();
            let new_count = links
                .into_iter()
                .map(|d| index.insert(d))
                .filter(|new| *new)
                .count();

            info!(
                dataset,
                page,
                "Index page={} links={} new={} total={}",
                page,
                found,
                new_count,
                index.len()
            );

            if page > 0 && new_count == 0 {
                stale_run += 1;
                if stale_run >= self.stale_page_lookahead {
                    return CollectionReport {
                        index,
                        pages_visited,
                        stop: CollectionStop::Exhausted { page },
                    };
                }
            } else {
                stale_run = 0;
            }

            ctx.pacing.listing_page.pause().await;
        }

        CollectionReport {
            index,
            pages_visited,
            stop: CollectionStop::PageCeiling,
        }
    }
}

/// Read the loaded listing's HTML, trying once more if the first read fails.
async fn read_listing<S: BrowsingSurface>(
    surface: &mut S,
    dataset: u32,
    page: u32,
) -> Option<String> {
    match surface.html().await {
        Ok(html) => return Some(html),
        Err(e) => debug!(dataset, page, "Could not read listing HTML, retrying: {}", e),
    }
    match surface.html().await {
        Ok(html) => Some(html),
        Err(e) => {
            warn!(dataset, page, "Could not read listing HTML, ending dataset pass: {}", e);
            None
        }
    }
}
