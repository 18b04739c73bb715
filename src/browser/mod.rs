//! Browsing surface abstraction.
//!
//! Everything above this module talks to a [`BrowsingSurface`]; the real
//! implementation drives Chromium over CDP and tests use a scripted fake.

mod config;
mod error;
mod scripts;
mod types;

#[cfg(feature = "browser")]
mod chromium;
#[cfg(test)]
pub(crate) mod fake;

pub use config::{BrowserChannel, BrowserEngineConfig, DEFAULT_USER_AGENT};
pub use error::SurfaceError;
pub use types::{AffirmativeControl, BrowserCookie, PageLoad};

#[cfg(feature = "browser")]
pub use chromium::ChromiumSurface;

use std::time::Duration;

use async_trait::async_trait;

use crate::models::FetchOutcome;

/// A single browser tab the crawl drives sequentially.
#[async_trait]
pub trait BrowsingSurface: Send {
    /// Load `url` as the top-level document.
    ///
    /// Returns once the document is interactive, not when the network is idle.
    async fn goto(
        &mut self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<PageLoad, SurfaceError>;

    /// URL of the current top-level document.
    async fn current_url(&mut self) -> Result<String, SurfaceError>;

    /// Serialized HTML of the current document.
    async fn html(&mut self) -> Result<String, SurfaceError>;

    /// Click the first visible control of the given kind carrying `label`.
    ///
    /// Returns false if no such control appeared within `timeout`.
    async fn actuate(
        &mut self,
        control: AffirmativeControl,
        label: &str,
        timeout: Duration,
    ) -> Result<bool, SurfaceError>;

    /// Wait for a navigation triggered by the page to finish.
    async fn wait_for_settle(&mut self, timeout: Duration) -> Result<(), SurfaceError>;

    /// Fetch raw document bytes using the surface's cookies.
    async fn fetch_document(
        &mut self,
        url: &str,
        referer: Option<&str>,
        timeout: Duration,
    ) -> Result<FetchOutcome, SurfaceError>;

    async fn export_cookies(&mut self) -> Result<Vec<BrowserCookie>, SurfaceError>;

    /// Install cookies, returning how many were accepted.
    async fn import_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<usize, SurfaceError>;

    async fn close(&mut self) -> Result<(), SurfaceError>;
}
