//! State threaded through every crawl stage.

use crate::browser::{BrowsingSurface, PageLoad};
use crate::models::FetchOutcome;
use crate::session::{SessionError, SessionStore};
use crate::site::SiteLayout;

use super::download::RunStats;
use super::gate::GateHandler;
use super::navigator::{NavigationError, Navigator};
use super::pacing::PacingConfig;

/// The browsing surface plus everything needed to drive it.
pub struct CrawlContext<S> {
    pub surface: S,
    pub navigator: Navigator,
    pub gate: GateHandler,
    pub sessions: SessionStore,
    pub site: SiteLayout,
    pub pacing: PacingConfig,
    pub stats: RunStats,
}

impl<S: BrowsingSurface> CrawlContext<S> {
    pub fn new(
        surface: S,
        navigator: Navigator,
        gate: GateHandler,
        sessions: SessionStore,
        site: SiteLayout,
        pacing: PacingConfig,
    ) -> Self {
        Self {
            surface,
            navigator,
            gate,
            sessions,
            site,
            pacing,
            stats: RunStats::default(),
        }
    }

    pub async fn navigate(
        &mut self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<PageLoad, NavigationError> {
        self.navigator
            .navigate(&mut self.surface, url, referer)
            .await
    }

    pub async fn fetch_document(
        &mut self,
        url: &str,
        referer: Option<&str>,
    ) -> Result<FetchOutcome, NavigationError> {
        self.navigator
            .fetch_document(&mut self.surface, url, referer)
            .await
    }

    /// Click through the gate if it is showing. See [`GateHandler::satisfy_if_gated`].
    pub async fn satisfy_gate(&mut self) -> bool {
        self.gate
            .satisfy_if_gated(&mut self.surface, &self.sessions)
            .await
    }

    pub async fn save_session(&mut self) -> Result<usize, SessionError> {
        self.sessions.capture(&mut self.surface).await
    }

    pub fn into_surface(self) -> S {
        self.surface
    }
}
