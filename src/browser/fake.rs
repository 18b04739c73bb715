//! Scripted in-memory surface for exercising the crawl without a browser.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;

use super::{AffirmativeControl, BrowserCookie, BrowsingSurface, PageLoad, SurfaceError};
use crate::models::FetchOutcome;

pub const FAKE_GATE_URL: &str = "https://www.justice.gov/age-verify?destination=/epstein";

/// Build a minimal listing page linking to `hrefs`.
pub fn listing_html(hrefs: &[&str]) -> String {
    let links: String = hrefs
        .iter()
        .map(|h| format!("<li><a href=\"{}\">{}</a></li>", h, h))
        .collect();
    format!("<html><body><ul>{}</ul></body></html>", links)
}

pub fn pdf_outcome(url: &str, body: &[u8]) -> FetchOutcome {
    FetchOutcome {
        status: Some(200),
        final_url: url.to_string(),
        content_type: "application/pdf".to_string(),
        body: body.to_vec(),
    }
}

pub fn status_outcome(url: &str, status: u16) -> FetchOutcome {
    FetchOutcome {
        status: Some(status),
        final_url: url.to_string(),
        content_type: "text/html".to_string(),
        body: Vec::new(),
    }
}

/// A fake tab whose pages, gate and documents are scripted up front.
#[derive(Debug, Default)]
pub struct FakeSurface {
    /// url -> html
    pub pages: HashMap<String, String>,
    /// url -> document outcome once the gate is open
    pub documents: HashMap<String, FetchOutcome>,
    /// While true every navigation lands on the gate and document fetches bounce.
    pub gate_active: bool,
    /// Whether clicking the affirmative control opens the gate.
    pub gate_clickable: bool,
    /// Which control kind the gate page exposes.
    pub gate_control: Option<AffirmativeControl>,
    /// A control that reports a click but leaves the gate in place.
    pub inert_control: Option<AffirmativeControl>,
    /// Per-url queue of transient failures to return before succeeding.
    pub goto_failures: HashMap<String, VecDeque<SurfaceError>>,
    pub fetch_failures: HashMap<String, VecDeque<SurfaceError>>,
    /// Per-url queue of failures returned when reading that page's HTML.
    pub html_failures: HashMap<String, VecDeque<SurfaceError>>,
    pub cookies: Vec<BrowserCookie>,

    pub current: String,
    pub visits: Vec<String>,
    pub fetches: Vec<String>,
    pub actuations: Vec<AffirmativeControl>,
    pub exports: usize,
    pub closed: bool,
}

impl FakeSurface {
    pub fn new() -> Self {
        Self {
            gate_clickable: true,
            gate_control: Some(AffirmativeControl::ExactText),
            current: "about:blank".to_string(),
            ..Default::default()
        }
    }

    pub fn with_page(mut self, url: impl Into<String>, html: impl Into<String>) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    pub fn with_document(mut self, url: impl Into<String>, outcome: FetchOutcome) -> Self {
        self.documents.insert(url.into(), outcome);
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate_active = true;
        self
    }

    pub fn unclickable_gate(mut self) -> Self {
        self.gate_active = true;
        self.gate_clickable = false;
        self
    }

    pub fn failing_goto(mut self, url: impl Into<String>, errors: Vec<SurfaceError>) -> Self {
        self.goto_failures.insert(url.into(), errors.into());
        self
    }

    pub fn failing_fetch(mut self, url: impl Into<String>, errors: Vec<SurfaceError>) -> Self {
        self.fetch_failures.insert(url.into(), errors.into());
        self
    }

    pub fn failing_html(mut self, url: impl Into<String>, errors: Vec<SurfaceError>) -> Self {
        self.html_failures.insert(url.into(), errors.into());
        self
    }

    pub fn visits_to(&self, url: &str) -> usize {
        self.visits.iter().filter(|v| v.as_str() == url).count()
    }

    pub fn fetches_of(&self, url: &str) -> usize {
        self.fetches.iter().filter(|v| v.as_str() == url).count()
    }
}

#[async_trait]
impl BrowsingSurface for FakeSurface {
    async fn goto(
        &mut self,
        url: &str,
        _referer: Option<&str>,
        _timeout: Duration,
    ) -> Result<PageLoad, SurfaceError> {
        self.visits.push(url.to_string());
        if let Some(err) = self.goto_failures.get_mut(url).and_then(|q| q.pop_front()) {
            return Err(err);
        }

        self.current = if self.gate_active {
            FAKE_GATE_URL.to_string()
        } else {
            url.to_string()
        };
        Ok(PageLoad {
            final_url: self.current.clone(),
        })
    }

    async fn current_url(&mut self) -> Result<String, SurfaceError> {
        Ok(self.current.clone())
    }

    async fn html(&mut self) -> Result<String, SurfaceError> {
        if let Some(err) = self
            .html_failures
            .get_mut(&self.current)
            .and_then(|q| q.pop_front())
        {
            return Err(err);
        }
        if self.current == FAKE_GATE_URL {
            return Ok("<html><body><button>Yes</button><button>No</button></body></html>".into());
        }
        Ok(self
            .pages
            .get(&self.current)
            .cloned()
            .unwrap_or_else(|| listing_html(&[])))
    }

    async fn actuate(
        &mut self,
        control: AffirmativeControl,
        _label: &str,
        _timeout: Duration,
    ) -> Result<bool, SurfaceError> {
        self.actuations.push(control);
        let on_gate = self.current == FAKE_GATE_URL;
        if on_gate && self.gate_clickable && self.gate_control == Some(control) {
            self.gate_active = false;
            self.current = "https://www.justice.gov/epstein".to_string();
            return Ok(true);
        }
        Ok(on_gate && self.inert_control == Some(control))
    }

    async fn wait_for_settle(&mut self, _timeout: Duration) -> Result<(), SurfaceError> {
        Ok(())
    }

    async fn fetch_document(
        &mut self,
        url: &str,
        _referer: Option<&str>,
        _timeout: Duration,
    ) -> Result<FetchOutcome, SurfaceError> {
        self.fetches.push(url.to_string());
        if let Some(err) = self.fetch_failures.get_mut(url).and_then(|q| q.pop_front()) {
            return Err(err);
        }

        if self.gate_active {
            return Ok(FetchOutcome {
                status: Some(200),
                final_url: FAKE_GATE_URL.to_string(),
                content_type: "text/html; charset=utf-8".to_string(),
                body: b"<html><body>Are you 18?</body></html>".to_vec(),
            });
        }

        Ok(self
            .documents
            .get(url)
            .cloned()
            .unwrap_or_else(|| status_outcome(url, 404)))
    }

    async fn export_cookies(&mut self) -> Result<Vec<BrowserCookie>, SurfaceError> {
        self.exports += 1;
        let mut cookies = self.cookies.clone();
        if !self.gate_active {
            cookies.push(BrowserCookie {
                name: "justiceGovAgeVerified".to_string(),
                value: "true".to_string(),
                domain: "www.justice.gov".to_string(),
                path: "/".to_string(),
                secure: true,
                http_only: false,
            });
        }
        Ok(cookies)
    }

    async fn import_cookies(&mut self, cookies: &[BrowserCookie]) -> Result<usize, SurfaceError> {
        if cookies.iter().any(|c| c.name == "justiceGovAgeVerified") {
            self.gate_active = false;
        }
        self.cookies.extend_from_slice(cookies);
        Ok(cookies.len())
    }

    async fn close(&mut self) -> Result<(), SurfaceError> {
        self.closed = true;
        Ok(())
    }
}
