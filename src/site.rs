//! URL layout of the disclosure site.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Path token that marks the consent interstitial.
pub const GATE_TOKEN: &str = "age-verify";

/// Where listings and documents live on the site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteLayout {
    /// Scheme and host, e.g. `https://www.justice.gov`.
    pub root: String,
    /// Top-level section that holds both listings and files.
    pub section: String,
    /// Path segment under the section that holds the dataset listings.
    pub disclosure_path: String,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            root: "https://www.justice.gov".to_string(),
            section: "epstein".to_string(),
            disclosure_path: "doj-disclosures".to_string(),
        }
    }
}

impl SiteLayout {
    fn root(&self) -> &str {
        self.root.trim_end_matches('/')
    }

    fn section(&self) -> &str {
        self.section.trim_matches('/')
    }

    /// Landing page of the section; visited first to establish the session.
    pub fn home_url(&self) -> String {
        format!("{}/{}", self.root(), self.section())
    }

    /// First listing page of a dataset.
    pub fn listing_base(&self, dataset: u32) -> String {
        format!(
            "{}/{}/{}/data-set-{}-files",
            self.root(),
            self.section(),
            self.disclosure_path.trim_matches('/'),
            dataset
        )
    }

    /// Listing page `page` of a dataset. Page 0 has no query string.
    pub fn listing_url(&self, dataset: u32, page: u32) -> String {
        let base = self.listing_base(dataset);
        if page == 0 {
            base
        } else {
            format!("{}?page={}", base, page)
        }
    }

    /// Canonical URL of a document.
    pub fn document_url(&self, dataset: u32, id: &str) -> String {
        format!(
            "{}/{}/files/DataSet%20{}/EFTA{}.pdf",
            self.root(),
            self.section(),
            dataset,
            id
        )
    }

    /// Lowercased path fragment every document link contains.
    pub fn document_path_marker(&self) -> String {
        format!("/{}/files/dataset%20", self.section().to_lowercase())
    }

    /// Pattern matching an absolute document URL.
    ///
    /// Capture 1 is the dataset number, capture 2 the 8-digit id.
    pub fn document_pattern(&self) -> Result<Regex, regex::Error> {
        Regex::new(&format!(
            r"(?i)/{}/files/DataSet%20(\d+)/EFTA(\d{{8}})\.pdf$",
            regex::escape(self.section())
        ))
    }
}

/// True when the URL points at the consent interstitial.
pub fn is_gate_url(url: &str) -> bool {
    url.to_ascii_lowercase().contains(GATE_TOKEN)
}
