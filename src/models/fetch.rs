//! Raw result of fetching a document.

/// What came back when a document URL was fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    /// HTTP status, or None when the load produced no response at all.
    pub status: Option<u16>,
    /// URL after redirects.
    pub final_url: String,
    pub content_type: String,
    pub body: Vec<u8>,
}

impl FetchOutcome {
    /// An outcome for a load that produced no response object.
    pub fn no_response(final_url: impl Into<String>) -> Self {
        Self {
            status: None,
            final_url: final_url.into(),
            ..Default::default()
        }
    }

    /// True if the server labelled the body as HTML.
    pub fn is_html(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("text/html")
    }

    /// Status for log lines (`-` when absent).
    pub fn status_label(&self) -> String {
        self.status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}
