//! Download outcome types.

/// How a single document download ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Valid document written to disk.
    Downloaded { bytes: usize },
    /// Server answered 401.
    AccessDenied,
    /// No response, or a status other than 200 (401 excepted).
    HttpError { status: Option<u16> },
    /// Status 200 but the body is not a document, even after gate recovery.
    ContentMismatch { content_type: String },
    /// The fetch itself failed after all retries.
    NetworkError { error: String },
    /// The document was fetched but could not be written.
    WriteFailed { error: String },
}

impl ItemOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ItemOutcome::Downloaded { .. })
    }
}

/// Counters for a whole run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub datasets: usize,
    pub total_links: usize,
    pub downloaded: usize,
    /// Already valid on disk.
    pub skipped: usize,
    /// Invalid on disk and successfully replaced.
    pub redownloaded_invalid: usize,
    pub access_denied: usize,
    pub failed: usize,
    pub content_mismatch: usize,
}

impl RunStats {
    /// Count one finished item.
    pub fn record(&mut self, outcome: &ItemOutcome, was_invalid: bool) {
        match outcome {
            ItemOutcome::Downloaded { .. } => {
                self.downloaded += 1;
                if was_invalid {
                    self.redownloaded_invalid += 1;
                }
            }
            ItemOutcome::AccessDenied => self.access_denied += 1,
            ItemOutcome::ContentMismatch { .. } => self.content_mismatch += 1,
            ItemOutcome::HttpError { .. }
            | ItemOutcome::NetworkError { .. }
            | ItemOutcome::WriteFailed { .. } => self.failed += 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_counts_each_bucket() {
        let mut stats = RunStats::default();
        stats.record(&ItemOutcome::Downloaded { bytes: 10 }, false);
        stats.record(&ItemOutcome::Downloaded { bytes: 10 }, true);
        stats.record(&ItemOutcome::AccessDenied, false);
        stats.record(&ItemOutcome::HttpError { status: Some(404) }, false);
        stats.record(&ItemOutcome::NetworkError { error: "x".into() }, true);
        stats.record(
            &ItemOutcome::ContentMismatch {
                content_type: "text/html".into(),
            },
            false,
        );

        assert_eq!(stats.downloaded, 2);
        assert_eq!(stats.redownloaded_invalid, 1);
        assert_eq!(stats.access_denied, 1);
        assert_eq!(stats.failed, 2);
        assert_eq!(stats.content_mismatch, 1);
    }
}
