//! Rules for telling a genuine document from an error page or gate bounce.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use crate::models::FetchOutcome;
use crate::site::is_gate_url;

/// Leading bytes of every PDF.
pub const PDF_SIGNATURE: &[u8] = b"%PDF";

/// Files smaller than this are treated as damaged.
pub const DEFAULT_MIN_DOCUMENT_BYTES: u64 = 1024;

pub fn has_pdf_signature(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_SIGNATURE)
}

/// Status 200 and the body starts with the PDF signature.
pub fn is_valid_document(outcome: &FetchOutcome) -> bool {
    outcome.status == Some(200) && has_pdf_signature(&outcome.body)
}

/// The fetch was answered by the gate or an HTML shell instead of the file.
pub fn looks_like_gate_bounce(outcome: &FetchOutcome) -> bool {
    if is_gate_url(&outcome.final_url) {
        return true;
    }
    outcome.status == Some(200) && outcome.is_html() && !has_pdf_signature(&outcome.body)
}

/// What is on disk for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadState {
    Absent,
    /// Exists but is too small or not a PDF.
    Invalid,
    Valid,
}

/// Check a local file against the size floor and the PDF signature.
pub fn inspect(path: &Path, min_bytes: u64) -> io::Result<DownloadState> {
    let mut file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(DownloadState::Absent),
        Err(e) => return Err(e),
    };

    let meta = file.metadata()?;
    if !meta.is_file() || meta.len() < min_bytes {
        return Ok(DownloadState::Invalid);
    }

    let mut head = [0u8; 4];
    match file.read_exact(&mut head) {
        Ok(()) if has_pdf_signature(&head) => Ok(DownloadState::Valid),
        Ok(()) => Ok(DownloadState::Invalid),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(DownloadState::Invalid),
        Err(e) => Err(e),
    }
}
