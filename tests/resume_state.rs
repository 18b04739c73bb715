//! On-disk resume checks
//!
//! Verifies that files left by earlier runs are classified the way the
//! download loop relies on: complete PDFs are kept, anything else is redone.

use std::fs;

use disclosure_fetch::services::download::{inspect, DownloadState};
use disclosure_fetch::storage::{write_atomic, OutputLayout};
use tempfile::TempDir;

const FLOOR: u64 = 1024;

fn pdf_of_len(len: usize) -> Vec<u8> {
    let mut body = b"%PDF-1.6\n".to_vec();
    body.resize(len, b'0');
    body
}

#[test]
fn missing_file_is_absent() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("EFTA00000001.pdf");
    assert_eq!(inspect(&path, FLOOR).unwrap(), DownloadState::Absent);
}

#[test]
fn complete_pdf_is_valid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("EFTA00000001.pdf");
    fs::write(&path, pdf_of_len(4096)).unwrap();
    assert_eq!(inspect(&path, FLOOR).unwrap(), DownloadState::Valid);
}

#[test]
fn truncated_pdf_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("EFTA00000001.pdf");
    fs::write(&path, pdf_of_len(512)).unwrap();
    assert_eq!(inspect(&path, FLOOR).unwrap(), DownloadState::Invalid);

    // the floor is configurable
    assert_eq!(inspect(&path, 256).unwrap(), DownloadState::Valid);
}

#[test]
fn html_shell_is_invalid_even_when_large() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("EFTA00000001.pdf");
    let mut body = b"<!DOCTYPE html><html>".to_vec();
    body.resize(8192, b' ');
    fs::write(&path, body).unwrap();
    assert_eq!(inspect(&path, FLOOR).unwrap(), DownloadState::Invalid);
}

#[test]
fn empty_file_is_invalid() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("EFTA00000001.pdf");
    fs::write(&path, b"").unwrap();
    assert_eq!(inspect(&path, 0).unwrap(), DownloadState::Invalid);
}

#[test]
fn atomic_write_turns_invalid_into_valid() {
    let dir = TempDir::new().unwrap();
    let layout = OutputLayout::new(dir.path());
    let ds = layout.ensure_dataset_dir(4).unwrap();
    let path = ds.join("EFTA00000042.pdf");

    fs::write(&path, b"partial").unwrap();
    assert_eq!(inspect(&path, FLOOR).unwrap(), DownloadState::Invalid);

    write_atomic(&path, &pdf_of_len(2048)).unwrap();
    assert_eq!(inspect(&path, FLOOR).unwrap(), DownloadState::Valid);
    assert_eq!(fs::read_dir(&ds).unwrap().count(), 1);
}
