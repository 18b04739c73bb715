//! Storage helpers for downloaded content on disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Name of the append-only run log at the output root.
pub const LOG_FILE_NAME: &str = "download.log";

/// Name of the persisted browser session at the output root.
pub const SESSION_FILE_NAME: &str = "storage_state.json";

/// Directory layout under the output root.
///
/// `{root}/DataSet_{nn}/EFTA{id}.pdf`, plus a shared log file and session file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the output root if needed.
    pub fn prepare(root: impl Into<PathBuf>) -> io::Result<Self> {
        let layout = Self::new(root);
        fs::create_dir_all(&layout.root)?;
        Ok(layout)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE_NAME)
    }

    pub fn session_path(&self) -> PathBuf {
        self.root.join(SESSION_FILE_NAME)
    }

    /// Directory for one dataset, zero-padded to two digits.
    pub fn dataset_dir(&self, dataset: u32) -> PathBuf {
        self.root.join(format!("DataSet_{:02}", dataset))
    }

    /// Create a dataset directory if needed and return its path.
    pub fn ensure_dataset_dir(&self, dataset: u32) -> io::Result<PathBuf> {
        let dir = self.dataset_dir(dataset);
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}

/// Write `data` to `dest` so that `dest` is either untouched or complete.
///
/// Bytes are staged in a `.part` temp file beside the destination and
/// renamed over it once fully written and synced.
pub fn write_atomic(dest: &Path, data: &[u8]) -> io::Result<()> {
    let dir = match dest.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut staged = tempfile::Builder::new()
        .prefix(".")
        .suffix(".part")
        .tempfile_in(dir)?;
    staged.write_all(data)?;
    staged.as_file().sync_all()?;
    staged.persist(dest).map_err(|e| e.error)?;

    Ok(())
}
