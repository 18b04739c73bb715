//! Persisted browsing session (cookies) shared across runs.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::browser::{BrowserCookie, BrowsingSurface, SurfaceError};
use crate::storage::write_atomic;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session file I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("session file is not valid JSON: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("could not read session from browser: {0}")]
    Export(#[source] SurfaceError),

    #[error("could not install session into browser: {0}")]
    Import(#[source] SurfaceError),
}

/// Cookies captured from the browser, plus when they were saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub cookies: Vec<BrowserCookie>,
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl SessionState {
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }
}

/// JSON file holding the last saved [`SessionState`]. Last writer wins.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored session, or `None` if nothing has been saved yet.
    pub fn load(&self) -> Result<Option<SessionState>, SessionError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let state: SessionState = serde_json::from_str(&content)?;
        Ok(Some(state))
    }

    pub fn save(&self, state: &SessionState) -> Result<(), SessionError> {
        let json = serde_json::to_vec_pretty(state)?;
        write_atomic(&self.path, &json)?;
        debug!("Saved {} cookies to {:?}", state.cookies.len(), self.path);
        Ok(())
    }

    /// Export the surface's cookies and write them out.
    pub async fn capture<S: BrowsingSurface + ?Sized>(
        &self,
        surface: &mut S,
    ) -> Result<usize, SessionError> {
        let cookies = surface.export_cookies().await.map_err(SessionError::Export)?;
        let state = SessionState {
            cookies,
            saved_at: Some(Utc::now()),
        };
        self.save(&state)?;
        Ok(state.cookies.len())
    }

    /// Load the stored session into the surface. Returns the number of
    /// cookies installed (0 when there is no stored session).
    pub async fn restore<S: BrowsingSurface + ?Sized>(
        &self,
        surface: &mut S,
    ) -> Result<usize, SessionError> {
        let Some(state) = self.load()? else {
            return Ok(0);
        };
        if state.is_empty() {
            debug!("Saved session at {:?} has no cookies", self.path);
            return Ok(0);
        }
        let installed = surface
            .import_cookies(&state.cookies)
            .await
            .map_err(SessionError::Import)?;
        info!(
            "Restored {} of {} saved cookies from {:?}",
            installed,
            state.cookies.len(),
            self.path
        );
        Ok(installed)
    }
}
