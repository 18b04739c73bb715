//! Errors raised by a browsing surface.

use std::time::Duration;

use thiserror::Error;

/// A failure reported by the browser layer.
#[derive(Debug, Error)]
pub enum SurfaceError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("load aborted: {0}")]
    Aborted(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("script failed: {0}")]
    Script(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    #[error("browser unavailable: {0}")]
    Unavailable(String),
}

impl SurfaceError {
    /// Whether a retry of the same operation might succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SurfaceError::Timeout(_) | SurfaceError::Aborted(_) | SurfaceError::Transport(_)
        )
    }
}

#[cfg(feature = "browser")]
impl From<chromiumoxide::error::CdpError> for SurfaceError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        use chromiumoxide::error::CdpError;

        match err {
            CdpError::Timeout => SurfaceError::Timeout(Duration::ZERO),
            CdpError::NoResponse => SurfaceError::Aborted(err.to_string()),
            CdpError::Ws(_) | CdpError::Io(_) | CdpError::ChannelSendError(_) => {
                SurfaceError::Unavailable(err.to_string())
            }
            CdpError::JavascriptException(_) => SurfaceError::Script(err.to_string()),
            other => SurfaceError::Transport(other.to_string()),
        }
    }
}
