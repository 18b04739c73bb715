//! Run configuration: defaults, optional TOML file, validation.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::browser::BrowserEngineConfig;
use crate::services::download::validity::DEFAULT_MIN_DOCUMENT_BYTES;
use crate::services::{GateConfig, PacingConfig, RetryPolicy};
use crate::site::SiteLayout;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Output root. Dataset directories, the log and the session live here.
    pub output_dir: PathBuf,
    pub dataset_start: u32,
    pub dataset_end: u32,
    /// Hard ceiling on listing pages per dataset.
    pub max_index_pages: u32,
    /// Consecutive pages without new links tolerated before a pass stops.
    pub stale_page_lookahead: u32,
    /// Files on disk smaller than this are re-downloaded.
    pub min_document_bytes: u64,
    pub pacing: PacingConfig,
    pub navigation: RetryPolicy,
    pub gate: GateConfig,
    pub browser: BrowserEngineConfig,
    pub site: SiteLayout,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            dataset_start: 1,
            dataset_end: 12,
            max_index_pages: 5000,
            stale_page_lookahead: 1,
            min_document_bytes: DEFAULT_MIN_DOCUMENT_BYTES,
            pacing: PacingConfig::default(),
            navigation: RetryPolicy::default(),
            gate: GateConfig::default(),
            browser: BrowserEngineConfig::default(),
            site: SiteLayout::default(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file. Missing keys take their defaults.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let mut settings: Settings =
            toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        // Relative paths in the file are relative to the file itself.
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        settings.output_dir = resolve_path(&settings.output_dir.to_string_lossy(), base_dir);
        if let Some(ref exe) = settings.browser.chrome_executable {
            settings.browser.chrome_executable =
                Some(resolve_path(&exe.to_string_lossy(), base_dir));
        }

        Ok(settings)
    }

    /// Inclusive range of dataset ids to process.
    pub fn datasets(&self) -> RangeInclusive<u32> {
        self.dataset_start..=self.dataset_end
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dataset_start > self.dataset_end {
            return Err(ConfigError::Invalid(format!(
                "dataset_start ({}) is after dataset_end ({})",
                self.dataset_start, self.dataset_end
            )));
        }
        if self.max_index_pages == 0 {
            return Err(ConfigError::Invalid(
                "max_index_pages must be at least 1".to_string(),
            ));
        }
        if self.stale_page_lookahead == 0 {
            return Err(ConfigError::Invalid(
                "stale_page_lookahead must be at least 1".to_string(),
            ));
        }
        if self.navigation.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "navigation.max_attempts must be at least 1".to_string(),
            ));
        }
        let nav = &self.navigation;
        if [nav.timeout_secs, nav.backoff_cap_secs, nav.jitter_secs]
            .iter()
            .any(|v| !v.is_finite() || *v < 0.0)
        {
            return Err(ConfigError::Invalid(
                "navigation timings must be non-negative".to_string(),
            ));
        }
        if !self.pacing.is_valid() {
            return Err(ConfigError::Invalid(
                "pacing delays must be non-negative".to_string(),
            ));
        }
        if self.gate.settle_timeout_secs < 0.0 {
            return Err(ConfigError::Invalid(
                "gate.settle_timeout_secs must be non-negative".to_string(),
            ));
        }
        Ok(())
    }
}

/// Resolve a path that may be relative or start with `~`.
/// - Absolute paths are returned as-is
/// - Paths starting with ~ are expanded
/// - Relative paths are resolved relative to `base_dir`
pub fn resolve_path(path_str: &str, base_dir: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(path_str);
    let path = Path::new(expanded.as_ref());

    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base_dir.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::BrowserChannel;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().unwrap();
        assert_eq!(settings.datasets(), 1..=12);
        assert_eq!(settings.min_document_bytes, 1024);
        assert_eq!(settings.navigation.max_attempts, 6);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let reversed = Settings {
            dataset_start: 5,
            dataset_end: 4,
            ..Settings::default()
        };
        assert!(matches!(reversed.validate(), Err(ConfigError::Invalid(_))));

        let no_pages = Settings {
            max_index_pages: 0,
            ..Settings::default()
        };
        assert!(no_pages.validate().is_err());

        let mut no_attempts = Settings::default();
        no_attempts.navigation.max_attempts = 0;
        assert!(no_attempts.validate().is_err());

        let mut negative = Settings::default();
        negative.pacing.download.base_secs = -1.0;
        assert!(negative.validate().is_err());
    }

    #[tokio::test]
    async fn test_load_partial_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fetch.toml");
        std::fs::write(
            &path,
            r#"
output_dir = "out"
dataset_start = 3
dataset_end = 4

[browser]
headless = true
channel = "chrome"

[pacing.download]
base_secs = 1.5
jitter_secs = 0.0
"#,
        )
        .unwrap();

        let settings = Settings::load_from_path(&path).await.unwrap();
        assert_eq!(settings.output_dir, dir.path().join("out"));
        assert_eq!(settings.datasets(), 3..=4);
        assert!(settings.browser.headless);
        assert_eq!(settings.browser.channel, BrowserChannel::Chrome);
        assert_eq!(settings.pacing.download.base_secs, 1.5);
        assert_eq!(settings.pacing.access_denied, PacingConfig::default().access_denied);
        assert_eq!(settings.max_index_pages, 5000);
    }

    #[tokio::test]
    async fn test_load_reports_parse_errors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "dataset_start = \"three\"").unwrap();

        assert!(matches!(
            Settings::load_from_path(&path).await,
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/etc/fetch");
        assert_eq!(resolve_path("/abs/out", base), PathBuf::from("/abs/out"));
        assert_eq!(resolve_path("rel", base), PathBuf::from("/etc/fetch/rel"));
    }
}
