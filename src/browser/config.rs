//! Browser engine configuration types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Desktop Chrome user agent presented to the site.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Browser engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserEngineConfig {
    /// Run in headless mode (default: false).
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Which installed browser to prefer when searching for an executable.
    #[serde(default)]
    pub channel: BrowserChannel,

    /// Explicit browser executable. Wins over the channel search.
    #[serde(default)]
    pub chrome_executable: Option<PathBuf>,

    /// Proxy server URL (e.g., "socks5://127.0.0.1:1080").
    #[serde(default)]
    pub proxy: Option<String>,

    /// DevTools request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Additional Chrome arguments.
    #[serde(default)]
    pub chrome_args: Vec<String>,

    /// Remote Chrome DevTools URL (e.g., "ws://localhost:9222").
    /// If set, connects to existing browser instead of launching one.
    #[serde(default)]
    pub remote_url: Option<String>,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Value for `--lang`.
    #[serde(default = "default_locale")]
    pub locale: String,

    /// IANA timezone reported to pages. Empty leaves the system zone.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Disable image loading.
    #[serde(default = "default_block_images")]
    pub block_images: bool,
}

impl Default for BrowserEngineConfig {
    fn default() -> Self {
        Self {
            headless: default_headless(),
            channel: BrowserChannel::default(),
            chrome_executable: None,
            proxy: None,
            timeout: default_timeout(),
            chrome_args: Vec::new(),
            remote_url: None,
            user_agent: default_user_agent(),
            locale: default_locale(),
            timezone: default_timezone(),
            block_images: default_block_images(),
        }
    }
}

pub fn default_headless() -> bool {
    false
}

pub fn default_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}

fn default_locale() -> String {
    "en-AU".to_string()
}

fn default_timezone() -> String {
    "Australia/Sydney".to_string()
}

fn default_block_images() -> bool {
    true
}

/// Installed browser flavours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BrowserChannel {
    /// Open-source Chromium first (default).
    #[default]
    Chromium,

    /// Branded Google Chrome first.
    Chrome,
}

impl BrowserChannel {
    /// Executable names to look up on PATH, most preferred first.
    pub fn executable_names(self) -> &'static [&'static str] {
        match self {
            BrowserChannel::Chromium => &[
                "chromium",
                "chromium-browser",
                "google-chrome",
                "google-chrome-stable",
            ],
            BrowserChannel::Chrome => &[
                "google-chrome",
                "google-chrome-stable",
                "chromium",
                "chromium-browser",
            ],
        }
    }

    /// Well-known install paths, most preferred first.
    pub fn install_paths(self) -> &'static [&'static str] {
        match self {
            BrowserChannel::Chromium => &[
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/snap/bin/chromium",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
                "/usr/bin/google-chrome",
                "/opt/google/chrome/google-chrome",
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
            ],
            BrowserChannel::Chrome => &[
                "/usr/bin/google-chrome",
                "/usr/bin/google-chrome-stable",
                "/opt/google/chrome/google-chrome",
                "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
                "/usr/bin/chromium",
                "/usr/bin/chromium-browser",
                "/Applications/Chromium.app/Contents/MacOS/Chromium",
            ],
        }
    }
}
