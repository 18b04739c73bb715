//! Randomized pauses between requests.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Compute `base + uniform(0, jitter)` seconds.
///
/// Negative or non-finite inputs count as zero.
pub fn jittered(base_secs: f64, jitter_secs: f64) -> Duration {
    let base = secs(base_secs);
    let jitter = secs(jitter_secs);
    base + jitter.mul_f64(rand::random::<f64>())
}

pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// A base delay with random jitter on top.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Delay {
    pub base_secs: f64,
    pub jitter_secs: f64,
}

impl Delay {
    pub const fn new(base_secs: f64, jitter_secs: f64) -> Self {
        Self {
            base_secs,
            jitter_secs,
        }
    }

    pub const ZERO: Delay = Delay::new(0.0, 0.0);

    pub fn sample(&self) -> Duration {
        jittered(self.base_secs, self.jitter_secs)
    }

    pub async fn pause(&self) {
        let d = self.sample();
        if !d.is_zero() {
            tokio::time::sleep(d).await;
        }
    }
}

/// Pause policy for each kind of outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    /// After a successful download.
    pub download: Delay,
    /// Between listing pages.
    pub listing_page: Delay,
    /// After a 401.
    pub access_denied: Delay,
    /// After any other failure.
    pub failure: Delay,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            download: Delay::new(0.6, 0.4),
            listing_page: Delay::new(0.12, 0.12),
            access_denied: Delay::new(2.0, 2.0),
            failure: Delay::new(1.0, 1.5),
        }
    }
}

impl PacingConfig {
    /// No pauses at all.
    pub fn none() -> Self {
        Self {
            download: Delay::ZERO,
            listing_page: Delay::ZERO,
            access_denied: Delay::ZERO,
            failure: Delay::ZERO,
        }
    }

    pub fn is_valid(&self) -> bool {
        [
            self.download,
            self.listing_page,
            self.access_denied,
            self.failure,
        ]
        .iter()
        .all(|d| d.base_secs >= 0.0 && d.jitter_secs >= 0.0)
    }
}
