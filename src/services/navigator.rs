//! Page loads and document fetches with bounded retries.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use super::pacing::{jittered, secs};
use crate::browser::{BrowsingSurface, PageLoad, SurfaceError};
use crate::models::FetchOutcome;

/// Retry limits and backoff shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Budget for a single attempt.
    pub timeout_secs: f64,
    pub backoff_base: f64,
    pub backoff_cap_secs: f64,
    pub jitter_secs: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 6,
            timeout_secs: 60.0,
            backoff_base: 1.3,
            backoff_cap_secs: 10.0,
            jitter_secs: 1.0,
        }
    }
}

impl RetryPolicy {
    /// Retry without sleeping between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff_base: 0.0,
            backoff_cap_secs: 0.0,
            jitter_secs: 0.0,
            ..Self::default()
        }
    }

    pub fn timeout(&self) -> Duration {
        secs(self.timeout_secs)
    }

    /// Delay before the attempt following `attempt` (1-based):
    /// `min(cap, base^attempt) + uniform(0, jitter)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = self.backoff_base.powi(attempt.min(i32::MAX as u32) as i32);
        jittered(exp.min(self.backoff_cap_secs), self.jitter_secs)
    }
}

/// Outcome of one attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    RetryableFailure(SurfaceError),
    FatalFailure(SurfaceError),
}

impl<T> From<Result<T, SurfaceError>> for Attempt<T> {
    fn from(result: Result<T, SurfaceError>) -> Self {
        match result {
            Ok(value) => Attempt::Success(value),
            Err(e) if e.is_transient() => Attempt::RetryableFailure(e),
            Err(e) => Attempt::FatalFailure(e),
        }
    }
}

/// A load or fetch that did not succeed within its attempts.
#[derive(Debug, Error)]
#[error("{url}: giving up after {attempts} attempt(s): {source}")]
pub struct NavigationError {
    pub url: String,
    pub attempts: u32,
    #[source]
    pub source: SurfaceError,
}

enum Step<T> {
    Done(Result<T, NavigationError>),
    Again,
}

/// Attempt counter for one logical operation.
struct RetryLoop<'a> {
    policy: &'a RetryPolicy,
    what: &'static str,
    url: &'a str,
    attempts: u32,
}

impl<'a> RetryLoop<'a> {
    fn new(policy: &'a RetryPolicy, what: &'static str, url: &'a str) -> Self {
        Self {
            policy,
            what,
            url,
            attempts: 0,
        }
    }

    /// Classify an attempt result, sleeping before the next attempt if any.
    async fn settle<T>(&mut self, result: Result<T, SurfaceError>) -> Step<T> {
        self.attempts += 1;
        let max = self.policy.max_attempts.max(1);

        let source = match Attempt::from(result) {
            Attempt::Success(value) => return Step::Done(Ok(value)),
            Attempt::FatalFailure(source) => source,
            Attempt::RetryableFailure(source) if self.attempts < max => {
                let delay = self.policy.backoff(self.attempts);
                warn!(
                    url = self.url,
                    attempt = self.attempts,
                    "{} failed (attempt {}/{}): {}; retrying in {:.1?}",
                    self.what,
                    self.attempts,
                    max,
                    source,
                    delay
                );
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                return Step::Again;
            }
            Attempt::RetryableFailure(source) => source,
        };

        Step::Done(Err(NavigationError {
            url: self.url.to_string(),
            attempts: self.attempts,
            source,
        }))
    }
}

/// Performs single logical page loads and fetches under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    policy: RetryPolicy,
}

impl Navigator {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Load `url`, retrying transient failures.
    pub async fn navigate<S: BrowsingSurface + ?Sized>(
        &self,
        surface: &mut S,
        url: &str,
        referer: Option<&str>,
    ) -> Result<PageLoad, NavigationError> {
        let timeout = self.policy.timeout();
        let mut retry = RetryLoop::new(&self.policy, "goto", url);
        loop {
            let result = surface.goto(url, referer, timeout).await;
            if let Step::Done(done) = retry.settle(result).await {
                return done;
            }
        }
    }

    /// Fetch document bytes, retrying transient failures.
    pub async fn fetch_document<S: BrowsingSurface + ?Sized>(
        &self,
        surface: &mut S,
        url: &str,
        referer: Option<&str>,
    ) -> Result<FetchOutcome, NavigationError> {
        let timeout = self.policy.timeout();
        let mut retry = RetryLoop::new(&self.policy, "document fetch", url);
        loop {
            let result = surface.fetch_document(url, referer, timeout).await;
            if let Step::Done(done) = retry.settle(result).await {
                return done;
            }
        }
    }
}
