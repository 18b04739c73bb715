//! disclosure-fetch - resumable downloader for gated, paginated disclosure datasets.
//!
//! Walks each dataset's paginated listing through a single browser session,
//! acknowledges the consent interstitial whenever it appears, and saves every
//! listed document exactly once with atomic, integrity-checked writes.

pub mod browser;
pub mod cli;
pub mod config;
pub mod models;
pub mod services;
pub mod session;
pub mod site;
pub mod storage;

pub use config::Settings;
pub use models::{DocumentRef, FetchOutcome, LinkIndex};
pub use services::{CrawlContext, Orchestrator, RunStats};
