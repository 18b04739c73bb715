//! Crawl services: navigation, gate handling, link collection and downloads.
//!
//! Every stage works against a [`CrawlContext`], which owns the browsing
//! surface and the run counters.

pub mod collector;
pub mod context;
pub mod download;
pub mod gate;
pub mod navigator;
pub mod orchestrator;
pub mod pacing;

pub use collector::{CollectionReport, CollectionStop, ExtractorError, LinkCollector, LinkExtractor};
pub use context::CrawlContext;
pub use download::{Downloader, ItemOutcome, RunStats};
pub use gate::{GateConfig, GateHandler, GateState};
pub use navigator::{Attempt, NavigationError, Navigator, RetryPolicy};
pub use orchestrator::{Orchestrator, RunError};
pub use pacing::{Delay, PacingConfig};
