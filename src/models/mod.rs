//! Domain models.

mod document;
mod fetch;

pub use document::{DocumentRef, LinkIndex};
pub use fetch::FetchOutcome;
