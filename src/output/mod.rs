//! Output module for crawl reports
//!
//! Records themselves are persisted by the sinks; this module only covers
//! the summary printed once the crawl ends.

mod report;

pub use report::{CrawlOutcome, CrawlReport};
