//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlPhase`: the phases of the pagination state machine and their legal transitions
//! - `CrawlState`: the crawl cursor (current URL, counters, domain scope)

mod crawl_phase;
mod crawl_state;

// Re-export main types
pub use crawl_phase::CrawlPhase;
pub use crawl_state::CrawlState;
