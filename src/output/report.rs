//! End-of-crawl report
//!
//! Collects what the pagination driver observed and what each sink
//! persisted into one value the CLI can print.

use crate::crawler::FetchError;
use crate::sink::SinkSummary;
use crate::state::CrawlPhase;
use chrono::{DateTime, Utc};
use std::fmt;
use url::Url;

/// Why the crawl stopped
#[derive(Debug)]
pub enum CrawlOutcome {
    /// The last page had no next-page link
    Completed,

    /// The next URL fell outside the allowed domains
    OutOfScope { url: Url },

    /// The configured page limit was reached
    PageLimit { pages: u32 },

    /// A page could not be fetched
    Failed { url: Url, error: FetchError },
}

impl CrawlOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, CrawlOutcome::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            CrawlOutcome::Completed => "completed",
            CrawlOutcome::OutOfScope { .. } => "out-of-scope",
            CrawlOutcome::PageLimit { .. } => "page-limit",
            CrawlOutcome::Failed { .. } => "failed",
        }
    }
}

impl fmt::Display for CrawlOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CrawlOutcome::Completed => write!(f, "completed: no further pages"),
            CrawlOutcome::OutOfScope { url } => {
                write!(f, "stopped: next page {} is outside the allowed domains", url)
            }
            CrawlOutcome::PageLimit { pages } => {
                write!(f, "stopped: page limit of {} reached", pages)
            }
            CrawlOutcome::Failed { url, error } => {
                write!(f, "failed at {}: {}", url, error)
            }
        }
    }
}

/// Summary of one crawl
#[derive(Debug)]
pub struct CrawlReport {
    pub start_url: Url,
    pub outcome: CrawlOutcome,
    pub final_phase: CrawlPhase,
    pub pages_fetched: u32,
    pub records_dispatched: u64,
    pub entries_skipped: u64,
    pub sinks: Vec<SinkSummary>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// True unless a fetch failure ended the crawl
    pub fn is_success(&self) -> bool {
        !self.outcome.is_failure()
    }

    /// Prints the report to stdout
    pub fn print_report(&self) {
        println!("\n=== Crawl Report ===\n");
        println!("Start URL:          {}", self.start_url);
        println!("Outcome:            {}", self.outcome);
        println!("Final phase:        {}", self.final_phase);
        println!("Started:            {}", self.started_at.to_rfc3339());
        println!("Finished:           {}", self.finished_at.to_rfc3339());
        println!(
            "Duration:           {:.2} seconds",
            self.duration().num_milliseconds() as f64 / 1000.0
        );
        println!();
        println!("Pages fetched:      {}", self.pages_fetched);
        println!("Records dispatched: {}", self.records_dispatched);
        println!("Entries skipped:    {}", self.entries_skipped);

        if !self.sinks.is_empty() {
            println!("\nSinks:");
            for sink in &self.sinks {
                println!("  {}", sink);
            }
        }
        println!();
    }
}
