//! Pagination driver
//!
//! Walks a listing site one page at a time:
//!
//! ```text
//! Fetching -> Parsing -> Dispatching -> Advancing -> Fetching ...
//!     |                                     |
//!     +-> Failed (fetch error)              +-> Done (no next page)
//!     +-> Done (out of scope / page limit / off-scope redirect)
//! ```
//!
//! Every record of page N reaches the sinks before page N+1 is requested.

use crate::crawler::{FetchError, ListingParser, PageFetcher};
use crate::output::{CrawlOutcome, CrawlReport};
use crate::sink::SinkManager;
use crate::state::{CrawlPhase, CrawlState};
use crate::CatalogError;
use chrono::Utc;
use tracing::Instrument;

/// Drives a crawl from the seed URL to a terminal phase
pub struct PaginationDriver<F: PageFetcher> {
    fetcher: F,
    parser: ListingParser,
}

impl<F: PageFetcher> PaginationDriver<F> {
    pub fn new(fetcher: F) -> Result<Self, CatalogError> {
        Ok(Self {
            fetcher,
            parser: ListingParser::new()?,
        })
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Runs the crawl to completion
    ///
    /// Opens the sinks before the first request and closes them on every exit
    /// path, including an internal error. Records already dispatched stay
    /// persisted whatever the outcome.
    pub async fn run(
        &self,
        mut state: CrawlState,
        sinks: &mut SinkManager,
    ) -> Result<CrawlReport, CatalogError> {
        let started_at = Utc::now();
        let start_url = state.current_url().clone();

        let usable = sinks.open_all();
        tracing::info!(
            "Starting crawl at {} with {} usable sink(s)",
            start_url,
            usable
        );

        let span = tracing::info_span!("crawl", start = %start_url);
        let result = self.drive(&mut state, sinks).instrument(span).await;
        sinks.close_all();
        let outcome = result?;

        tracing::info!(
            "Crawl finished ({}): {} pages, {} records, {} skipped entries",
            outcome.label(),
            state.pages_fetched(),
            state.records_dispatched(),
            state.entries_skipped()
        );

        Ok(CrawlReport {
            start_url,
            outcome,
            final_phase: state.phase(),
            pages_fetched: state.pages_fetched(),
            records_dispatched: state.records_dispatched(),
            entries_skipped: state.entries_skipped(),
            sinks: sinks.summaries(),
            started_at,
            finished_at: Utc::now(),
        })
    }

    async fn drive(
        &self,
        state: &mut CrawlState,
        sinks: &mut SinkManager,
    ) -> Result<CrawlOutcome, CatalogError> {
        loop {
            let url = state.current_url().clone();

            if !state.current_in_scope() {
                tracing::warn!("Not following {}: outside the allowed domains", url);
                state.transition(CrawlPhase::Done)?;
                return Ok(CrawlOutcome::OutOfScope { url });
            }

            if state.page_limit_reached() {
                tracing::info!("Page limit reached after {} pages", state.pages_fetched());
                state.transition(CrawlPhase::Done)?;
                return Ok(CrawlOutcome::PageLimit {
                    pages: state.pages_fetched(),
                });
            }

            let page = match self.fetcher.fetch(&url).await {
                Ok(page) => page,
                Err(FetchError::OffScopeRedirect { location, .. }) => {
                    state.transition(CrawlPhase::Done)?;
                    return Ok(CrawlOutcome::OutOfScope { url: location });
                }
                Err(error) => {
                    tracing::error!("Crawl failed at {}: {}", url, error);
                    state.transition(CrawlPhase::Failed)?;
                    return Ok(CrawlOutcome::Failed { url, error });
                }
            };
            state.record_page_fetched();

            state.transition(CrawlPhase::Parsing)?;
            let listing = self.parser.parse(&page.body, &page.url);
            state.record_skipped(listing.skipped);

            state.transition(CrawlPhase::Dispatching)?;
            for record in &listing.records {
                sinks.dispatch(record);
            }
            state.record_dispatched(listing.records.len());

            state.transition(CrawlPhase::Advancing)?;
            match listing.next_page {
                Some(next) => {
                    tracing::debug!("Next page: {}", next);
                    state.advance_to(next)?;
                }
                None => {
                    tracing::info!("No next page after {}", page.url);
                    state.transition(CrawlPhase::Done)?;
                    return Ok(CrawlOutcome::Completed);
                }
            }
        }
    }
}
