use crate::state::CrawlPhase;
use crate::url::DomainScope;
use crate::CatalogError;
use url::Url;

/// Mutable cursor of a single pagination crawl
///
/// Owned and mutated only by the pagination driver.
#[derive(Debug, Clone)]
pub struct CrawlState {
    phase: CrawlPhase,
    current_url: Url,
    scope: DomainScope,
    max_pages: Option<u32>,
    pages_fetched: u32,
    records_dispatched: u64,
    entries_skipped: u64,
}

impl CrawlState {
    /// Creates a state in the Fetching phase, seeded with the start URL
    pub fn new(start_url: Url, scope: DomainScope, max_pages: Option<u32>) -> Self {
        Self {
            phase: CrawlPhase::Fetching,
            current_url: start_url,
            scope,
            max_pages,
            pages_fetched: 0,
            records_dispatched: 0,
            entries_skipped: 0,
        }
    }

    /// Moves to the next phase, rejecting illegal transitions
    pub fn transition(&mut self, to: CrawlPhase) -> Result<(), CatalogError> {
        if !self.phase.can_transition_to(to) {
            return Err(CatalogError::InvalidTransition {
                from: self.phase,
                to,
            });
        }

        tracing::trace!("crawl phase {} -> {}", self.phase, to);
        self.phase = to;
        Ok(())
    }

    /// Re-enters Fetching with the next page's URL
    pub fn advance_to(&mut self, next_url: Url) -> Result<(), CatalogError> {
        self.transition(CrawlPhase::Fetching)?;
        self.current_url = next_url;
        Ok(())
    }

    /// Returns true if the current URL is inside the domain scope
    pub fn current_in_scope(&self) -> bool {
        self.scope.allows(&self.current_url)
    }

    /// Returns true if the page limit has been reached
    pub fn page_limit_reached(&self) -> bool {
        self.max_pages.is_some_and(|max| self.pages_fetched >= max)
    }

    pub fn record_page_fetched(&mut self) {
        self.pages_fetched += 1;
    }

    pub fn record_dispatched(&mut self, count: usize) {
        self.records_dispatched += count as u64;
    }

    pub fn record_skipped(&mut self, count: usize) {
        self.entries_skipped += count as u64;
    }

    pub fn phase(&self) -> CrawlPhase {
        self.phase
    }

    pub fn current_url(&self) -> &Url {
        &self.current_url
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    pub fn records_dispatched(&self) -> u64 {
        self.records_dispatched
    }

    pub fn entries_skipped(&self) -> u64 {
        self.entries_skipped
    }
}
