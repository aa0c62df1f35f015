//! Crawler module for paginated catalog crawling
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with User-Agent rotation and retries
//! - Listing page parsing
//! - The pagination state machine that ties them to the sinks

mod driver;
mod fetcher;
mod headers;
mod parser;
mod retry;

pub use driver::PaginationDriver;
pub use fetcher::{build_http_client, FetchError, FetchedPage, HttpFetcher, PageFetcher};
pub use headers::HeaderPool;
pub use parser::{ListingParser, ParseError, ParsedListing};
pub use retry::RetryPolicy;

use crate::config::Config;
use crate::output::CrawlReport;
use crate::sink::SinkManager;
use crate::state::CrawlState;
use crate::url::DomainScope;
use crate::CatalogError;
use url::Url;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Build the HTTP fetcher from the fetch settings
/// 2. Create the configured sinks
/// 3. Walk the listing pages from the start URL
/// 4. Close every sink and return the report
///
/// # Arguments
///
/// * `config` - The crawler configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The crawl reached a terminal phase; check
///   [`CrawlReport::is_success`] for a fetch failure
/// * `Err(CatalogError)` - The crawl could not be set up
pub async fn crawl(config: Config) -> Result<CrawlReport, CatalogError> {
    let start_url = Url::parse(&config.crawler.start_url)?;
    let scope = DomainScope::for_start_url(&start_url, &config.crawler.allowed_domains);
    tracing::info!("Allowed domains: {}", scope.patterns().join(", "));

    let fetcher = HttpFetcher::from_config(&config.fetch, scope.clone())?;
    let driver = PaginationDriver::new(fetcher)?;
    let mut sinks = SinkManager::from_config(&config.output);

    let state = CrawlState::new(start_url, scope, config.crawler.max_pages);
    driver.run(state, &mut sinks).await
}
