//! Integration tests for the crawler
//!
//! These tests use wiremock to serve listing pages and test the full crawl
//! cycle end-to-end, from the first request to the rows left in the CSV file
//! and the SQLite database.

use catalog_crawler::config::{Config, CrawlerConfig, FetchConfig, OutputConfig};
use catalog_crawler::crawler::{
    crawl, FetchError, HeaderPool, HttpFetcher, PageFetcher, PaginationDriver, RetryPolicy,
};
use catalog_crawler::output::CrawlOutcome;
use catalog_crawler::sink::{SinkManager, SinkPhase, SinkStatus};
use catalog_crawler::state::{CrawlPhase, CrawlState};
use catalog_crawler::url::DomainScope;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// One product entry as served by the catalog
struct Book<'a> {
    title: &'a str,
    price: &'a str,
    availability: &'a str,
    rating: &'a str,
}

fn book(title: &str) -> Book<'_> {
    Book {
        title,
        price: "£10.00",
        availability: "In stock",
        rating: "Three",
    }
}

/// Renders a listing page with the catalog markup
fn listing_page(books: &[Book<'_>], next: Option<&str>) -> String {
    let entries: String = books
        .iter()
        .map(|b| {
            format!(
                r#"<li class="col-xs-6 col-sm-4 col-md-3 col-lg-3">
                <article class="product_pod">
                    <div class="image_container"><a href="x.html"><img src="x.jpg" alt="{title}"></a></div>
                    <p class="star-rating {rating}"><i class="icon-star"></i></p>
                    <h3><a href="x.html" title="{title}">{title}</a></h3>
                    <div class="product_price">
                        <p class="price_color">{price}</p>
                        <p class="instock availability">
                            <i class="icon-ok"></i>
                            {availability}
                        </p>
                        <form><button type="submit">Add to basket</button></form>
                    </div>
                </article>
            </li>"#,
                title = b.title,
                rating = b.rating,
                price = b.price,
                availability = b.availability,
            )
        })
        .collect();

    let pager = next
        .map(|href| {
            format!(
                r#"<ul class="pager"><li class="current">Page</li><li class="next"><a href="{}">next</a></li></ul>"#,
                href
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html><html><head><title>All products</title></head><body>
        <ol class="row">{}</ol>
        <div>{}</div>
        </body></html>"#,
        entries, pager
    )
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

/// Creates a test configuration writing both sinks into `dir`
fn create_test_config(start_url: &str, dir: &TempDir) -> Config {
    Config {
        crawler: CrawlerConfig {
            start_url: start_url.to_string(),
            allowed_domains: vec![],
            max_pages: None,
        },
        fetch: FetchConfig::default(),
        output: OutputConfig {
            csv_path: Some(csv_path(dir).to_string_lossy().into_owned()),
            database_path: Some(db_path(dir).to_string_lossy().into_owned()),
        },
    }
}

fn csv_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("books.csv")
}

fn db_path(dir: &TempDir) -> std::path::PathBuf {
    dir.path().join("books.db")
}

fn csv_rows(path: &Path) -> Vec<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_path(path)
        .expect("Failed to open CSV");
    reader
        .records()
        .map(|r| {
            r.expect("Failed to read CSV row")
                .iter()
                .map(str::to_string)
                .collect()
        })
        .collect()
}

fn db_titles(path: &Path) -> Vec<String> {
    let conn = rusqlite::Connection::open(path).expect("Failed to open database");
    let mut stmt = conn
        .prepare("SELECT title FROM books ORDER BY id")
        .expect("Failed to prepare query");
    let titles = stmt
        .query_map([], |row| row.get(0))
        .expect("Failed to query")
        .collect::<Result<Vec<String>, _>>()
        .expect("Failed to read rows");
    titles
}

async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|r| r.len())
        .unwrap_or(0)
}

/// Fetcher with a short timeout and a given retry budget, scoped to `start`
fn fast_fetcher(start: &Url, timeout: Duration, retry_times: u32) -> HttpFetcher {
    let policy = RetryPolicy::new(timeout, retry_times, [500, 502, 503, 504, 522, 524, 408, 429]);
    let scope = DomainScope::for_start_url(start, &[]);
    HttpFetcher::new(HeaderPool::default(), policy, scope).expect("Failed to build fetcher")
}

#[tokio::test]
async fn test_full_crawl_two_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let titles: Vec<String> = (1..=20).map(|i| format!("Book {}", i)).collect();
    let first: Vec<Book> = titles
        .iter()
        .map(|title| Book {
            title,
            price: "£51.77",
            availability: "In stock",
            rating: "Three",
        })
        .collect();
    let second = vec![book("Book 21"), book("Book 22")];

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(&first, Some("catalogue/page-2.html"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(html(listing_page(&second, None)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.expect("Crawl failed to start");

    assert!(report.is_success());
    assert!(matches!(report.outcome, CrawlOutcome::Completed));
    assert_eq!(report.final_phase, CrawlPhase::Done);
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.records_dispatched, 22);
    assert_eq!(request_count(&mock_server).await, 2);

    let rows = csv_rows(&csv_path(&dir));
    assert_eq!(rows.len(), 23);
    assert_eq!(rows[0], vec!["Title", "Price", "Availability", "Rating"]);
    assert_eq!(rows[1], vec!["Book 1", "£51.77", "In stock", "Three"]);
    assert_eq!(rows[22][0], "Book 22");

    let titles = db_titles(&db_path(&dir));
    assert_eq!(titles.len(), 22);
    assert_eq!(titles[0], "Book 1");
    assert_eq!(titles[21], "Book 22");

    assert!(report
        .sinks
        .iter()
        .all(|s| s.status == SinkStatus::Closed && s.written == 22));
}

#[tokio::test]
async fn test_off_domain_next_link_stops_crawl() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(
            &[book("Only Book")],
            Some("https://www.tender24.de/hauptkategorie-damen"),
        )))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.final_phase, CrawlPhase::Done);
    match &report.outcome {
        CrawlOutcome::OutOfScope { url } => {
            assert_eq!(url.host_str(), Some("www.tender24.de"));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(request_count(&mock_server).await, 1);
    assert_eq!(csv_rows(&csv_path(&dir)).len(), 2);
    assert_eq!(db_titles(&db_path(&dir)), vec!["Only Book"]);
}

#[tokio::test]
async fn test_retryable_status_exhausts_retries() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    assert!(!report.is_success());
    assert_eq!(report.final_phase, CrawlPhase::Failed);
    match &report.outcome {
        CrawlOutcome::Failed { error, .. } => {
            assert!(matches!(
                error,
                FetchError::RetryableStatus {
                    status: 503,
                    attempts: 6,
                    ..
                }
            ));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    // One initial request plus five retries
    assert_eq!(request_count(&mock_server).await, 6);

    // Sinks were still opened and closed; the CSV holds only its header
    assert_eq!(csv_rows(&csv_path(&dir)).len(), 1);
    assert!(db_titles(&db_path(&dir)).is_empty());
}

#[tokio::test]
async fn test_non_retryable_status_fails_immediately() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    assert_eq!(report.final_phase, CrawlPhase::Failed);
    match &report.outcome {
        CrawlOutcome::Failed { error, .. } => {
            assert!(matches!(
                error,
                FetchError::NonRetryableStatus { status: 404, .. }
            ));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(request_count(&mock_server).await, 1);
}

#[tokio::test]
async fn test_transient_failures_recover() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(&[book("Recovered")], None)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.records_dispatched, 1);
    assert_eq!(request_count(&mock_server).await, 3);
    assert_eq!(db_titles(&db_path(&dir)), vec!["Recovered"]);
}

#[tokio::test]
async fn test_timeout_is_retried_then_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let url = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let fetcher = fast_fetcher(&url, Duration::from_millis(200), 1);
    let result = fetcher.fetch(&url).await;

    match result {
        Err(FetchError::Timeout { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected timeout, got {:?}", other.map(|p| p.status)),
    }
}

#[tokio::test]
async fn test_mid_crawl_failure_keeps_earlier_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(
            &[book("Kept 1"), book("Kept 2")],
            Some("page-2.html"),
        )))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page-2.html"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    assert_eq!(report.final_phase, CrawlPhase::Failed);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.records_dispatched, 2);
    assert!(report.sinks.iter().all(|s| s.status == SinkStatus::Closed));

    assert_eq!(csv_rows(&csv_path(&dir)).len(), 3);
    assert_eq!(db_titles(&db_path(&dir)), vec!["Kept 1", "Kept 2"]);
}

#[tokio::test]
async fn test_missing_fields_persist_sentinel() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let body = r#"<html><body><ol class="row">
        <li><article class="product_pod">
            <h3><a href="x.html" title="No Price Or Rating">No Price...</a></h3>
            <div class="product_price">
                <p class="instock availability"><i class="icon-ok"></i>   </p>
            </div>
        </article></li>
    </ol></body></html>"#;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(body.to_string()))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();
    assert_eq!(report.records_dispatched, 1);

    let rows = csv_rows(&csv_path(&dir));
    assert_eq!(rows[1], vec!["No Price Or Rating", "N/A", "N/A", "N/A"]);

    let conn = rusqlite::Connection::open(db_path(&dir)).unwrap();
    let (price, availability, rating): (String, String, String) = conn
        .query_row(
            "SELECT price, availability, rating FROM books WHERE id = 1",
            [],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .unwrap();
    assert_eq!(price, "N/A");
    assert_eq!(availability, "N/A");
    assert_eq!(rating, "N/A");
}

#[tokio::test]
async fn test_user_agent_drawn_from_pool() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Only requests carrying the pooled agent get a page; anything else is a 404
    Mock::given(method("GET"))
        .and(path("/"))
        .and(header("user-agent", "CatalogTestAgent/1.0"))
        .respond_with(html(listing_page(&[book("Agent Book")], None)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    config.fetch.user_agents = vec!["CatalogTestAgent/1.0".to_string()];
    let report = crawl(config).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.records_dispatched, 1);
}

#[tokio::test]
async fn test_page_limit_stops_self_linking_pages() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(&[book("Loop")], Some("/"))))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    config.crawler.max_pages = Some(3);
    let report = crawl(config).await.unwrap();

    assert!(matches!(report.outcome, CrawlOutcome::PageLimit { pages: 3 }));
    assert_eq!(request_count(&mock_server).await, 3);
    assert_eq!(db_titles(&db_path(&dir)).len(), 3);
}

#[tokio::test]
async fn test_unwritable_csv_does_not_stop_database() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(&[book("A"), book("B")], None)))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    config.output.csv_path = Some(
        dir.path()
            .join("missing")
            .join("books.csv")
            .to_string_lossy()
            .into_owned(),
    );
    let report = crawl(config).await.unwrap();

    assert!(report.is_success());
    let csv = report.sinks.iter().find(|s| s.name == "csv").unwrap();
    assert!(!csv.opened);
    assert_eq!(csv.written, 0);
    let phases: Vec<SinkPhase> = csv.errors().into_iter().map(|(phase, _)| phase).collect();
    assert_eq!(phases, vec![SinkPhase::Open]);
    let sqlite = report.sinks.iter().find(|s| s.name == "sqlite").unwrap();
    assert_eq!(sqlite.written, 2);
    assert!(sqlite.errors().is_empty());
    assert_eq!(db_titles(&db_path(&dir)), vec!["A", "B"]);
}

#[tokio::test]
async fn test_driver_with_explicit_scope() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(listing_page(&[book("Scoped")], None)))
        .mount(&mock_server)
        .await;

    let start = Url::parse(&format!("{}/", mock_server.uri())).unwrap();
    let scope = DomainScope::new(vec!["books.toscrape.com".to_string()]);
    let driver = PaginationDriver::new(fast_fetcher(&start, Duration::from_secs(5), 0)).unwrap();
    let mut sinks = SinkManager::new(vec![]);

    let report = driver
        .run(CrawlState::new(start, scope, None), &mut sinks)
        .await
        .unwrap();

    // The mock server's host is not in the allowed list, so nothing is fetched
    assert!(matches!(report.outcome, CrawlOutcome::OutOfScope { .. }));
    assert_eq!(request_count(&mock_server).await, 0);
}

#[tokio::test]
async fn test_off_scope_redirect_is_not_followed() {
    let mock_server = MockServer::start().await;
    let offsite_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    // Same listener, different host name: outside the 127.0.0.1 scope
    let offsite = format!(
        "{}/offsite",
        offsite_server.uri().replace("127.0.0.1", "localhost")
    );
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", offsite.as_str()))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/offsite"))
        .respond_with(html(listing_page(&[book("Offsite Book")], None)))
        .mount(&offsite_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.final_phase, CrawlPhase::Done);
    match &report.outcome {
        CrawlOutcome::OutOfScope { url } => {
            assert_eq!(url.host_str(), Some("localhost"));
            assert_eq!(url.path(), "/offsite");
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(report.pages_fetched, 0);
    assert_eq!(request_count(&mock_server).await, 1);
    assert_eq!(request_count(&offsite_server).await, 0);
    assert!(db_titles(&db_path(&dir)).is_empty());
    assert_eq!(csv_rows(&csv_path(&dir)).len(), 1);
}

#[tokio::test]
async fn test_in_scope_redirect_is_followed() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(301).insert_header("location", "/catalogue/page-1.html"),
        )
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-1.html"))
        .respond_with(html(listing_page(&[book("Moved")], Some("page-2.html"))))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/catalogue/page-2.html"))
        .respond_with(html(listing_page(&[book("Second")], None)))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    // The next link resolves against the redirect target, not the seed
    assert!(matches!(report.outcome, CrawlOutcome::Completed));
    assert_eq!(report.pages_fetched, 2);
    assert_eq!(request_count(&mock_server).await, 3);
    assert_eq!(db_titles(&db_path(&dir)), vec!["Moved", "Second"]);
}

#[tokio::test]
async fn test_redirect_loop_fails() {
    let mock_server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/b"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(ResponseTemplate::new(302).insert_header("location", "/a"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&format!("{}/a", mock_server.uri()), &dir);
    let report = crawl(config).await.unwrap();

    assert_eq!(report.final_phase, CrawlPhase::Failed);
    match &report.outcome {
        CrawlOutcome::Failed { error, .. } => {
            assert!(matches!(error, FetchError::Redirect { .. }));
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
    assert_eq!(request_count(&mock_server).await, 2);
}
