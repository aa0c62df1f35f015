use serde::Deserialize;

/// Start URL of the reference catalog
pub const DEFAULT_START_URL: &str = "https://books.toscrape.com/";

/// Per-request download timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Number of retries after the first attempt
pub const DEFAULT_RETRY_TIMES: u32 = 5;

/// Status codes treated as transient
pub const DEFAULT_RETRY_HTTP_CODES: [u16; 8] = [500, 502, 503, 504, 522, 524, 408, 429];

/// Browser User-Agent strings rotated across requests
pub const DEFAULT_USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 13_5) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/138.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:129.0) Gecko/20100101 Firefox/129.0",
];

/// Main configuration structure for Catalog-Crawler
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl traversal configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First listing page to fetch
    #[serde(rename = "start-url", default = "default_start_url")]
    pub start_url: String,

    /// Domain patterns the crawl may fetch from (e.g. "example.com" or "*.example.com")
    ///
    /// Empty means the start URL's host only.
    #[serde(rename = "allowed-domains", default)]
    pub allowed_domains: Vec<String>,

    /// Stop after this many pages have been fetched
    #[serde(rename = "max-pages", default)]
    pub max_pages: Option<u32>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            start_url: default_start_url(),
            allowed_domains: Vec::new(),
            max_pages: None,
        }
    }
}

/// Request timeout, retry and header rotation configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Retries after the first attempt
    #[serde(rename = "retry-times", default = "default_retry_times")]
    pub retry_times: u32,

    /// Status codes that trigger a retry
    #[serde(rename = "retry-http-codes", default = "default_retry_http_codes")]
    pub retry_http_codes: Vec<u16>,

    /// User-Agent pool, one picked at random per request
    #[serde(rename = "user-agents", default = "default_user_agents")]
    pub user_agents: Vec<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            retry_times: DEFAULT_RETRY_TIMES,
            retry_http_codes: default_retry_http_codes(),
            user_agents: default_user_agents(),
        }
    }
}

/// Output configuration, one optional path per sink
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the CSV file
    #[serde(rename = "csv-path", default)]
    pub csv_path: Option<String>,

    /// Path to the SQLite database file
    #[serde(rename = "database-path", default)]
    pub database_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv_path: Some("books.csv".to_string()),
            database_path: Some("books.db".to_string()),
        }
    }
}

fn default_start_url() -> String {
    DEFAULT_START_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_retry_times() -> u32 {
    DEFAULT_RETRY_TIMES
}

fn default_retry_http_codes() -> Vec<u16> {
    DEFAULT_RETRY_HTTP_CODES.to_vec()
}

fn default_user_agents() -> Vec<String> {
    DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect()
}
