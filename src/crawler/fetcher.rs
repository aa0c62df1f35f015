//! HTTP fetcher implementation
//!
//! This module handles every HTTP request the crawler makes:
//! - Building the HTTP client
//! - Picking a rotated User-Agent per request
//! - Applying the per-request timeout
//! - Retrying transient failures with the same URL
//! - Following redirects, but only inside the allowed domains
//! - Classifying terminal failures

use crate::config::FetchConfig;
use crate::crawler::{HeaderPool, RetryPolicy};
use crate::url::DomainScope;
use async_trait::async_trait;
use reqwest::header::{LOCATION, USER_AGENT};
use reqwest::{redirect::Policy, Client, StatusCode};
use thiserror::Error;
use tracing::Instrument;
use url::Url;

/// Errors that end a fetch for one URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url} after {attempts} attempts")]
    Timeout { url: String, attempts: u32 },

    #[error("HTTP {status} for {url} after {attempts} attempts")]
    RetryableStatus {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("HTTP {status} for {url}")]
    NonRetryableStatus { url: String, status: u16 },

    #[error("Network error for {url} after {attempts} attempts: {message}")]
    Transport {
        url: String,
        message: String,
        attempts: u32,
    },

    /// A redirect pointed outside the allowed domains; the target was not requested
    #[error("Redirect from {url} leaves the allowed domains: {location}")]
    OffScopeRedirect { url: String, location: Url },

    /// Redirect loop, chain too long, or unusable Location header
    #[error("Redirect error for {url}: {message}")]
    Redirect { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Client(String),

    #[error("User-Agent pool is empty")]
    EmptyHeaderPool,
}

impl FetchError {
    /// The HTTP status behind this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::RetryableStatus { status, .. } | Self::NonRetryableStatus { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Number of requests sent before giving up
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. }
            | Self::RetryableStatus { attempts, .. }
            | Self::Transport { attempts, .. } => *attempts,
            Self::NonRetryableStatus { .. }
            | Self::OffScopeRedirect { .. }
            | Self::Redirect { .. } => 1,
            Self::Client(_) | Self::EmptyHeaderPool => 0,
        }
    }
}

/// Maximum number of redirect hops followed for one page
pub const MAX_REDIRECTS: usize = 10;

/// A page that came back with HTTP 200
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final URL after redirects, used to resolve relative links
    pub url: Url,
    pub status: u16,
    pub body: String,
}

/// Source of listing pages
///
/// Implemented by [`HttpFetcher`]; tests drive the pagination loop with
/// scripted implementations.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches one page, retrying transient failures per the fetcher's policy
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Outcome of a single request
enum Attempt {
    Success(FetchedPage),
    Redirect(Url),
    Retry(Transient),
    Fatal(FetchError),
}

/// Outcome of one URL once retries are settled
enum Hop {
    Page(FetchedPage),
    Redirect(Url),
}

/// Failure worth another attempt
#[derive(Debug)]
enum Transient {
    Timeout,
    Status(u16),
    Transport(String),
}

impl Transient {
    fn into_error(self, url: &Url, attempts: u32) -> FetchError {
        let url = url.to_string();
        match self {
            Self::Timeout => FetchError::Timeout { url, attempts },
            Self::Status(status) => FetchError::RetryableStatus {
                url,
                status,
                attempts,
            },
            Self::Transport(message) => FetchError::Transport {
                url,
                message,
                attempts,
            },
        }
    }
}

/// Builds the shared HTTP client
///
/// The User-Agent is set per request, so the client carries none. Redirects
/// are followed by [`HttpFetcher`] itself so every hop is scope-checked.
pub fn build_http_client(policy: &RetryPolicy) -> Result<Client, FetchError> {
    Client::builder()
        .connect_timeout(policy.timeout())
        .redirect(Policy::none())
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(|e| FetchError::Client(e.to_string()))
}

/// reqwest-backed fetcher with header rotation and an explicit retry loop
pub struct HttpFetcher {
    client: Client,
    headers: HeaderPool,
    policy: RetryPolicy,
    scope: DomainScope,
    span: tracing::Span,
}

impl HttpFetcher {
    /// Creates a fetcher that only follows redirects allowed by `scope`
    pub fn new(
        headers: HeaderPool,
        policy: RetryPolicy,
        scope: DomainScope,
    ) -> Result<Self, FetchError> {
        let client = build_http_client(&policy)?;
        Ok(Self {
            client,
            headers,
            policy,
            scope,
            span: tracing::info_span!("fetcher"),
        })
    }

    pub fn from_config(config: &FetchConfig, scope: DomainScope) -> Result<Self, FetchError> {
        let headers = HeaderPool::new(config.user_agents.clone())?;
        Self::new(headers, RetryPolicy::from_config(config), scope)
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL, following in-scope redirects
    ///
    /// Each hop gets its own retry budget. A redirect whose target is outside
    /// the allowed domains stops the fetch before the target is requested.
    async fn fetch_following_redirects(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let mut current = url.clone();
        let mut visited = vec![url.clone()];

        for _ in 0..=MAX_REDIRECTS {
            let location = match self.fetch_with_retries(&current).await? {
                Hop::Page(page) => return Ok(page),
                Hop::Redirect(location) => location,
            };

            if !self.scope.allows(&location) {
                tracing::warn!(
                    "Not following redirect {} -> {}: outside the allowed domains",
                    current,
                    location
                );
                return Err(FetchError::OffScopeRedirect {
                    url: current.to_string(),
                    location,
                });
            }
            if visited.contains(&location) {
                return Err(FetchError::Redirect {
                    url: url.to_string(),
                    message: format!("redirect loop at {}", location),
                });
            }

            tracing::debug!("Redirect {} -> {}", current, location);
            visited.push(location.clone());
            current = location;
        }

        Err(FetchError::Redirect {
            url: url.to_string(),
            message: format!("more than {} redirects", MAX_REDIRECTS),
        })
    }

    /// Fetches one URL, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 200 | Success |
    /// | HTTP 301/302/303/307/308 | Hand the Location back |
    /// | Status in the retry set | Retry immediately |
    /// | Timeout | Retry immediately |
    /// | Connection error | Retry immediately |
    /// | Any other status | Fail at once |
    ///
    /// After `retry_times` retries the last transient failure is returned.
    async fn fetch_with_retries(&self, url: &Url) -> Result<Hop, FetchError> {
        let max_attempts = self.policy.max_attempts();
        let mut attempt = 1;

        loop {
            let user_agent = self.headers.pick();
            tracing::debug!("GET {} (attempt {}/{})", url, attempt, max_attempts);

            match self.attempt(url, user_agent).await {
                Attempt::Success(page) => {
                    tracing::info!("Fetched {} ({} bytes)", page.url, page.body.len());
                    return Ok(Hop::Page(page));
                }
                Attempt::Redirect(location) => return Ok(Hop::Redirect(location)),
                Attempt::Fatal(error) => {
                    tracing::error!("Giving up on {}: {}", url, error);
                    return Err(error);
                }
                Attempt::Retry(transient) if attempt < max_attempts => {
                    tracing::warn!(
                        "Retrying {} ({:?}), attempt {}/{}",
                        url,
                        transient,
                        attempt,
                        max_attempts
                    );
                    attempt += 1;
                }
                Attempt::Retry(transient) => {
                    let error = transient.into_error(url, attempt);
                    tracing::error!("Retries exhausted for {}: {}", url, error);
                    return Err(error);
                }
            }
        }
    }

    /// Sends one request and classifies the result
    async fn attempt(&self, url: &Url, user_agent: &str) -> Attempt {
        let response = match self
            .client
            .get(url.as_str())
            .header(USER_AGENT, user_agent)
            .timeout(self.policy.timeout())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return classify_error(e),
        };

        let status = response.status();
        if is_followed_redirect(status) {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok());
            return match location.and_then(|l| resolve_location(url, l)) {
                Some(target) => Attempt::Redirect(target),
                None => Attempt::Fatal(FetchError::Redirect {
                    url: url.to_string(),
                    message: format!("HTTP {} without a usable Location", status.as_u16()),
                }),
            };
        }

        if status != StatusCode::OK {
            let code = status.as_u16();
            if self.policy.is_retryable_status(code) {
                return Attempt::Retry(Transient::Status(code));
            }
            tracing::error!("{} returned status {}", url, code);
            return Attempt::Fatal(FetchError::NonRetryableStatus {
                url: url.to_string(),
                status: code,
            });
        }

        match response.text().await {
            Ok(body) => Attempt::Success(FetchedPage {
                url: url.clone(),
                status: status.as_u16(),
                body,
            }),
            Err(e) => classify_error(e),
        }
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.fetch_following_redirects(url)
            .instrument(self.span.clone())
            .await
    }
}

fn is_followed_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

/// Resolves a Location header against the URL that returned it
fn resolve_location(base: &Url, location: &str) -> Option<Url> {
    base.join(location.trim()).ok()
}

/// Maps a reqwest error onto the retry taxonomy
fn classify_error(error: reqwest::Error) -> Attempt {
    if error.is_timeout() {
        Attempt::Retry(Transient::Timeout)
    } else if error.is_builder() {
        Attempt::Fatal(FetchError::Client(error.to_string()))
    } else {
        Attempt::Retry(Transient::Transport(error.to_string()))
    }
}
