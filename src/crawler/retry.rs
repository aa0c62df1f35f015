//! Timeout and retry policy for page fetches
//!
//! Retries are immediate: there is no backoff between attempts.

use crate::config::{
    FetchConfig, DEFAULT_RETRY_HTTP_CODES, DEFAULT_RETRY_TIMES, DEFAULT_TIMEOUT_SECS,
};
use std::collections::BTreeSet;
use std::time::Duration;

/// Explicit retry policy handed to the fetcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    timeout: Duration,
    retry_times: u32,
    retry_statuses: BTreeSet<u16>,
}

impl RetryPolicy {
    /// Creates a policy
    ///
    /// # Arguments
    ///
    /// * `timeout` - Per-request timeout
    /// * `retry_times` - Retries after the first attempt
    /// * `retry_statuses` - HTTP status codes treated as transient
    pub fn new(
        timeout: Duration,
        retry_times: u32,
        retry_statuses: impl IntoIterator<Item = u16>,
    ) -> Self {
        Self {
            timeout,
            retry_times,
            retry_statuses: retry_statuses.into_iter().collect(),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(
            Duration::from_secs(config.timeout_secs),
            config.retry_times,
            config.retry_http_codes.iter().copied(),
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn retry_times(&self) -> u32 {
        self.retry_times
    }

    /// Total requests allowed for one URL (first attempt plus retries)
    pub fn max_attempts(&self) -> u32 {
        self.retry_times.saturating_add(1)
    }

    /// Returns true if a response with this status should be retried
    pub fn is_retryable_status(&self, status: u16) -> bool {
        self.retry_statuses.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            DEFAULT_RETRY_TIMES,
            DEFAULT_RETRY_HTTP_CODES,
        )
    }
}
