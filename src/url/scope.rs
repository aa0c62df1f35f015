use crate::url::{extract_domain, is_in_scope};
use url::Url;

/// The set of domains a crawl may fetch from
///
/// Built once from configuration and read-only afterwards. When no patterns
/// are configured, the scope falls back to the start URL's own host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainScope {
    patterns: Vec<String>,
}

impl DomainScope {
    pub fn new(patterns: Vec<String>) -> Self {
        Self { patterns }
    }

    /// Builds the scope for a crawl starting at `start_url`
    pub fn for_start_url(start_url: &Url, patterns: &[String]) -> Self {
        if !patterns.is_empty() {
            return Self::new(patterns.to_vec());
        }

        Self::new(extract_domain(start_url).into_iter().collect())
    }

    /// Returns true if the URL may be fetched
    pub fn allows(&self, url: &Url) -> bool {
        is_in_scope(url, &self.patterns)
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}
