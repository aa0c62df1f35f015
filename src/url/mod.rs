//! URL handling module for Catalog-Crawler
//!
//! This module provides domain extraction and the allow-list checks that keep
//! pagination on the configured catalog site.

mod scope;

pub use scope::DomainScope;

use url::Url;

/// Extracts the lowercase host of a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use catalog_crawler::url::extract_domain;
///
/// let url = Url::parse("https://Books.ToScrape.com/catalogue/page-2.html").unwrap();
/// assert_eq!(extract_domain(&url), Some("books.toscrape.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Checks if a domain matches an allow-list pattern
///
/// `"example.com"` matches only itself. `"*.example.com"` matches the bare
/// domain and any subdomain of it.
///
/// # Examples
///
/// ```
/// use catalog_crawler::url::matches_wildcard;
///
/// assert!(matches_wildcard("books.toscrape.com", "books.toscrape.com"));
/// assert!(matches_wildcard("*.toscrape.com", "books.toscrape.com"));
/// assert!(matches_wildcard("*.toscrape.com", "toscrape.com"));
/// assert!(!matches_wildcard("*.toscrape.com", "nottoscrape.com"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.to_lowercase();
    match pattern.strip_prefix("*.") {
        Some(base) => {
            candidate == base
                || candidate
                    .strip_suffix(base)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        }
        None => candidate == pattern,
    }
}

/// Returns true if the URL is http(s) and its host matches any pattern
pub fn is_in_scope(url: &Url, patterns: &[String]) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return false;
    }

    match extract_domain(url) {
        Some(domain) => patterns.iter().any(|p| matches_wildcard(p, &domain)),
        None => false,
    }
}
