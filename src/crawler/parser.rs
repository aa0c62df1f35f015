//! Listing page parser
//!
//! This module turns one catalog listing page into:
//! - One [`Record`] per listing entry
//! - The absolute URL of the next page, if any
//!
//! Entries are extracted one at a time. A malformed entry is logged and
//! skipped; it never stops the rest of the page from being parsed.

use crate::record::Record;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Entries of the listing grid
const ENTRY_SELECTOR: &str = r#"ol[class="row"] > li"#;
/// Link whose `title` attribute carries the full title
const TITLE_SELECTOR: &str = "h3 > a";
const PRICE_SELECTOR: &str = "p.price_color";
/// Icon element that precedes the availability text
const AVAILABILITY_MARKER_SELECTOR: &str = "div.product_price p.instock.availability > i";
const RATING_SELECTOR: &str = "p.star-rating";
const NEXT_SELECTOR: &str = "li.next > a[href]";

/// Errors raised while parsing listing pages
#[derive(Debug, Error)]
pub enum ParseError {
    /// One entry could not be turned into a record
    #[error("Entry {index} carries no product markup")]
    NotAProduct { index: usize },

    #[error("Invalid selector '{selector}': {message}")]
    Selector {
        selector: &'static str,
        message: String,
    },
}

/// Everything extracted from one listing page
#[derive(Debug, Clone, Default)]
pub struct ParsedListing {
    /// Records in page order
    pub records: Vec<Record>,

    /// Absolute URL of the next page
    pub next_page: Option<Url>,

    /// Number of entries skipped as malformed
    pub skipped: usize,
}

/// Pre-compiled selectors for the catalog markup
#[derive(Debug)]
struct Selectors {
    entry: Selector,
    title: Selector,
    price: Selector,
    availability_marker: Selector,
    rating: Selector,
    next: Selector,
}

impl Selectors {
    fn compile() -> Result<Self, ParseError> {
        Ok(Self {
            entry: compile(ENTRY_SELECTOR)?,
            title: compile(TITLE_SELECTOR)?,
            price: compile(PRICE_SELECTOR)?,
            availability_marker: compile(AVAILABILITY_MARKER_SELECTOR)?,
            rating: compile(RATING_SELECTOR)?,
            next: compile(NEXT_SELECTOR)?,
        })
    }
}

fn compile(selector: &'static str) -> Result<Selector, ParseError> {
    Selector::parse(selector).map_err(|e| ParseError::Selector {
        selector,
        message: format!("{:?}", e),
    })
}

/// Parser for catalog listing pages
#[derive(Debug)]
pub struct ListingParser {
    selectors: Selectors,
    span: tracing::Span,
}

impl ListingParser {
    pub fn new() -> Result<Self, ParseError> {
        Ok(Self {
            selectors: Selectors::compile()?,
            span: tracing::info_span!("parser"),
        })
    }

    /// Parses a listing page
    ///
    /// # Arguments
    ///
    /// * `body` - The HTML content of the page
    /// * `base_url` - The page URL, used to resolve the next-page link
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_crawler::crawler::ListingParser;
    /// use url::Url;
    ///
    /// let html = r#"<ol class="row"><li><article class="product_pod">
    ///     <p class="star-rating Three"></p>
    ///     <h3><a href="a.html" title="A Light in the Attic">A Light...</a></h3>
    ///     <p class="price_color">£51.77</p>
    /// </article></li></ol>"#;
    /// let base = Url::parse("https://books.toscrape.com/").unwrap();
    /// let listing = ListingParser::new().unwrap().parse(html, &base);
    /// assert_eq!(listing.records.len(), 1);
    /// assert_eq!(listing.records[0].rating(), "Three");
    /// assert!(listing.next_page.is_none());
    /// ```
    pub fn parse(&self, body: &str, base_url: &Url) -> ParsedListing {
        let _guard = self.span.enter();
        let document = Html::parse_document(body);

        let mut listing = ParsedListing::default();
        for (index, entry) in document.select(&self.selectors.entry).enumerate() {
            match self.extract_record(index, entry) {
                Ok(record) => {
                    tracing::trace!("Entry {}: {}", index, record);
                    listing.records.push(record);
                }
                Err(e) => {
                    tracing::error!("Error parsing entry on {}: {}", base_url, e);
                    listing.skipped += 1;
                }
            }
        }

        listing.next_page = self.extract_next_page(&document, base_url);

        tracing::debug!(
            "Parsed {}: {} records, {} skipped, next: {:?}",
            base_url,
            listing.records.len(),
            listing.skipped,
            listing.next_page.as_ref().map(Url::as_str)
        );

        listing
    }

    /// Extracts one record; each field falls back to the sentinel on its own
    fn extract_record(&self, index: usize, entry: ElementRef<'_>) -> Result<Record, ParseError> {
        let title_link = entry.select(&self.selectors.title).next();
        let price_node = entry.select(&self.selectors.price).next();

        if title_link.is_none() && price_node.is_none() {
            return Err(ParseError::NotAProduct { index });
        }

        let title = title_link.and_then(|a| a.value().attr("title"));

        // Kept exactly as displayed
        let price = price_node.map(|p| p.text().collect::<String>());
        let price = price.as_deref();

        let availability = entry
            .select(&self.selectors.availability_marker)
            .next()
            .and_then(following_text);
        let availability = availability.as_deref().map(str::trim);

        let rating = entry
            .select(&self.selectors.rating)
            .next()
            .and_then(|p| p.value().attr("class"))
            .and_then(|class| class.split_whitespace().last());

        Ok(Record::new(title, price, availability, rating))
    }

    /// Resolves the "next" pagination link against the page URL
    fn extract_next_page(&self, document: &Html, base_url: &Url) -> Option<Url> {
        let href = document
            .select(&self.selectors.next)
            .next()
            .and_then(|a| a.value().attr("href"))?;

        match base_url.join(href.trim()) {
            Ok(url) => Some(url),
            Err(e) => {
                tracing::warn!("Ignoring unresolvable next link '{}': {}", href, e);
                None
            }
        }
    }
}

/// Returns the first text node after `marker` in document order
///
/// The marker's own descendants are not considered.
fn following_text(marker: ElementRef<'_>) -> Option<String> {
    let mut node = *marker;
    loop {
        for sibling in node.next_siblings() {
            if let Some(text) = sibling.descendants().find_map(|n| n.value().as_text()) {
                let text: &str = text;
                return Some(text.to_string());
            }
        }
        node = node.parent()?;
    }
}
