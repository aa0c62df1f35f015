//! Record model for one scraped catalog entry
//!
//! A [`Record`] is built once by the parser, handed to every sink, and then
//! dropped. Fields are private so a record cannot change after creation.

use std::fmt;

/// Placeholder written for any field that could not be extracted
pub const SENTINEL: &str = "N/A";

/// Column names, in field order, used by tabular sinks
pub const HEADERS: [&str; 4] = ["Title", "Price", "Availability", "Rating"];

/// One catalog entry as displayed on a listing page
///
/// Every field holds either extracted, non-empty text or [`SENTINEL`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    title: String,
    price: String,
    availability: String,
    rating: String,
}

impl Record {
    /// Creates a record, replacing missing or blank fields with the sentinel
    ///
    /// # Example
    ///
    /// ```
    /// use catalog_crawler::Record;
    ///
    /// let record = Record::new(Some("A Light in the Attic"), Some("£51.77"), None, Some("  "));
    /// assert_eq!(record.title(), "A Light in the Attic");
    /// assert_eq!(record.availability(), "N/A");
    /// assert_eq!(record.rating(), "N/A");
    /// ```
    pub fn new(
        title: Option<&str>,
        price: Option<&str>,
        availability: Option<&str>,
        rating: Option<&str>,
    ) -> Self {
        Self {
            title: or_sentinel(title),
            price: or_sentinel(price),
            availability: or_sentinel(availability),
            rating: or_sentinel(rating),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn price(&self) -> &str {
        &self.price
    }

    pub fn availability(&self) -> &str {
        &self.availability
    }

    pub fn rating(&self) -> &str {
        &self.rating
    }

    /// Returns the fields in column order (see [`HEADERS`])
    pub fn fields(&self) -> [&str; 4] {
        [
            self.title.as_str(),
            self.price.as_str(),
            self.availability.as_str(),
            self.rating.as_str(),
        ]
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {} | {}",
            self.title, self.price, self.availability, self.rating
        )
    }
}

fn or_sentinel(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v.to_string(),
        _ => SENTINEL.to_string(),
    }
}
