/// Crawl phase definitions for the pagination state machine
///
/// Each page moves through Fetching → Parsing → Dispatching → Advancing, and
/// Advancing either loops back to Fetching or ends the crawl.
use std::fmt;

/// Represents the current phase of a pagination crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlPhase {
    // ===== Active Phases =====
    /// Waiting on the fetcher for the current URL
    Fetching,

    /// Extracting records and the next link from a fetched page
    Parsing,

    /// Handing the page's records to every sink
    Dispatching,

    /// Deciding whether a next page exists
    Advancing,

    // ===== Terminal Phases =====
    /// No next page, scope left, or page limit reached
    Done,

    /// A fetch failed for good
    Failed,
}

impl CrawlPhase {
    /// Returns true if the crawl has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this phase
    pub fn can_transition_to(&self, next: CrawlPhase) -> bool {
        use CrawlPhase::*;

        matches!(
            (self, next),
            (Fetching, Parsing)
                | (Fetching, Failed)
                | (Fetching, Done)
                | (Parsing, Dispatching)
                | (Dispatching, Advancing)
                | (Advancing, Fetching)
                | (Advancing, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetching => "fetching",
            Self::Parsing => "parsing",
            Self::Dispatching => "dispatching",
            Self::Advancing => "advancing",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns all phases
    pub fn all_phases() -> Vec<Self> {
        vec![
            Self::Fetching,
            Self::Parsing,
            Self::Dispatching,
            Self::Advancing,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for CrawlPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
