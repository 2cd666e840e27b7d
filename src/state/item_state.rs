/// Item state definitions for tracking crawl progress
use std::fmt;

/// Represents the current state of one item reference during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemState {
    // ===== Active States =====
    /// Reference was produced by an enumerator and not yet looked at
    Pending,

    /// Item page is currently being fetched
    Fetching,

    // ===== Terminal States =====
    /// Id was already in the ledger; nothing was fetched
    Skipped,

    /// Page was fetched and a record was extracted
    Extracted,

    /// Fetch failed (timeout, network error, non-2xx); id is still marked visited
    FetchFailed,
}

impl ItemState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending | Self::Fetching)
    }

    /// Returns true if reaching this state added the id to the ledger
    pub fn marks_visited(&self) -> bool {
        matches!(self, Self::Extracted | Self::FetchFailed)
    }

    /// Returns true if moving from `self` to `next` is allowed
    pub fn can_transition_to(&self, next: ItemState) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Skipped)
                | (Self::Pending, Self::Fetching)
                | (Self::Fetching, Self::Extracted)
                | (Self::Fetching, Self::FetchFailed)
        )
    }

    /// Short lowercase name used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Skipped => "skipped",
            Self::Extracted => "extracted",
            Self::FetchFailed => "fetch_failed",
        }
    }

    /// Returns the terminal states in report order
    pub fn terminal_states() -> [Self; 3] {
        [Self::Extracted, Self::Skipped, Self::FetchFailed]
    }
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
