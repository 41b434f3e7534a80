//! Pure filter, sort and summary functions over ticket listings.
//!
//! Nothing here touches the store or keeps state between calls: every
//! function takes the full collection plus parameters and returns a new
//! sequence.

use std::fmt;
use std::str::FromStr;

use entities::{Priority, RepairTicket, TicketStatus, TicketWithOwner};
use serde::{Deserialize, Serialize};

/// Something the query engine can filter and sort.
pub trait QueryRecord {
    fn ticket(&self) -> &RepairTicket;

    /// Display name of the owning user, when it is known.
    fn owner_name(&self) -> Option<&str>;
}

impl QueryRecord for RepairTicket {
    fn ticket(&self) -> &RepairTicket {
        self
    }

    fn owner_name(&self) -> Option<&str> {
        None
    }
}

impl QueryRecord for TicketWithOwner {
    fn ticket(&self) -> &RepairTicket {
        &self.ticket
    }

    fn owner_name(&self) -> Option<&str> {
        self.owner.as_ref().map(|o| o.name.as_str())
    }
}

/// Status restriction for a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    /// The `All` sentinel.
    #[default]
    All,
    Only(TicketStatus),
}

impl StatusFilter {
    pub fn matches(&self, status: TicketStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => *wanted == status,
        }
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<TicketStatus>().map(Self::Only)
    }
}

/// Ordering applied to a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Newest,
    Oldest,
    Priority,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Newest => "newest",
            Self::Oldest => "oldest",
            Self::Priority => "priority",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "newest" => Ok(Self::Newest),
            "oldest" => Ok(Self::Oldest),
            "priority" => Ok(Self::Priority),
            other => Err(format!("unknown sort key: {other}")),
        }
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

/// Returns true if `record` passes both the status and the search check.
///
/// The search term matches case-insensitively against the description, the
/// owner's name and the device type. Missing fields simply do not match.
pub fn matches_query<R: QueryRecord>(record: &R, search: &str, status: StatusFilter) -> bool {
    let ticket = record.ticket();
    if !status.matches(ticket.status) {
        return false;
    }

    if search.is_empty() {
        return true;
    }
    let needle = search.to_lowercase();

    contains_ci(Some(&ticket.description), &needle)
        || contains_ci(record.owner_name(), &needle)
        || contains_ci(Some(ticket.device_type.as_str()), &needle)
}

/// Keeps the records matching `search` and `status`, preserving order.
pub fn filter_tickets<R: QueryRecord + Clone>(
    records: &[R],
    search: &str,
    status: StatusFilter,
) -> Vec<R> {
    records
        .iter()
        .filter(|r| matches_query(*r, search, status))
        .cloned()
        .collect()
}

/// Returns a copy of `records` ordered by `key`. Equal keys keep their
/// input order.
pub fn sort_tickets<R: QueryRecord + Clone>(records: &[R], key: SortKey) -> Vec<R> {
    let mut sorted = records.to_vec();
    match key {
        SortKey::Newest => sorted.sort_by(|a, b| b.ticket().created_at.cmp(&a.ticket().created_at)),
        SortKey::Oldest => sorted.sort_by(|a, b| a.ticket().created_at.cmp(&b.ticket().created_at)),
        SortKey::Priority => sorted.sort_by(|a, b| {
            Priority::rank(Some(b.ticket().priority)).cmp(&Priority::rank(Some(a.ticket().priority)))
        }),
    }
    sorted
}

/// Listing parameters taken from a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TicketQuery {
    pub search: String,
    pub status: StatusFilter,
    pub sort: Option<SortKey>,
}

impl TicketQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_status(mut self, status: StatusFilter) -> Self {
        self.status = status;
        self
    }

    pub fn with_sort(mut self, sort: SortKey) -> Self {
        self.sort = Some(sort);
        self
    }

    /// Returns true if applying this query cannot change a listing.
    pub fn is_noop(&self) -> bool {
        self.search.is_empty() && self.status == StatusFilter::All && self.sort.is_none()
    }

    /// Filters, then sorts when a key was given.
    pub fn apply<R: QueryRecord + Clone>(&self, records: &[R]) -> Vec<R> {
        let filtered = filter_tickets(records, &self.search, self.status);
        match self.sort {
            Some(key) => sort_tickets(&filtered, key),
            None => filtered,
        }
    }
}

/// Dashboard counters over a set of tickets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketStats {
    pub total: usize,
    /// Anything not yet completed.
    pub active: usize,
    pub in_progress: usize,
    pub resolved: usize,
}

impl TicketStats {
    pub fn from_tickets<R: QueryRecord>(records: &[R]) -> Self {
        records.iter().fold(Self::default(), |mut stats, record| {
            let status = record.ticket().status;
            stats.total += 1;
            if status.is_resolved() {
                stats.resolved += 1;
            } else {
                stats.active += 1;
            }
            if status == TicketStatus::InProgress {
                stats.in_progress += 1;
            }
            stats
        })
    }
}
