use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{DocumentRequest, DocumentType, RequestStatus};

/// Fixed page size used by every request listing.
pub const PAGE_SIZE: usize = 50;

/// Milliseconds of keyboard quiet before a search term becomes active.
pub const SEARCH_DEBOUNCE_MS: i64 = 300;

/// Display row joining a request with its requester, the unit the
/// aggregation view filters and paginates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestRow {
    pub request: DocumentRequest,
    pub requester_name: String,
    pub requester_email: String,
}

impl RequestRow {
    /// Free-text haystack: requester name, email, document type label, and
    /// the submitted details/address fields. Any-field substring match.
    fn matches_search(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        if self.requester_name.to_lowercase().contains(&needle)
            || self.requester_email.to_lowercase().contains(&needle)
            || self
                .request
                .document_type
                .label()
                .to_lowercase()
                .contains(&needle)
        {
            return true;
        }
        self.request
            .form
            .values()
            .any(|value| value.to_lowercase().contains(&needle))
    }
}

/// Requested sort order by submission date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Newest,
    Oldest,
}

/// Immutable query parameters for one rendering of the request table.
///
/// Filters are conjunctive: a row is kept only when it satisfies search AND
/// status AND type AND urgency simultaneously.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestQuery {
    pub search: Option<String>,
    pub status: Option<RequestStatus>,
    pub document_type: Option<DocumentType>,
    pub urgent_only: bool,
    pub sort: SortOrder,
    /// 1-based page index.
    pub page: usize,
    pub page_size: usize,
}

impl Default for RequestQuery {
    fn default() -> Self {
        Self {
            search: None,
            status: None,
            document_type: None,
            urgent_only: false,
            sort: SortOrder::Newest,
            page: 1,
            page_size: PAGE_SIZE,
        }
    }
}

/// One page of the filtered-and-sorted set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPage {
    pub rows: Vec<RequestRow>,
    pub page: usize,
    pub total_pages: usize,
    pub total_matching: usize,
}

/// Apply the query to the full row set and slice out the requested page.
///
/// A page past the end yields an empty row list, never an error, and
/// concatenating pages `1..=total_pages` reproduces the whole filtered set.
pub fn filter_requests(rows: &[RequestRow], query: &RequestQuery) -> RequestPage {
    let mut matching: Vec<RequestRow> = rows
        .iter()
        .filter(|row| {
            query
                .search
                .as_deref()
                .map(|needle| needle.trim().is_empty() || row.matches_search(needle.trim()))
                .unwrap_or(true)
        })
        .filter(|row| {
            query
                .status
                .as_ref()
                .map(|status| row.request.status == *status)
                .unwrap_or(true)
        })
        .filter(|row| {
            query
                .document_type
                .map(|document_type| row.request.document_type == document_type)
                .unwrap_or(true)
        })
        .filter(|row| !query.urgent_only || row.request.is_urgent())
        .cloned()
        .collect();

    match query.sort {
        SortOrder::Newest => {
            matching.sort_by(|a, b| b.request.created_at.cmp(&a.request.created_at))
        }
        SortOrder::Oldest => {
            matching.sort_by(|a, b| a.request.created_at.cmp(&b.request.created_at))
        }
    }

    let page_size = query.page_size.max(1);
    let total_matching = matching.len();
    let total_pages = total_matching.div_ceil(page_size);
    let page = query.page.max(1);

    let start = (page - 1).saturating_mul(page_size);
    let rows = if start >= total_matching {
        Vec::new()
    } else {
        matching[start..(start + page_size).min(total_matching)].to_vec()
    };

    RequestPage {
        rows,
        page,
        total_pages,
        total_matching,
    }
}

/// Per-status counts shown above the request table. Field names follow the
/// stats endpoint payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub approved: usize,
    pub payment: usize,
    pub ready_for_claim: usize,
    pub completed: usize,
}

impl RequestStats {
    /// Local fallback: derive the counts from the in-memory set. In the
    /// steady state this agrees with the server-computed aggregate.
    pub fn from_requests(requests: &[DocumentRequest]) -> Self {
        let mut stats = RequestStats {
            total: requests.len(),
            ..RequestStats::default()
        };
        for request in requests {
            match request.status {
                RequestStatus::Pending => stats.pending += 1,
                RequestStatus::Processing => stats.processing += 1,
                RequestStatus::Approved => stats.approved += 1,
                RequestStatus::PaymentSent => stats.payment += 1,
                RequestStatus::ReadyToClaim => stats.ready_for_claim += 1,
                RequestStatus::Completed => stats.completed += 1,
                RequestStatus::Rejected | RequestStatus::Unknown(_) => {}
            }
        }
        stats
    }

    /// Prefer the server-computed aggregate when one arrived.
    pub fn resolve(server: Option<RequestStats>, requests: &[DocumentRequest]) -> Self {
        server.unwrap_or_else(|| Self::from_requests(requests))
    }
}

/// Commit a search term only after a quiet period, so the filter pipeline is
/// not recomputed on every keystroke. Time is injected by the caller.
#[derive(Debug, Clone)]
pub struct SearchDebouncer {
    committed: String,
    pending: Option<(String, DateTime<Utc>)>,
    quiet: Duration,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(Duration::milliseconds(SEARCH_DEBOUNCE_MS))
    }
}

impl SearchDebouncer {
    pub fn new(quiet: Duration) -> Self {
        Self {
            committed: String::new(),
            pending: None,
            quiet,
        }
    }

    /// Record a keystroke; restarts the quiet period.
    pub fn type_term(&mut self, term: impl Into<String>, at: DateTime<Utc>) {
        self.pending = Some((term.into(), at));
    }

    /// Commit the pending term once the quiet period has elapsed. Returns
    /// true when the committed term changed.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        match &self.pending {
            Some((term, typed_at)) if now - *typed_at >= self.quiet => {
                let changed = *term != self.committed;
                self.committed = term.clone();
                self.pending = None;
                changed
            }
            _ => false,
        }
    }

    pub fn committed(&self) -> &str {
        &self.committed
    }
}
