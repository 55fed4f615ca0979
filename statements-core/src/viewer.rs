//! Viewer controller: owns filters, the refresh counter, the listing result
//! and the upload outcome, and decides when the listing must be refetched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

use crate::filters::{FilterField, FilterStateManager, SortField, TransactionFilters};
use crate::pagination::PaginationView;
use crate::transaction::{PageResponse, Transaction};
use crate::upload::{UploadState, UploadStateError};

pub const EMPTY_LIST_MESSAGE: &str =
    "No transactions found. Upload a bank statement to get started.";

/// How out-of-order listing responses are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResponseOrdering {
    /// Only the most recently issued request may update the display.
    #[default]
    LatestIssued,
    /// Whichever response arrives last overwrites the display.
    LastResolved,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown response ordering '{0}' (expected latest-issued or last-resolved)")]
pub struct ParseOrderingError(String);

impl FromStr for ResponseOrdering {
    type Err = ParseOrderingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "latest-issued" => Ok(ResponseOrdering::LatestIssued),
            "last-resolved" => Ok(ResponseOrdering::LastResolved),
            other => Err(ParseOrderingError(other.to_string())),
        }
    }
}

impl fmt::Display for ResponseOrdering {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseOrdering::LatestIssued => f.write_str("latest-issued"),
            ResponseOrdering::LastResolved => f.write_str("last-resolved"),
        }
    }
}

/// A listing request the caller must perform and report back with
/// [`ViewerState::apply_fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub seq: u64,
    pub filters: TransactionFilters,
}

/// What the transaction list area shows.
#[derive(Debug, Clone, PartialEq)]
pub enum ListView<'a> {
    Loading,
    /// No page to show and the last fetch failed; offer a retry
    Error { message: &'a str },
    Empty,
    Table {
        rows: &'a [Transaction],
        pagination: Option<PaginationView>,
        /// A newer fetch failed; the rows are from the previous success
        stale_error: Option<&'a str>,
        refreshing: bool,
    },
}

#[derive(Debug, Clone)]
pub struct ViewerState {
    filters: FilterStateManager,
    refresh_trigger: u64,
    upload: UploadState,
    page: Option<PageResponse>,
    error: Option<String>,
    ordering: ResponseOrdering,
    next_seq: u64,
    latest_issued: Option<u64>,
    in_flight: usize,
    issued_key: Option<(TransactionFilters, u64)>,
}

impl Default for ViewerState {
    fn default() -> Self {
        Self::new(TransactionFilters::default(), ResponseOrdering::default())
    }
}

impl ViewerState {
    pub fn new(initial: TransactionFilters, ordering: ResponseOrdering) -> Self {
        Self {
            filters: FilterStateManager::new(initial),
            refresh_trigger: 0,
            upload: UploadState::Idle,
            page: None,
            error: None,
            ordering,
            next_seq: 1,
            latest_issued: None,
            in_flight: 0,
            issued_key: None,
        }
    }

    pub fn filters(&self) -> &FilterStateManager {
        &self.filters
    }

    pub fn refresh_trigger(&self) -> u64 {
        self.refresh_trigger
    }

    pub fn ordering(&self) -> ResponseOrdering {
        self.ordering
    }

    pub fn page(&self) -> Option<&PageResponse> {
        self.page.as_ref()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight > 0
    }

    pub fn upload(&self) -> &UploadState {
        &self.upload
    }

    // --- filter operations -------------------------------------------------

    pub fn edit_filter_text(&mut self, field: FilterField, text: &str) {
        self.filters.edit_text(field, text);
    }

    pub fn apply_filters(&mut self) {
        self.filters.apply();
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn discard_filter_draft(&mut self) {
        self.filters.discard_draft();
    }

    pub fn go_to_page(&mut self, page: u32) {
        self.filters.go_to_page(page);
    }

    /// Step to the previous page if the current page allows it.
    pub fn previous_page(&mut self) -> bool {
        match self.pagination().and_then(|p| p.previous) {
            Some(p) => {
                self.go_to_page(p);
                true
            }
            None => false,
        }
    }

    /// Step to the next page if the current page allows it.
    pub fn next_page(&mut self) -> bool {
        match self.pagination().and_then(|p| p.next) {
            Some(p) => {
                self.go_to_page(p);
                true
            }
            None => false,
        }
    }

    pub fn sort_by(&mut self, field: SortField) {
        self.filters.sort_by(field);
    }

    // --- listing -----------------------------------------------------------

    /// Issue a ticket when the active filters or the refresh counter changed
    /// since the last one.
    pub fn poll_fetch(&mut self) -> Option<FetchTicket> {
        let key = (self.filters.active().clone(), self.refresh_trigger);
        if self.issued_key.as_ref() == Some(&key) {
            return None;
        }
        self.issued_key = Some(key);
        Some(self.issue())
    }

    /// Explicit retry: always issues a ticket for the current filters.
    pub fn retry(&mut self) -> FetchTicket {
        self.issued_key = Some((self.filters.active().clone(), self.refresh_trigger));
        self.issue()
    }

    fn issue(&mut self) -> FetchTicket {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.latest_issued = Some(seq);
        self.in_flight += 1;
        FetchTicket {
            seq,
            filters: self.filters.active().clone(),
        }
    }

    /// Report the outcome of a ticket. Returns whether it changed the display.
    ///
    /// A success replaces the whole page; a failure keeps the previous page
    /// and records the message.
    pub fn apply_fetch(&mut self, seq: u64, result: Result<PageResponse, String>) -> bool {
        self.in_flight = self.in_flight.saturating_sub(1);

        if self.ordering == ResponseOrdering::LatestIssued && self.latest_issued != Some(seq) {
            debug!(seq, latest = ?self.latest_issued, "discarding stale listing response");
            return false;
        }

        match result {
            Ok(page) => {
                self.page = Some(page);
                self.error = None;
            }
            Err(message) => {
                self.error = Some(message);
            }
        }
        true
    }

    pub fn pagination(&self) -> Option<PaginationView> {
        self.page.as_ref().and_then(PaginationView::from_page)
    }

    pub fn list_view(&self) -> ListView<'_> {
        match (&self.page, &self.error) {
            (None, Some(message)) => ListView::Error { message },
            (None, None) if self.is_loading() => ListView::Loading,
            (None, None) => ListView::Empty,
            (Some(page), _) if page.empty => ListView::Empty,
            (Some(page), error) => ListView::Table {
                rows: &page.content,
                pagination: PaginationView::from_page(page),
                stale_error: error.as_deref(),
                refreshing: self.is_loading(),
            },
        }
    }

    // --- upload ------------------------------------------------------------

    /// Start an upload attempt, dismissing any earlier outcome.
    pub fn upload_started(&mut self) -> Result<(), UploadStateError> {
        if !self.upload.is_uploading() {
            self.upload.reset();
        }
        self.upload.begin()
    }

    pub fn upload_progress(&mut self, pct: u8) -> bool {
        self.upload.record_progress(pct)
    }

    /// Record success and bump the refresh counter so the list refetches.
    pub fn upload_succeeded(&mut self, message: impl Into<String>) -> Result<(), UploadStateError> {
        self.upload.succeed(message)?;
        self.refresh_trigger += 1;
        Ok(())
    }

    pub fn upload_failed(&mut self, message: impl Into<String>) {
        if !self.upload.is_uploading() {
            self.upload.reset();
        }
        // Idle and Uploading both accept a failure.
        let _ = self.upload.fail(message);
    }

    pub fn reset_upload(&mut self) {
        self.upload.reset();
    }
}
