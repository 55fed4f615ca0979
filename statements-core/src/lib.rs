//! statements-core: filter state, page envelopes, upload state machine and the
//! viewer controller for the bank-statement transaction browser.

pub mod filters;
pub mod format;
pub mod pagination;
pub mod transaction;
pub mod upload;
pub mod viewer;

pub use filters::{
    FilterEdit, FilterField, FilterStateManager, ParseFilterError, SortDirection, SortField,
    TransactionFilters, CLEARED_PAGE_SIZE, DEFAULT_PAGE_SIZE,
};
pub use format::{format_currency, format_date};
pub use pagination::PaginationView;
pub use transaction::{PageResponse, Pageable, Transaction};
pub use upload::{
    is_pdf_media_type, ProgressTracker, UploadState, UploadStateError, NOT_A_PDF_MESSAGE,
};
pub use viewer::{FetchTicket, ListView, ResponseOrdering, ViewerState, EMPTY_LIST_MESSAGE};
