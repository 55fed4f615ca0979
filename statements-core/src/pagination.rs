//! Pagination controls derived from a page envelope.

use crate::transaction::PageResponse;

/// Maximum number of page buttons shown at once
pub const PAGE_WINDOW: u32 = 5;

/// What the pager renders for one page response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationView {
    pub current: u32,
    pub total_pages: u32,
    pub first: bool,
    pub last: bool,
    /// Target of the "previous" control; `None` when disabled
    pub previous: Option<u32>,
    /// Target of the "next" control; `None` when disabled
    pub next: Option<u32>,
    /// Zero-based page numbers to offer as direct jumps
    pub window: Vec<u32>,
    pub showing_from: u64,
    pub showing_to: u64,
    pub total_elements: u64,
}

impl PaginationView {
    /// Controls for `page`, or `None` when there is a single page or no
    /// results at all.
    pub fn from_page(page: &PageResponse) -> Option<Self> {
        if page.empty || page.total_pages <= 1 {
            return None;
        }

        let start = page.number.saturating_sub(2);
        let window = (start..start.saturating_add(PAGE_WINDOW.min(page.total_pages)))
            .filter(|p| *p < page.total_pages)
            .collect();

        let size = u64::from(page.size);
        let number = u64::from(page.number);

        Some(Self {
            current: page.number,
            total_pages: page.total_pages,
            first: page.first,
            last: page.last,
            previous: if page.first { None } else { page.number.checked_sub(1) },
            next: if page.last { None } else { page.number.checked_add(1) },
            window,
            showing_from: number * size + 1,
            showing_to: ((number + 1) * size).min(page.total_elements),
            total_elements: page.total_elements,
        })
    }

    /// "Showing 41 to 80 of 95 results"
    pub fn showing_line(&self) -> String {
        format!(
            "Showing {} to {} of {} results",
            self.showing_from, self.showing_to, self.total_elements
        )
    }
}
