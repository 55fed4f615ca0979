//! Filter state for the transaction listing.
//!
//! `TransactionFilters` is the value sent to the backend; `FilterStateManager`
//! keeps the applied filters next to a locally edited draft.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Page size used on first load
pub const DEFAULT_PAGE_SIZE: u32 = 40;
/// Page size used after "clear all"
pub const CLEARED_PAGE_SIZE: u32 = 10;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseFilterError {
    #[error("unknown sort field '{0}' (expected date, description, debit, credit or balance)")]
    SortField(String),
    #[error("unknown sort direction '{0}' (expected asc or desc)")]
    SortDirection(String),
}

/// Column the backend sorts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Date,
    Description,
    Debit,
    Credit,
    Balance,
}

impl SortField {
    pub const ALL: [SortField; 5] = [
        SortField::Date,
        SortField::Description,
        SortField::Debit,
        SortField::Credit,
        SortField::Balance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::Date => "date",
            SortField::Description => "description",
            SortField::Debit => "debit",
            SortField::Credit => "credit",
            SortField::Balance => "balance",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortField::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseFilterError::SortField(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }

    /// Arrow shown next to the sorted column header
    pub fn arrow(&self) -> &'static str {
        match self {
            SortDirection::Asc => "↑",
            SortDirection::Desc => "↓",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortDirection {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(ParseFilterError::SortDirection(s.to_string())),
        }
    }
}

/// Query constraints plus pagination/sort for the transaction listing.
///
/// Date and amount bounds are passed through unvalidated; an inverted range
/// is the backend's problem.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransactionFilters {
    pub page: u32,
    pub size: u32,
    pub sort_by: SortField,
    pub sort_dir: SortDirection,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub keyword: Option<String>,
    pub min_debit: Option<Decimal>,
    pub max_debit: Option<Decimal>,
    pub min_credit: Option<Decimal>,
    pub max_credit: Option<Decimal>,
    pub min_balance: Option<Decimal>,
    pub max_balance: Option<Decimal>,
}

impl Default for TransactionFilters {
    fn default() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }
}

/// A single-field change to a filter state.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEdit {
    Page(u32),
    Size(u32),
    SortBy(SortField),
    SortDir(SortDirection),
    FromDate(Option<String>),
    ToDate(Option<String>),
    Keyword(Option<String>),
    MinDebit(Option<Decimal>),
    MaxDebit(Option<Decimal>),
    MinCredit(Option<Decimal>),
    MaxCredit(Option<Decimal>),
    MinBalance(Option<Decimal>),
    MaxBalance(Option<Decimal>),
}

/// Free-text fields of the filter form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterField {
    FromDate,
    ToDate,
    Keyword,
    MinDebit,
    MaxDebit,
    MinCredit,
    MaxCredit,
    MinBalance,
    MaxBalance,
}

impl FilterField {
    pub const ALL: [FilterField; 9] = [
        FilterField::FromDate,
        FilterField::ToDate,
        FilterField::Keyword,
        FilterField::MinDebit,
        FilterField::MaxDebit,
        FilterField::MinCredit,
        FilterField::MaxCredit,
        FilterField::MinBalance,
        FilterField::MaxBalance,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            FilterField::FromDate => "From Date",
            FilterField::ToDate => "To Date",
            FilterField::Keyword => "Search Description",
            FilterField::MinDebit => "Min Debit",
            FilterField::MaxDebit => "Max Debit",
            FilterField::MinCredit => "Min Credit",
            FilterField::MaxCredit => "Max Credit",
            FilterField::MinBalance => "Min Balance",
            FilterField::MaxBalance => "Max Balance",
        }
    }

    /// Coerce raw form text into an edit for this field.
    ///
    /// Empty text clears the field. Amount text that does not parse as a
    /// decimal also clears it.
    pub fn coerce(&self, text: &str) -> FilterEdit {
        let text_value = || (!text.is_empty()).then(|| text.to_string());
        let amount = || coerce_amount(text);
        match self {
            FilterField::FromDate => FilterEdit::FromDate(text_value()),
            FilterField::ToDate => FilterEdit::ToDate(text_value()),
            FilterField::Keyword => FilterEdit::Keyword(text_value()),
            FilterField::MinDebit => FilterEdit::MinDebit(amount()),
            FilterField::MaxDebit => FilterEdit::MaxDebit(amount()),
            FilterField::MinCredit => FilterEdit::MinCredit(amount()),
            FilterField::MaxCredit => FilterEdit::MaxCredit(amount()),
            FilterField::MinBalance => FilterEdit::MinBalance(amount()),
            FilterField::MaxBalance => FilterEdit::MaxBalance(amount()),
        }
    }
}

/// Parse a numeric form input. Blank or unparseable text yields `None`.
pub fn coerce_amount(text: &str) -> Option<Decimal> {
    let t = text.trim();
    if t.is_empty() {
        return None;
    }
    Decimal::from_str(t).ok()
}

/// Render a date for a `YYYY-MM-DD` input: `DD-MM-YYYY` is reordered,
/// anything else is returned as-is.
pub fn normalize_date_input(date: &str) -> String {
    let parts: Vec<&str> = date.split('-').collect();
    if parts.len() != 3 || parts[0].len() == 4 {
        return date.to_string();
    }
    format!("{}-{:0>2}-{:0>2}", parts[2], parts[1], parts[0])
}

impl TransactionFilters {
    pub fn with_page_size(size: u32) -> Self {
        Self {
            page: 0,
            size,
            sort_by: SortField::Date,
            sort_dir: SortDirection::Desc,
            from_date: None,
            to_date: None,
            keyword: None,
            min_debit: None,
            max_debit: None,
            min_credit: None,
            max_credit: None,
            min_balance: None,
            max_balance: None,
        }
    }

    /// The state "clear all" resets to
    pub fn cleared() -> Self {
        Self::with_page_size(CLEARED_PAGE_SIZE)
    }

    /// Apply one edit. Any edit other than `Page` sends the page back to 0.
    pub fn edited(&self, edit: FilterEdit) -> Self {
        let mut next = self.clone();
        let resets_page = !matches!(edit, FilterEdit::Page(_));
        match edit {
            FilterEdit::Page(p) => next.page = p,
            FilterEdit::Size(s) => next.size = s,
            FilterEdit::SortBy(f) => next.sort_by = f,
            FilterEdit::SortDir(d) => next.sort_dir = d,
            FilterEdit::FromDate(v) => next.from_date = v,
            FilterEdit::ToDate(v) => next.to_date = v,
            FilterEdit::Keyword(v) => next.keyword = v,
            FilterEdit::MinDebit(v) => next.min_debit = v,
            FilterEdit::MaxDebit(v) => next.max_debit = v,
            FilterEdit::MinCredit(v) => next.min_credit = v,
            FilterEdit::MaxCredit(v) => next.max_credit = v,
            FilterEdit::MinBalance(v) => next.min_balance = v,
            FilterEdit::MaxBalance(v) => next.max_balance = v,
        }
        if resets_page {
            next.page = 0;
        }
        next
    }

    /// Column-header sort: a repeated click on an ascending column flips to
    /// descending, everything else sorts ascending.
    pub fn sorted_by(&self, field: SortField) -> Self {
        let dir = if self.sort_by == field && self.sort_dir == SortDirection::Asc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        let mut next = self.clone();
        next.sort_by = field;
        next.sort_dir = dir;
        next.page = 0;
        next
    }

    /// Query parameters in wire order. Unset and empty-string fields are omitted.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
            ("sortBy", self.sort_by.to_string()),
            ("sortDir", self.sort_dir.to_string()),
        ];

        for (name, value) in [
            ("fromDate", &self.from_date),
            ("toDate", &self.to_date),
            ("keyword", &self.keyword),
        ] {
            if let Some(v) = value.as_deref().filter(|v| !v.is_empty()) {
                pairs.push((name, v.to_string()));
            }
        }

        for (name, value) in [
            ("minDebit", self.min_debit),
            ("maxDebit", self.max_debit),
            ("minCredit", self.min_credit),
            ("maxCredit", self.max_credit),
            ("minBalance", self.min_balance),
            ("maxBalance", self.max_balance),
        ] {
            if let Some(v) = value {
                pairs.push((name, v.to_string()));
            }
        }

        pairs
    }

    /// Current text of a form field, for pre-filling inputs
    pub fn field_text(&self, field: FilterField) -> String {
        let amount = |v: Option<Decimal>| v.map(|d| d.to_string()).unwrap_or_default();
        let date = |v: &Option<String>| v.as_deref().map(normalize_date_input).unwrap_or_default();
        match field {
            FilterField::FromDate => date(&self.from_date),
            FilterField::ToDate => date(&self.to_date),
            FilterField::Keyword => self.keyword.clone().unwrap_or_default(),
            FilterField::MinDebit => amount(self.min_debit),
            FilterField::MaxDebit => amount(self.max_debit),
            FilterField::MinCredit => amount(self.min_credit),
            FilterField::MaxCredit => amount(self.max_credit),
            FilterField::MinBalance => amount(self.min_balance),
            FilterField::MaxBalance => amount(self.max_balance),
        }
    }

    pub fn has_amount_filters(&self) -> bool {
        [
            self.min_debit,
            self.max_debit,
            self.min_credit,
            self.max_credit,
            self.min_balance,
            self.max_balance,
        ]
        .iter()
        .any(Option::is_some)
    }

    /// Short labels describing the active constraints (collapsed filter panel)
    pub fn summary(&self) -> Vec<String> {
        let mut chips = Vec::new();
        if let Some(d) = self.from_date.as_deref().filter(|d| !d.is_empty()) {
            chips.push(format!("From: {d}"));
        }
        if let Some(d) = self.to_date.as_deref().filter(|d| !d.is_empty()) {
            chips.push(format!("To: {d}"));
        }
        if let Some(k) = self.keyword.as_deref().filter(|k| !k.is_empty()) {
            chips.push(format!("Search: {k}"));
        }
        if self.has_amount_filters() {
            chips.push("Amount filters active".to_string());
        }
        chips
    }
}

/// Applied filters plus the draft being edited in the filter form.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterStateManager {
    active: TransactionFilters,
    draft: TransactionFilters,
}

impl Default for FilterStateManager {
    fn default() -> Self {
        Self::new(TransactionFilters::default())
    }
}

impl FilterStateManager {
    pub fn new(initial: TransactionFilters) -> Self {
        Self {
            draft: initial.clone(),
            active: initial,
        }
    }

    pub fn active(&self) -> &TransactionFilters {
        &self.active
    }

    pub fn draft(&self) -> &TransactionFilters {
        &self.draft
    }

    /// Edit the draft. Nothing is sent until `apply`.
    pub fn edit(&mut self, edit: FilterEdit) {
        self.draft = self.draft.edited(edit);
    }

    pub fn edit_text(&mut self, field: FilterField, text: &str) {
        self.edit(field.coerce(text));
    }

    /// Commit the draft as the active filter.
    pub fn apply(&mut self) -> &TransactionFilters {
        self.active = self.draft.clone();
        &self.active
    }

    /// Reset draft and active filters to the cleared default.
    pub fn clear(&mut self) -> &TransactionFilters {
        self.draft = TransactionFilters::cleared();
        self.active = self.draft.clone();
        &self.active
    }

    /// Drop uncommitted draft edits.
    pub fn discard_draft(&mut self) {
        self.draft = self.active.clone();
    }

    /// Pagination moves only the active page.
    pub fn go_to_page(&mut self, page: u32) -> &TransactionFilters {
        self.active = self.active.edited(FilterEdit::Page(page));
        &self.active
    }

    /// Column sort on the active filters, mirrored into the draft so a later
    /// apply keeps it.
    pub fn sort_by(&mut self, field: SortField) -> &TransactionFilters {
        self.active = self.active.sorted_by(field);
        self.draft.sort_by = self.active.sort_by;
        self.draft.sort_dir = self.active.sort_dir;
        self.draft.page = 0;
        &self.active
    }
}
