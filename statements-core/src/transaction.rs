//! Transaction and page envelope types returned by the statement backend.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One parsed statement row, as stored by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    /// Date string exactly as the backend returns it
    pub date: String,
    pub description: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub debit: Option<Decimal>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub credit: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    /// Content hash; stable key for list rendering
    pub txn_hash: String,
}

/// Spring-style pagination envelope.
///
/// The boundary flags (`first`, `last`, `empty`) come from the server and are
/// never recomputed client-side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub content: Vec<Transaction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pageable: Option<Pageable>,
    pub total_pages: u32,
    pub total_elements: u64,
    pub last: bool,
    pub size: u32,
    pub number: u32,
    #[serde(default)]
    pub number_of_elements: u32,
    pub first: bool,
    pub empty: bool,
}

/// The `pageable` block. Unpaged responses carry the bare string `"INSTANCE"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Pageable {
    Paged(PageRequestInfo),
    Unpaged(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageRequestInfo {
    pub page_number: u32,
    pub page_size: u32,
    #[serde(default)]
    pub sort: SortInfo,
    #[serde(default)]
    pub offset: u64,
    #[serde(default)]
    pub paged: bool,
    #[serde(default)]
    pub unpaged: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SortInfo {
    #[serde(default)]
    pub sorted: bool,
    #[serde(default)]
    pub unsorted: bool,
    #[serde(default)]
    pub empty: bool,
}

impl PageResponse {
    /// An empty first page, shaped the way the backend reports "no rows".
    pub fn empty(size: u32) -> Self {
        Self {
            content: Vec::new(),
            pageable: None,
            total_pages: 0,
            total_elements: 0,
            last: true,
            size,
            number: 0,
            number_of_elements: 0,
            first: true,
            empty: true,
        }
    }
}
