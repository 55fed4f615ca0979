use anyhow::{bail, Context, Result};
use clap::Args;
use rust_decimal::Decimal;
use statements_client::StatementsClient;
use statements_core::{
    format_currency, format_date, FilterEdit, ListView, PageResponse, PaginationView,
    ResponseOrdering, SortDirection, SortField, Transaction, TransactionFilters, ViewerState,
    EMPTY_LIST_MESSAGE,
};
use tracing::debug;

#[derive(Args, Debug, Default, Clone)]
pub struct ListArgs {
    /// Zero-based page number
    #[arg(long)]
    pub page: Option<u32>,
    /// Rows per page (defaults to viewer.page_size)
    #[arg(long)]
    pub size: Option<u32>,
    /// date | description | debit | credit | balance
    #[arg(long)]
    pub sort_by: Option<SortField>,
    /// asc | desc
    #[arg(long)]
    pub sort_dir: Option<SortDirection>,
    /// Earliest date, YYYY-MM-DD
    #[arg(long)]
    pub from: Option<String>,
    /// Latest date, YYYY-MM-DD
    #[arg(long)]
    pub to: Option<String>,
    /// Description search
    #[arg(long)]
    pub keyword: Option<String>,
    #[arg(long)]
    pub min_debit: Option<Decimal>,
    #[arg(long)]
    pub max_debit: Option<Decimal>,
    #[arg(long)]
    pub min_credit: Option<Decimal>,
    #[arg(long)]
    pub max_credit: Option<Decimal>,
    #[arg(long)]
    pub min_balance: Option<Decimal>,
    #[arg(long)]
    pub max_balance: Option<Decimal>,
    /// Print the raw page envelope as JSON
    #[arg(long)]
    pub json: bool,
}

impl ListArgs {
    pub fn to_filters(&self, default_size: u32) -> TransactionFilters {
        let mut f = TransactionFilters::with_page_size(self.size.unwrap_or(default_size));
        let edits = [
            self.sort_by.map(FilterEdit::SortBy),
            self.sort_dir.map(FilterEdit::SortDir),
            self.from.clone().map(|d| FilterEdit::FromDate(Some(d))),
            self.to.clone().map(|d| FilterEdit::ToDate(Some(d))),
            self.keyword.clone().map(|k| FilterEdit::Keyword(Some(k))),
            self.min_debit.map(|v| FilterEdit::MinDebit(Some(v))),
            self.max_debit.map(|v| FilterEdit::MaxDebit(Some(v))),
            self.min_credit.map(|v| FilterEdit::MinCredit(Some(v))),
            self.max_credit.map(|v| FilterEdit::MaxCredit(Some(v))),
            self.min_balance.map(|v| FilterEdit::MinBalance(Some(v))),
            self.max_balance.map(|v| FilterEdit::MaxBalance(Some(v))),
            // last, every other edit resets the page
            self.page.map(FilterEdit::Page),
        ];
        for edit in edits.into_iter().flatten() {
            f = f.edited(edit);
        }
        f
    }
}

pub async fn run_list(
    client: &StatementsClient,
    args: &ListArgs,
    default_size: u32,
) -> Result<()> {
    let filters = args.to_filters(default_size);

    if args.json {
        let page = client
            .get_transactions(&filters)
            .await
            .context("fetch transactions")?;
        println!("{}", page_json(&page)?);
        return Ok(());
    }

    let mut viewer = ViewerState::new(filters, ResponseOrdering::LatestIssued);
    let Some(ticket) = viewer.poll_fetch() else {
        bail!("no listing request was issued");
    };
    debug!(seq = ticket.seq, "list fetch");
    let result = client
        .get_transactions(&ticket.filters)
        .await
        .map_err(|e| e.to_string());
    viewer.apply_fetch(ticket.seq, result);

    if let ListView::Error { message } = viewer.list_view() {
        bail!("Failed to load transactions: {message}");
    }
    print!("{}", render_list(&viewer));
    Ok(())
}

/// The page envelope as pretty JSON, amounts as numbers.
pub fn page_json(page: &PageResponse) -> Result<String> {
    serde_json::to_string_pretty(page).context("serialize page")
}

pub const COLUMNS: [(SortField, &str); 5] = [
    (SortField::Date, "Date"),
    (SortField::Description, "Description"),
    (SortField::Debit, "Debit"),
    (SortField::Credit, "Credit"),
    (SortField::Balance, "Balance"),
];

/// Column header with the sort arrow on the active column.
pub fn header_label(field: SortField, label: &str, filters: &TransactionFilters) -> String {
    if filters.sort_by == field {
        format!("{label} {}", filters.sort_dir.arrow())
    } else {
        label.to_string()
    }
}

/// Cells of one table row, already formatted for display.
pub fn row_cells(t: &Transaction) -> [String; 5] {
    [
        format_date(&t.date),
        t.description.clone(),
        format_currency(t.debit),
        format_currency(t.credit),
        format_currency(Some(t.balance)),
    ]
}

/// "‹ 1 [2] 3 4 5 ›"
pub fn pager_line(p: &PaginationView) -> String {
    let mut out = String::new();
    out.push_str(if p.previous.is_some() { "‹ " } else { "  " });
    let pages: Vec<String> = p
        .window
        .iter()
        .map(|n| {
            if *n == p.current {
                format!("[{}]", n + 1)
            } else {
                (n + 1).to_string()
            }
        })
        .collect();
    out.push_str(&pages.join(" "));
    if p.next.is_some() {
        out.push_str(" ›");
    }
    out
}

/// Plain-text rendering of the list view for the `list` command.
pub fn render_list(viewer: &ViewerState) -> String {
    let filters = viewer.filters().active();
    let mut out = String::new();

    let chips = filters.summary();
    if !chips.is_empty() {
        out.push_str(&format!("Filters: {}\n\n", chips.join(" | ")));
    }

    match viewer.list_view() {
        ListView::Loading => out.push_str("Loading...\n"),
        ListView::Error { message } => {
            out.push_str(&format!("Failed to load transactions: {message}\n"))
        }
        ListView::Empty => out.push_str(&format!("{EMPTY_LIST_MESSAGE}\n")),
        ListView::Table {
            rows,
            pagination,
            stale_error,
            ..
        } => {
            if let Some(err) = stale_error {
                out.push_str(&format!("! {err}\n"));
            }

            let headers: Vec<String> = COLUMNS
                .iter()
                .map(|(field, label)| header_label(*field, label, filters))
                .collect();
            let cells: Vec<[String; 5]> = rows.iter().map(row_cells).collect();

            let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
            for row in &cells {
                for (w, c) in widths.iter_mut().zip(row.iter()) {
                    *w = (*w).max(c.chars().count());
                }
            }

            let line = |cols: &[String]| -> String {
                cols.iter()
                    .zip(&widths)
                    .enumerate()
                    .map(|(i, (c, &w))| {
                        // amounts right-aligned
                        if i >= 2 {
                            format!("{c:>w$}")
                        } else {
                            format!("{c:<w$}")
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("  ")
                    .trim_end()
                    .to_string()
            };

            out.push_str(&line(&headers));
            out.push('\n');
            for row in &cells {
                out.push_str(&line(row));
                out.push('\n');
            }

            if let Some(p) = pagination {
                out.push('\n');
                out.push_str(&p.showing_line());
                out.push('\n');
                out.push_str(&pager_line(&p));
                out.push('\n');
            }
        }
    }
    out
}
