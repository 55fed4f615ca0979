use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap},
    Frame, Terminal,
};
use statements_client::StatementsClient;
use statements_core::{
    FilterField, ListView, SortField, UploadState, ViewerState, EMPTY_LIST_MESSAGE,
};
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::mpsc::Receiver;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::fetch_worker::{run_worker, WorkerEvent, WorkerRequest};
use crate::list_cmd::{header_label, pager_line, row_cells, COLUMNS};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Mode {
    Browse,
    /// Editing the filter draft; `field` indexes `FilterField::ALL`
    Filters { field: usize, input: String },
    UploadPath { input: String },
}

struct App {
    viewer: ViewerState,
    mode: Mode,
    base_url: String,
    quit: bool,
}

impl App {
    fn new(viewer: ViewerState, base_url: String) -> Self {
        Self {
            viewer,
            mode: Mode::Browse,
            base_url,
            quit: false,
        }
    }

    /// Listing requests the viewer wants issued right now.
    fn pending_fetches(&mut self) -> Vec<WorkerRequest> {
        let mut out = Vec::new();
        while let Some(ticket) = self.viewer.poll_fetch() {
            out.push(WorkerRequest::Fetch(ticket));
        }
        out
    }

    fn on_event(&mut self, ev: WorkerEvent) {
        match ev {
            WorkerEvent::Fetched { seq, result } => {
                self.viewer.apply_fetch(seq, result);
            }
            WorkerEvent::UploadProgress(pct) => {
                self.viewer.upload_progress(pct);
            }
            WorkerEvent::Uploaded(Ok(message)) => {
                info!(%message, "upload succeeded");
                if let Err(e) = self.viewer.upload_succeeded(message) {
                    warn!("upload result ignored: {e}");
                }
            }
            WorkerEvent::Uploaded(Err(message)) => {
                self.viewer.upload_failed(message);
            }
        }
    }

    fn open_field(&mut self, field: usize) {
        let input = self.viewer.filters().draft().field_text(FilterField::ALL[field]);
        self.mode = Mode::Filters { field, input };
    }

    fn commit_field(&mut self) {
        if let Mode::Filters { field, input } = &self.mode {
            let (field, input) = (FilterField::ALL[*field], input.clone());
            self.viewer.edit_filter_text(field, &input);
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<WorkerRequest> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.quit = true;
            return None;
        }

        match self.mode.clone() {
            Mode::Browse => self.browse_key(key.code),
            Mode::Filters { field, mut input } => {
                let n = FilterField::ALL.len();
                match key.code {
                    KeyCode::Esc => {
                        self.viewer.discard_filter_draft();
                        self.mode = Mode::Browse;
                    }
                    KeyCode::Enter => {
                        self.commit_field();
                        self.viewer.apply_filters();
                        self.mode = Mode::Browse;
                    }
                    KeyCode::Tab | KeyCode::Down => {
                        self.commit_field();
                        self.open_field((field + 1) % n);
                    }
                    KeyCode::BackTab | KeyCode::Up => {
                        self.commit_field();
                        self.open_field((field + n - 1) % n);
                    }
                    KeyCode::Backspace => {
                        input.pop();
                        self.mode = Mode::Filters { field, input };
                    }
                    KeyCode::Char(c) => {
                        input.push(c);
                        self.mode = Mode::Filters { field, input };
                    }
                    _ => {}
                }
                None
            }
            Mode::UploadPath { mut input } => match key.code {
                KeyCode::Esc => {
                    self.mode = Mode::Browse;
                    None
                }
                KeyCode::Enter => {
                    let path = input.trim().to_string();
                    if path.is_empty() {
                        return None;
                    }
                    self.mode = Mode::Browse;
                    match self.viewer.upload_started() {
                        Ok(()) => Some(WorkerRequest::Upload {
                            path: PathBuf::from(path),
                        }),
                        Err(e) => {
                            warn!("upload not started: {e}");
                            None
                        }
                    }
                }
                KeyCode::Backspace => {
                    input.pop();
                    self.mode = Mode::UploadPath { input };
                    None
                }
                KeyCode::Char(c) => {
                    input.push(c);
                    self.mode = Mode::UploadPath { input };
                    None
                }
                _ => None,
            },
        }
    }

    fn browse_key(&mut self, code: KeyCode) -> Option<WorkerRequest> {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => self.quit = true,
            KeyCode::Char('n') | KeyCode::Right => {
                self.viewer.next_page();
            }
            KeyCode::Char('p') | KeyCode::Left => {
                self.viewer.previous_page();
            }
            KeyCode::Char(c @ '1'..='5') => {
                let idx = (c as usize) - ('1' as usize);
                self.viewer.sort_by(SortField::ALL[idx]);
            }
            KeyCode::Char('f') => self.open_field(0),
            KeyCode::Char('c') => self.viewer.clear_filters(),
            KeyCode::Char('r') if self.viewer.error().is_some() => {
                return Some(WorkerRequest::Fetch(self.viewer.retry()));
            }
            KeyCode::Char('u') if !self.viewer.upload().is_uploading() => {
                self.mode = Mode::UploadPath { input: String::new() };
            }
            KeyCode::Char('d') if !self.viewer.upload().is_uploading() => {
                self.viewer.reset_upload()
            }
            _ => {}
        }
        None
    }
}

pub fn run_browse(rt: Handle, client: StatementsClient, viewer: ViewerState) -> Result<()> {
    let (req_tx, req_rx) = mpsc::unbounded_channel();
    let (ev_tx, ev_rx) = std::sync::mpsc::channel();
    let base_url = client.base_url().to_string();
    rt.spawn(run_worker(client, req_rx, ev_tx));

    let mut app = App::new(viewer, base_url);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = browse_loop(&mut terminal, &mut app, &req_tx, &ev_rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn browse_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    req_tx: &mpsc::UnboundedSender<WorkerRequest>,
    ev_rx: &Receiver<WorkerEvent>,
) -> Result<()> {
    loop {
        for req in app.pending_fetches() {
            req_tx.send(req).context("background worker stopped")?;
        }
        while let Ok(ev) = ev_rx.try_recv() {
            app.on_event(ev);
        }

        terminal.draw(|f| draw(f, app))?;
        if app.quit {
            return Ok(());
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if let Some(req) = app.handle_key(key) {
                    req_tx.send(req).context("background worker stopped")?;
                }
            }
        }
    }
}

fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(f.area());

    f.render_widget(upload_panel(app), chunks[0]);
    f.render_widget(filter_panel(app), chunks[1]);
    match &app.mode {
        Mode::Filters { field, input } => {
            f.render_widget(filter_form(app, *field, input), chunks[2])
        }
        _ => draw_list(f, app, chunks[2]),
    }
    f.render_widget(pager_panel(app), chunks[3]);
    f.render_widget(
        Paragraph::new(help_line(&app.mode)).style(Style::default().fg(Color::DarkGray)),
        chunks[4],
    );
}

fn upload_panel(app: &App) -> Paragraph<'static> {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("statements · {}", app.base_url));

    let line = if let Mode::UploadPath { input } = &app.mode {
        Line::from(vec![
            Span::styled("PDF path: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{input}_")),
        ])
    } else {
        match app.viewer.upload() {
            UploadState::Idle => Line::from("Press u to upload a bank statement (PDF)"),
            UploadState::Uploading { progress } => Line::styled(
                match progress {
                    Some(p) => format!("Uploading... {p}%"),
                    None => "Uploading...".to_string(),
                },
                Style::default().fg(Color::Yellow),
            ),
            UploadState::Succeeded { message } => {
                Line::styled(message.clone(), Style::default().fg(Color::Green))
            }
            UploadState::Failed { message } => {
                Line::styled(message.clone(), Style::default().fg(Color::Red))
            }
        }
    };
    Paragraph::new(line).block(block)
}

fn filter_panel(app: &App) -> Paragraph<'static> {
    let chips = app.viewer.filters().active().summary();
    let text = if chips.is_empty() {
        "No filters (f to edit)".to_string()
    } else {
        chips.join("  |  ")
    };
    Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("filters"))
}

fn filter_form(app: &App, selected: usize, input: &str) -> Paragraph<'static> {
    let draft = app.viewer.filters().draft();
    let lines: Vec<Line> = FilterField::ALL
        .iter()
        .enumerate()
        .map(|(i, field)| {
            let label = format!("{:<20}", field.label());
            if i == selected {
                Line::from(vec![
                    Span::styled(
                        format!("> {label}"),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(format!("{input}_"), Style::default().fg(Color::Cyan)),
                ])
            } else {
                Line::from(format!("  {label}{}", draft.field_text(*field)))
            }
        })
        .collect();
    Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("edit filters"))
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let filters = app.viewer.filters().active();
    match app.viewer.list_view() {
        ListView::Loading => {
            f.render_widget(message_panel("Loading transactions...", Color::Gray), area);
        }
        ListView::Error { message } => {
            let text = format!("Failed to load transactions: {message}\n\nPress r to retry");
            f.render_widget(message_panel(&text, Color::Red), area);
        }
        ListView::Empty => {
            f.render_widget(message_panel(EMPTY_LIST_MESSAGE, Color::Gray), area);
        }
        ListView::Table {
            rows,
            stale_error,
            refreshing,
            ..
        } => {
            let mut title = "transactions".to_string();
            if refreshing {
                title.push_str(" (refreshing)");
            }
            if let Some(err) = stale_error {
                title.push_str(&format!(" ! {err} (r to retry)"));
            }

            let header = Row::new(
                COLUMNS
                    .iter()
                    .enumerate()
                    .map(|(i, (field, label))| {
                        Cell::from(format!("{} {}", i + 1, header_label(*field, label, filters)))
                    }),
            )
            .style(Style::default().add_modifier(Modifier::BOLD));

            let body = rows.iter().map(|t| {
                let [date, desc, debit, credit, balance] = row_cells(t);
                Row::new(vec![
                    Cell::from(date),
                    Cell::from(desc),
                    Cell::from(debit).style(Style::default().fg(Color::Red)),
                    Cell::from(credit).style(Style::default().fg(Color::Green)),
                    Cell::from(balance),
                ])
            });

            let widths = [
                Constraint::Length(14),
                Constraint::Min(20),
                Constraint::Length(14),
                Constraint::Length(14),
                Constraint::Length(14),
            ];
            let table = Table::new(body, widths)
                .header(header)
                .block(Block::default().borders(Borders::ALL).title(title));
            f.render_widget(table, area);
        }
    }
}

fn message_panel(text: &str, color: Color) -> Paragraph<'static> {
    Paragraph::new(text.to_string())
        .style(Style::default().fg(color))
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("transactions"))
}

fn pager_panel(app: &App) -> Paragraph<'static> {
    let lines = match app.viewer.pagination() {
        Some(p) => vec![Line::from(p.showing_line()), Line::from(pager_line(&p))],
        None => Vec::new(),
    };
    Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::TOP))
}

const BROWSE_HELP: &str =
    "n/p page · 1-5 sort · f filters · c clear · r retry · u upload · d dismiss · q quit";

fn help_line(mode: &Mode) -> &'static str {
    match mode {
        Mode::Browse => BROWSE_HELP,
        Mode::Filters { .. } => "Tab/Shift-Tab move · Enter apply · Esc cancel",
        Mode::UploadPath { .. } => "Enter upload · Esc cancel",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use statements_core::{
        PageResponse, ResponseOrdering, SortDirection, Transaction, TransactionFilters,
    };

    fn app() -> App {
        App::new(ViewerState::default(), "http://localhost:8080".into())
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn typed(app: &mut App, text: &str) {
        for c in text.chars() {
            assert!(app.handle_key(key(KeyCode::Char(c))).is_none());
        }
    }

    fn fetch_seqs(reqs: Vec<WorkerRequest>) -> Vec<u64> {
        reqs.into_iter()
            .map(|r| match r {
                WorkerRequest::Fetch(t) => t.seq,
                other => panic!("unexpected request {other:?}"),
            })
            .collect()
    }

    fn page_of(n: usize, number: u32, total_pages: u32) -> PageResponse {
        let mut p = PageResponse::empty(40);
        p.content = (0..n)
            .map(|i| Transaction {
                id: i as i64,
                date: "2024-01-01".into(),
                description: format!("row {i}"),
                debit: None,
                credit: None,
                balance: Default::default(),
                txn_hash: format!("h{i}"),
            })
            .collect();
        p.number = number;
        p.total_pages = total_pages;
        p.total_elements = u64::from(total_pages) * 40;
        p.first = number == 0;
        p.last = number + 1 >= total_pages;
        p.empty = n == 0;
        p
    }

    #[test]
    fn test_initial_fetch_issued_once() {
        let mut app = app();
        assert_eq!(fetch_seqs(app.pending_fetches()), vec![1]);
        assert!(app.pending_fetches().is_empty());
    }

    #[test]
    fn test_sort_key_refetches_ascending() {
        let mut app = app();
        app.pending_fetches();
        app.handle_key(key(KeyCode::Char('3')));
        let f = app.viewer.filters().active();
        assert_eq!((f.sort_by, f.sort_dir), (SortField::Debit, SortDirection::Asc));
        assert_eq!(app.pending_fetches().len(), 1);
    }

    #[test]
    fn test_filter_form_applies_on_enter() {
        let mut app = app();
        app.pending_fetches();

        app.handle_key(key(KeyCode::Char('f')));
        app.handle_key(key(KeyCode::Tab));
        app.handle_key(key(KeyCode::Tab));
        typed(&mut app, "rent");
        // typing alone sends nothing
        assert!(app.pending_fetches().is_empty());

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.mode, Mode::Browse);
        assert_eq!(app.viewer.filters().active().keyword.as_deref(), Some("rent"));

        let reqs = app.pending_fetches();
        match &reqs[..] {
            [WorkerRequest::Fetch(t)] => assert_eq!(t.filters.keyword.as_deref(), Some("rent")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_filter_form_escape_discards() {
        let mut app = app();
        app.pending_fetches();

        app.handle_key(key(KeyCode::Char('f')));
        typed(&mut app, "2024-01-01");
        app.handle_key(key(KeyCode::Tab));
        assert_eq!(app.viewer.filters().draft().from_date.as_deref(), Some("2024-01-01"));

        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.viewer.filters().draft(), &TransactionFilters::default());
        assert!(app.pending_fetches().is_empty());
    }

    #[test]
    fn test_paging_keys_follow_server_flags() {
        let mut app = app();
        let seq = fetch_seqs(app.pending_fetches())[0];
        app.on_event(WorkerEvent::Fetched {
            seq,
            result: Ok(page_of(3, 0, 2)),
        });

        app.handle_key(key(KeyCode::Char('p')));
        assert!(app.pending_fetches().is_empty());

        app.handle_key(key(KeyCode::Char('n')));
        assert_eq!(app.viewer.filters().active().page, 1);
        assert_eq!(app.pending_fetches().len(), 1);
    }

    #[test]
    fn test_stale_fetch_event_ignored() {
        let mut app = App::new(
            ViewerState::new(TransactionFilters::default(), ResponseOrdering::LatestIssued),
            String::new(),
        );
        let first = fetch_seqs(app.pending_fetches())[0];
        app.handle_key(key(KeyCode::Char('2')));
        let second = fetch_seqs(app.pending_fetches())[0];

        app.on_event(WorkerEvent::Fetched {
            seq: second,
            result: Ok(page_of(1, 0, 1)),
        });
        app.on_event(WorkerEvent::Fetched {
            seq: first,
            result: Ok(page_of(5, 0, 1)),
        });
        assert_eq!(app.viewer.page().unwrap().content.len(), 1);
    }

    #[test]
    fn test_retry_only_after_error() {
        let mut app = app();
        let seq = fetch_seqs(app.pending_fetches())[0];
        assert!(app.handle_key(key(KeyCode::Char('r'))).is_none());

        app.on_event(WorkerEvent::Fetched {
            seq,
            result: Err("connection refused".into()),
        });
        assert!(matches!(app.viewer.list_view(), ListView::Error { .. }));
        assert!(matches!(
            app.handle_key(key(KeyCode::Char('r'))),
            Some(WorkerRequest::Fetch(_))
        ));
    }

    #[test]
    fn test_upload_flow_refetches_on_success() {
        let mut app = app();
        app.pending_fetches();

        app.handle_key(key(KeyCode::Char('u')));
        typed(&mut app, "march.pdf");
        let req = app.handle_key(key(KeyCode::Enter));
        assert!(matches!(
            req,
            Some(WorkerRequest::Upload { ref path }) if path == &PathBuf::from("march.pdf")
        ));
        assert!(app.viewer.upload().is_uploading());

        // no second upload while one is running
        app.handle_key(key(KeyCode::Char('u')));
        assert_eq!(app.mode, Mode::Browse);

        app.on_event(WorkerEvent::UploadProgress(40));
        assert_eq!(app.viewer.upload().progress(), Some(40));

        app.on_event(WorkerEvent::Uploaded(Ok("Imported 3 rows".into())));
        assert_eq!(app.viewer.upload().success_message(), Some("Imported 3 rows"));
        assert_eq!(app.pending_fetches().len(), 1);
    }

    #[test]
    fn test_upload_failure_keeps_list() {
        let mut app = app();
        app.pending_fetches();

        app.handle_key(key(KeyCode::Char('u')));
        typed(&mut app, "notes.txt");
        app.handle_key(key(KeyCode::Enter));
        app.on_event(WorkerEvent::Uploaded(Err("Please select a PDF file".into())));

        assert_eq!(app.viewer.upload().error_message(), Some("Please select a PDF file"));
        assert!(app.pending_fetches().is_empty());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.quit);

        let mut app = self::app();
        app.handle_key(key(KeyCode::Char('q')));
        assert!(app.quit);
    }
}
