// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use std::collections::VecDeque;
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use toni_app::forms::{FieldKey, FormState};
use toni_app::prefs::UiPreferences;
use toni_app::repository::{RepoOutcome, RepoRequest};
use toni_app::search::SearchPhase;
use toni_app::table::{Column, TableRecord, TableState};
use toni_app::{
    AppCommand, AppEvent, AppMode, AppState, Detail, ListKind, Restaurant, Screen, Suggestion,
    format_date, format_rating,
};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(120);
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const TABS_HEIGHT: u16 = 3;
const STATUS_HEIGHT: u16 = 3;
// table borders plus the header row
const TABLE_CHROME: u16 = 3;
const SORT_ASC_MARK: &str = "↑";
const SORT_DESC_MARK: &str = "↓";
const FILTER_MARK: &str = "=";

/// Everything the event loop needs from the outside world.
///
/// `spawn_*` must deliver their result on `tx` as an [`InternalEvent`]. The
/// defaults run the blocking `run_*`/`lookup_*` call inline and send the
/// result, which is what tests want; the binary overrides them with worker
/// threads so the loop never blocks.
pub trait AppRuntime {
    fn run_request(&mut self, request: RepoRequest) -> Result<RepoOutcome>;
    fn lookup_suggestions(&mut self, query: &str) -> Result<Vec<Suggestion>>;
    fn save_preferences(&mut self, prefs: &UiPreferences) -> Result<()>;

    fn spawn_request(&mut self, request: RepoRequest, tx: Sender<InternalEvent>) -> Result<()> {
        let outcome = self.run_request(request)?;
        tx.send(InternalEvent::Repository(outcome))
            .map_err(|_| anyhow!("internal event channel closed"))?;
        Ok(())
    }

    fn spawn_lookup(
        &mut self,
        sequence: u64,
        query: &str,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .lookup_suggestions(query)
            .map_err(|error| format!("{error:#}"));
        tx.send(InternalEvent::Suggestions { sequence, result })
            .map_err(|_| anyhow!("internal event channel closed"))?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    Repository(RepoOutcome),
    DebounceFired {
        sequence: u64,
    },
    Suggestions {
        sequence: u64,
        result: Result<Vec<Suggestion>, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
struct ViewData {
    status_token: u64,
}

#[derive(Debug, Clone, PartialEq)]
enum KeyAction {
    Quit,
    Command(AppCommand),
    Ignore,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let result = match Terminal::new(backend).context("create terminal") {
        Ok(mut terminal) => event_loop(&mut terminal, state, runtime),
        Err(error) => Err(error),
    };

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<B: Backend, R: AppRuntime>(
    terminal: &mut Terminal<B>,
    state: &mut AppState,
    runtime: &mut R,
) -> Result<()> {
    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    let startup = state.start();
    apply_events(state, runtime, &mut view_data, &internal_tx, startup);

    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        let size = terminal.size().context("read terminal size")?;
        state.set_viewport_height(viewport_rows(size.height));
        terminal
            .draw(|frame| render(frame, state))
            .context("draw frame")?;

        if !event::poll(POLL_INTERVAL).context("poll event")? {
            continue;
        }
        match event::read().context("read event")? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                    return Ok(());
                }
            }
            Event::Resize(_, _) => {}
            _ => {}
        }
    }
}

fn viewport_rows(terminal_height: u16) -> usize {
    usize::from(terminal_height.saturating_sub(TABS_HEIGHT + STATUS_HEIGHT + TABLE_CHROME))
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        handle_internal_event(state, runtime, view_data, tx, event);
    }
}

fn handle_internal_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    event: InternalEvent,
) {
    let command = match event {
        InternalEvent::ClearStatus { token } if token == view_data.status_token => {
            AppCommand::ClearStatus
        }
        InternalEvent::ClearStatus { .. } => return,
        InternalEvent::Repository(outcome) => AppCommand::RepositoryCompleted(outcome),
        InternalEvent::DebounceFired { sequence } => AppCommand::DebounceFired { sequence },
        InternalEvent::Suggestions { sequence, result } => {
            AppCommand::SuggestionsLoaded { sequence, result }
        }
    };
    dispatch(state, runtime, view_data, tx, command);
}

fn dispatch<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    apply_events(state, runtime, view_data, tx, events);
}

/// Carries out the side effects `AppState` asked for. Work that cannot be
/// started is fed back as a failed outcome so the state machine settles.
fn apply_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    events: Vec<AppEvent>,
) {
    let mut queue = VecDeque::from(events);
    while let Some(event) = queue.pop_front() {
        match event {
            AppEvent::StatusUpdated(message) => {
                debug!(%message, "status");
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(tx, view_data.status_token);
            }
            AppEvent::StatusCleared => {}
            AppEvent::ScreenChanged(screen) => debug!(screen = screen.label(), "screen changed"),
            AppEvent::ModeChanged(mode) => debug!(?mode, "mode changed"),
            AppEvent::Request(request) => {
                debug!(?request, "repository request");
                if let Err(error) = runtime.spawn_request(request.clone(), tx.clone()) {
                    warn!(error = %format!("{error:#}"), "repository request not started");
                    let outcome = failed_outcome(&request, &error);
                    queue.extend(state.dispatch(AppCommand::RepositoryCompleted(outcome)));
                }
            }
            AppEvent::ScheduleDebounce { sequence, delay } => {
                schedule_debounce(tx, sequence, delay);
            }
            AppEvent::Lookup { sequence, query } => {
                if let Err(error) = runtime.spawn_lookup(sequence, &query, tx.clone()) {
                    queue.extend(state.dispatch(AppCommand::SuggestionsLoaded {
                        sequence,
                        result: Err(format!("{error:#}")),
                    }));
                }
            }
            AppEvent::PersistPreferences(prefs) => {
                if let Err(error) = runtime.save_preferences(&prefs) {
                    warn!(error = %format!("{error:#}"), "save preferences failed");
                }
            }
        }
    }
}

fn failed_outcome(request: &RepoRequest, error: &anyhow::Error) -> RepoOutcome {
    let error = format!("{error:#}");
    match request {
        RepoRequest::LoadList(list) => RepoOutcome::LoadFailed { list: *list, error },
        RepoRequest::LoadDetail { list, id } => RepoOutcome::DetailFailed {
            list: *list,
            id: *id,
            error,
        },
        RepoRequest::Mutate(_) => RepoOutcome::MutationFailed { error },
        RepoRequest::History { direction, .. } => RepoOutcome::HistoryFailed {
            direction: *direction,
            error,
        },
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

// Timers are never cancelled; the search session drops stale sequences.
fn schedule_debounce(internal_tx: &Sender<InternalEvent>, sequence: u64, delay: Duration) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::DebounceFired { sequence });
    });
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    match key_action(state, key) {
        KeyAction::Quit => true,
        KeyAction::Command(command) => {
            dispatch(state, runtime, view_data, internal_tx, command);
            false
        }
        KeyAction::Ignore => false,
    }
}

fn key_action(state: &AppState, key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    if ctrl && key.code == KeyCode::Char('c') {
        return KeyAction::Quit;
    }

    if state.help_visible() {
        return match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => {
                KeyAction::Command(AppCommand::ToggleHelp)
            }
            _ => KeyAction::Ignore,
        };
    }

    let command = match state.nav().mode() {
        AppMode::Insert => form_command(key.code, ctrl),
        AppMode::Nav => {
            if !ctrl && key.code == KeyCode::Char('q') {
                return KeyAction::Quit;
            }
            Some(nav_command(state, key.code, ctrl).unwrap_or(AppCommand::UnboundKey))
        }
    };
    command.map_or(KeyAction::Ignore, KeyAction::Command)
}

fn form_command(code: KeyCode, ctrl: bool) -> Option<AppCommand> {
    if ctrl {
        return match code {
            KeyCode::Char('s') => Some(AppCommand::FormSave),
            _ => None,
        };
    }
    match code {
        KeyCode::Esc => Some(AppCommand::FormEscape),
        KeyCode::Enter => Some(AppCommand::FormEnter),
        KeyCode::Tab => Some(AppCommand::FormNextField),
        KeyCode::BackTab => Some(AppCommand::FormPrevField),
        KeyCode::Up => Some(AppCommand::SuggestionMove(-1)),
        KeyCode::Down => Some(AppCommand::SuggestionMove(1)),
        KeyCode::Backspace => Some(AppCommand::FormBackspace),
        KeyCode::Char(ch) => Some(AppCommand::FormChar(ch)),
        _ => None,
    }
}

fn nav_command(state: &AppState, code: KeyCode, ctrl: bool) -> Option<AppCommand> {
    let nav = state.nav();
    if nav.column_jump_pending() {
        match code {
            KeyCode::Char(digit @ '1'..='9') => {
                return digit
                    .to_digit(10)
                    .map(|ordinal| AppCommand::JumpToColumn(ordinal as usize));
            }
            KeyCode::Esc => return Some(AppCommand::CancelColumnJump),
            _ => {}
        }
    }

    if ctrl {
        return match code {
            KeyCode::Char('d') => Some(AppCommand::HalfPageDown),
            KeyCode::Char('u') => Some(AppCommand::HalfPageUp),
            KeyCode::Char('r') => Some(AppCommand::Redo),
            _ => None,
        };
    }

    match code {
        KeyCode::Char('u') => return Some(AppCommand::Undo),
        KeyCode::Char('?') => return Some(AppCommand::ToggleHelp),
        _ => {}
    }

    match nav.screen() {
        Screen::List(_) => list_command(code),
        Screen::Detail(_) => detail_command(code),
        Screen::Form(_) => None,
    }
}

fn list_command(code: KeyCode) -> Option<AppCommand> {
    let command = match code {
        KeyCode::Char('j') | KeyCode::Down => AppCommand::MoveRows(1),
        KeyCode::Char('k') | KeyCode::Up => AppCommand::MoveRows(-1),
        KeyCode::Char('g') => AppCommand::PressG,
        KeyCode::Char('G') | KeyCode::End => AppCommand::JumpBottom,
        KeyCode::PageDown => AppCommand::HalfPageDown,
        KeyCode::PageUp => AppCommand::HalfPageUp,
        KeyCode::Char('b') | KeyCode::Left => AppCommand::PrevList,
        KeyCode::Char('f') | KeyCode::Right => AppCommand::NextList,
        KeyCode::Char('B') => AppCommand::FirstList,
        KeyCode::Char('F') => AppCommand::LastList,
        KeyCode::Tab => AppCommand::NextColumn,
        KeyCode::BackTab => AppCommand::PrevColumn,
        KeyCode::Char('s') => AppCommand::CycleSort,
        KeyCode::Char('c') => AppCommand::HideColumn,
        KeyCode::Char('C') => AppCommand::ShowAllColumns,
        KeyCode::Char('n') => AppCommand::CycleFilter,
        KeyCode::Char('N') => AppCommand::ClearFilter,
        KeyCode::Char('/') => AppCommand::BeginColumnJump,
        KeyCode::Enter | KeyCode::Char('l') => AppCommand::OpenDetail,
        KeyCode::Char('a') => AppCommand::Add,
        KeyCode::Char('v') => AppCommand::LogVisit,
        _ => return None,
    };
    Some(command)
}

fn detail_command(code: KeyCode) -> Option<AppCommand> {
    let command = match code {
        KeyCode::Char('h') | KeyCode::Esc | KeyCode::Left | KeyCode::Backspace => {
            AppCommand::Back
        }
        KeyCode::Char('e') => AppCommand::Edit,
        KeyCode::Char('d') => AppCommand::Delete,
        KeyCode::Char('v') => AppCommand::LogVisit,
        KeyCode::Char('c') => AppCommand::Convert,
        _ => return None,
    };
    Some(command)
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(TABS_HEIGHT),
            Constraint::Min(1),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .split(frame.area());

    let tab_titles = ListKind::ALL
        .iter()
        .map(|list| tab_title(state, *list))
        .collect::<Vec<String>>();
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("toni").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected_tab(state));
    frame.render_widget(tabs, layout[0]);

    match state.nav().screen() {
        Screen::List(list) => render_list(frame, layout[1], state, list),
        Screen::Detail(list) => {
            let body = Paragraph::new(detail_text(state.detail()))
                .wrap(Wrap { trim: false })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .title(Screen::Detail(list).label()),
                );
            frame.render_widget(body, layout[1]);
        }
        Screen::Form(kind) => {
            let (title, text) = state
                .form()
                .map(|form| (form.title(), form_text(form)))
                .unwrap_or_else(|| (kind.label().to_owned(), String::new()));
            let body = Paragraph::new(text)
                .wrap(Wrap { trim: false })
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(body, layout[1]);
        }
    }

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[2]);

    if state.help_visible() {
        let area = centered_rect(80, 70, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn tab_title(state: &AppState, list: ListKind) -> String {
    if !state.is_loaded(list) {
        return list.label().to_owned();
    }
    let count = match list {
        ListKind::Visits => state.visits().total_len(),
        ListKind::Restaurants => state.restaurants().total_len(),
        ListKind::WantToVisit => state.wishlist().total_len(),
    };
    format!("{} ({count})", list.label())
}

fn selected_tab(state: &AppState) -> usize {
    let current = state.nav().current_list();
    ListKind::ALL
        .iter()
        .position(|list| Some(*list) == current)
        .unwrap_or(0)
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, state: &AppState, list: ListKind) {
    let loaded = state.is_loaded(list);
    match list {
        ListKind::Visits => render_table(frame, area, list, state.visits(), loaded),
        ListKind::Restaurants => render_table(frame, area, list, state.restaurants(), loaded),
        ListKind::WantToVisit => render_table(frame, area, list, state.wishlist(), loaded),
    }
}

fn render_table<R: TableRecord>(
    frame: &mut ratatui::Frame<'_>,
    area: Rect,
    list: ListKind,
    table: &TableState<R>,
    loaded: bool,
) {
    let block = Block::default()
        .title(format!("{} · {}", list.label(), table.meta()))
        .borders(Borders::ALL);
    if !loaded || table.is_empty() {
        let empty = Paragraph::new(empty_table_text(list, table, loaded)).block(block);
        frame.render_widget(empty, area);
        return;
    }

    let columns = table.visible_columns().collect::<Vec<(usize, &Column)>>();
    let widths = columns
        .iter()
        .map(|(_, column)| Constraint::Length(column.width))
        .collect::<Vec<_>>();

    let header = Row::new(columns.iter().map(|(index, column)| {
        let mut style = Style::default()
            .fg(Color::White)
            .add_modifier(Modifier::BOLD);
        if *index == table.active_column() {
            style = style.fg(Color::Cyan);
        }
        Cell::from(header_label(table, column)).style(style)
    }));

    let rows = table.window().map(|(row_index, record)| {
        let selected_row = row_index == table.cursor();
        let cells = columns
            .iter()
            .map(|(index, column)| {
                let mut style = Style::default();
                if selected_row {
                    style = style.bg(Color::DarkGray);
                }
                if selected_row && *index == table.active_column() {
                    style = Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD);
                }
                Cell::from(record.display(column.key)).style(style)
            })
            .collect::<Vec<_>>();
        Row::new(cells)
    });

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(block);
    frame.render_widget(widget, area);
}

fn header_label<R: TableRecord>(table: &TableState<R>, column: &Column) -> String {
    let mut label = column.label.to_owned();
    if let Some((key, descending)) = table.sort()
        && key == column.key
    {
        label.push(' ');
        label.push_str(if descending {
            SORT_DESC_MARK
        } else {
            SORT_ASC_MARK
        });
    }
    if let Some((key, _)) = table.filter()
        && key == column.key
    {
        label.push(' ');
        label.push_str(FILTER_MARK);
    }
    label
}

fn empty_table_text<R: TableRecord>(list: ListKind, table: &TableState<R>, loaded: bool) -> String {
    if !loaded {
        return "loading...".to_owned();
    }
    if table.total_len() == 0 {
        return format!("no {} yet -- press a to add", list.label());
    }
    "no rows match the filter -- press N to clear".to_owned()
}

fn detail_text(detail: Option<&Detail>) -> String {
    let Some(detail) = detail else {
        return "loading...".to_owned();
    };

    let mut lines = Vec::new();
    match detail {
        Detail::Visit(detail) => {
            lines.push(format!("restaurant: {}", detail.restaurant.name));
            push_restaurant_lines(&mut lines, &detail.restaurant);
            lines.push(format!("date: {}", format_date(detail.visit.visited_on)));
            lines.push(format!(
                "rating: {}",
                or_dash(&format_rating(detail.visit.rating))
            ));
            lines.push(format!(
                "would return: {}",
                or_dash(yes_no(detail.visit.would_return))
            ));
            lines.push(format!("notes: {}", or_dash(&detail.visit.notes)));
            lines.push(String::new());
            lines.push("e edit | d delete | h back".to_owned());
        }
        Detail::Restaurant(detail) => {
            lines.push(format!("name: {}", detail.restaurant.name));
            push_restaurant_lines(&mut lines, &detail.restaurant);
            lines.push(String::new());
            lines.push(match detail.visits.len() {
                0 => "no visits yet".to_owned(),
                1 => "1 visit:".to_owned(),
                count => format!("{count} visits:"),
            });
            for visit in detail.visits.iter().rev() {
                lines.push(format!(
                    "  {}  {:>4}  {}",
                    format_date(visit.visited_on),
                    format_rating(visit.rating),
                    visit.notes
                ));
            }
            lines.push(String::new());
            lines.push("v log visit | e edit | d delete | h back".to_owned());
        }
        Detail::WantToVisit(detail) => {
            lines.push(format!("restaurant: {}", detail.restaurant.name));
            push_restaurant_lines(&mut lines, &detail.restaurant);
            let priority = detail
                .entry
                .priority
                .map(|priority| priority.to_string())
                .unwrap_or_default();
            lines.push(format!("priority: {}", or_dash(&priority)));
            lines.push(format!("notes: {}", or_dash(&detail.entry.notes)));
            lines.push(String::new());
            lines.push("c log visit | e edit | d delete | h back".to_owned());
        }
    }
    lines.join("\n")
}

fn push_restaurant_lines(lines: &mut Vec<String>, restaurant: &Restaurant) {
    let fields = [
        ("address", restaurant.address.as_str()),
        ("city", restaurant.city.as_str()),
        ("area", restaurant.neighborhood.as_str()),
        ("cuisine", restaurant.cuisine.as_str()),
        (
            "price",
            restaurant
                .price_range
                .map(|price| price.as_str())
                .unwrap_or_default(),
        ),
    ];
    for (label, value) in fields {
        if !value.is_empty() {
            lines.push(format!("{label}: {value}"));
        }
    }
}

fn or_dash(value: &str) -> &str {
    if value.is_empty() { "-" } else { value }
}

fn yes_no(value: Option<bool>) -> &'static str {
    match value {
        Some(true) => "yes",
        Some(false) => "no",
        None => "",
    }
}

fn form_text(form: &FormState) -> String {
    let mut lines = Vec::new();
    for (index, field) in form.fields().iter().enumerate() {
        let focused = index == form.focus();
        let marker = if focused { ">" } else { " " };
        let required = if field.key.required() { "*" } else { "" };
        let cursor = if focused && !field.read_only { "_" } else { "" };
        let locked = if field.read_only { " (locked)" } else { "" };
        lines.push(format!(
            "{marker} {}{required}: {}{cursor}{locked}",
            field.key.label(),
            field.value
        ));
        if focused && field.key == FieldKey::Restaurant {
            lines.extend(suggestion_lines(form));
        }
    }
    if !form.hint().is_empty() {
        lines.push(String::new());
        lines.push(format!("  {}", form.hint()));
    }
    lines.push(String::new());
    lines.push("enter save | ctrl+s save | tab/shift+tab field | esc cancel".to_owned());
    lines.join("\n")
}

fn suggestion_lines(form: &FormState) -> Vec<String> {
    let Some(search) = form.search() else {
        return Vec::new();
    };
    if matches!(search.phase(), SearchPhase::Pending(_)) {
        return vec!["    searching...".to_owned()];
    }
    if !search.dropdown_visible() {
        return Vec::new();
    }
    search
        .results()
        .iter()
        .enumerate()
        .map(|(index, suggestion)| {
            let marker = if index == search.cursor() { "›" } else { " " };
            format!("   {marker} {}", suggestion.summary())
        })
        .collect()
}

fn status_text(state: &AppState) -> String {
    let nav = state.nav();
    let mode = match nav.mode() {
        AppMode::Nav => "NAV",
        AppMode::Insert => "INSERT",
    };
    let hints = match nav.screen() {
        Screen::List(ListKind::Restaurants) => {
            "j/k gg/G b/f | s c/C n/N / | enter open | a add v visit | u ctrl+r | ? q"
        }
        Screen::List(_) => "j/k gg/G b/f | s c/C n/N / | enter open | a add | u ctrl+r | ? q",
        Screen::Detail(ListKind::WantToVisit) => "h back | e edit d delete c visit | u ctrl+r | ? q",
        Screen::Detail(ListKind::Restaurants) => "h back | e edit d delete v visit | u ctrl+r | ? q",
        Screen::Detail(_) => "h back | e edit d delete | u ctrl+r | ? q",
        Screen::Form(_) => "tab field | enter save | esc cancel",
    };

    let mut parts = vec![mode];
    if state.saving() {
        parts.push("saving...");
    }
    if let Some(status) = state.status_line() {
        parts.push(status);
    }
    parts.push(hints);
    parts.join(" | ")
}

fn help_overlay_text() -> &'static str {
    "global: ctrl+c quit | q quit (nav) | ? help | u undo | ctrl+r redo\n\
lists: j/k rows | gg/G top/bottom | ctrl+d/ctrl+u half page | b/f list | B/F first/last\n\
lists: tab/shift+tab column | s sort | c hide column | C show all | n/N filter/clear\n\
lists: / then 1-9 jump to column | enter/l open | a add | v log visit (restaurants)\n\
detail: h/esc back | e edit | d delete | v log visit | c log wishlist visit\n\
form: type to edit | tab/shift+tab field | up/down suggestion | enter pick/save\n\
form: ctrl+s save | esc close suggestions, then cancel"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
