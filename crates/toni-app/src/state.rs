// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use std::collections::BTreeSet;
use std::time::Duration;

use time::Date;
use tracing::debug;

use crate::forms::{FormState, restaurant_hint};
use crate::ids::{RestaurantId, VisitId, WantToVisitId};
use crate::model::{
    AppMode, Detail, FormKind, ListKind, RestaurantRow, Screen, Suggestion, VisitRow,
    WantToVisitRow,
};
use crate::nav::NavigationState;
use crate::prefs::UiPreferences;
use crate::repository::{Focus, ListData, Mutation, RepoOutcome, RepoRequest};
use crate::search::{DEFAULT_DEBOUNCE, LookupOutcome};
use crate::table::{TableState, TableStatus};
use crate::undo::{HistoryDirection, HistoryStart, UndoRedoLog};

/// Applies `$body` to the table backing `$list`, whatever its record type.
macro_rules! with_table {
    ($state:expr, $list:expr, |$table:ident| $body:expr) => {
        match $list {
            ListKind::Visits => {
                let $table = &mut $state.visits;
                $body
            }
            ListKind::Restaurants => {
                let $table = &mut $state.restaurants;
                $body
            }
            ListKind::WantToVisit => {
                let $table = &mut $state.wishlist;
                $body
            }
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub suggestions_enabled: bool,
    /// Rows moved by a half-page jump; `None` means half the viewport.
    pub half_page: Option<usize>,
    pub debounce: Duration,
    pub today: Date,
}

impl Settings {
    pub fn new(today: Date) -> Self {
        Self {
            suggestions_enabled: false,
            half_page: None,
            debounce: DEFAULT_DEBOUNCE,
            today,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    NextList,
    PrevList,
    FirstList,
    LastList,
    MoveRows(isize),
    PressG,
    JumpBottom,
    HalfPageDown,
    HalfPageUp,
    NextColumn,
    PrevColumn,
    CycleSort,
    HideColumn,
    ShowAllColumns,
    CycleFilter,
    ClearFilter,
    BeginColumnJump,
    JumpToColumn(usize),
    CancelColumnJump,
    OpenDetail,
    Back,
    Add,
    Edit,
    Delete,
    LogVisit,
    Convert,
    Undo,
    Redo,
    ToggleHelp,
    /// A key with no binding on the current screen. It still breaks a
    /// pending `gg` or column jump.
    UnboundKey,
    FormChar(char),
    FormBackspace,
    FormNextField,
    FormPrevField,
    SuggestionMove(isize),
    FormEnter,
    FormSave,
    FormEscape,
    RepositoryCompleted(RepoOutcome),
    DebounceFired { sequence: u64 },
    SuggestionsLoaded {
        sequence: u64,
        result: Result<Vec<Suggestion>, String>,
    },
    ClearStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    ScreenChanged(Screen),
    ModeChanged(AppMode),
    StatusUpdated(String),
    StatusCleared,
    Request(RepoRequest),
    ScheduleDebounce { sequence: u64, delay: Duration },
    Lookup { sequence: u64, query: String },
    PersistPreferences(UiPreferences),
}

/// The single owner of session state. Every input, including completed
/// background work, goes through `dispatch`, one at a time.
#[derive(Debug, Clone)]
pub struct AppState {
    nav: NavigationState,
    visits: TableState<VisitRow>,
    restaurants: TableState<RestaurantRow>,
    wishlist: TableState<WantToVisitRow>,
    loaded: BTreeSet<ListKind>,
    history: UndoRedoLog,
    form: Option<FormState>,
    saving: bool,
    converting: bool,
    detail: Option<Detail>,
    detail_target: Option<(ListKind, i64)>,
    detail_refresh: bool,
    pending_focus: Option<Focus>,
    mutations_in_flight: usize,
    search_floor: u64,
    status_line: Option<String>,
    help_visible: bool,
    prefs: UiPreferences,
    settings: Settings,
}

impl AppState {
    pub fn new(settings: Settings, prefs: UiPreferences) -> Self {
        let mut state = Self {
            nav: NavigationState::default(),
            visits: TableState::new(Vec::new()),
            restaurants: TableState::new(Vec::new()),
            wishlist: TableState::new(Vec::new()),
            loaded: BTreeSet::new(),
            history: UndoRedoLog::default(),
            form: None,
            saving: false,
            converting: false,
            detail: None,
            detail_target: None,
            detail_refresh: false,
            pending_focus: None,
            mutations_in_flight: 0,
            search_floor: 0,
            status_line: None,
            help_visible: false,
            prefs,
            settings,
        };
        for list in ListKind::ALL {
            let prefs = state.prefs.table(list).clone();
            with_table!(state, list, |table| table.apply_prefs(&prefs));
        }
        state
    }

    /// Requests the first load of every list.
    pub fn start(&self) -> Vec<AppEvent> {
        ListKind::ALL
            .into_iter()
            .map(|list| AppEvent::Request(RepoRequest::LoadList(list)))
            .collect()
    }

    pub const fn nav(&self) -> &NavigationState {
        &self.nav
    }

    pub const fn visits(&self) -> &TableState<VisitRow> {
        &self.visits
    }

    pub const fn restaurants(&self) -> &TableState<RestaurantRow> {
        &self.restaurants
    }

    pub const fn wishlist(&self) -> &TableState<WantToVisitRow> {
        &self.wishlist
    }

    pub fn is_loaded(&self, list: ListKind) -> bool {
        self.loaded.contains(&list)
    }

    pub const fn history(&self) -> &UndoRedoLog {
        &self.history
    }

    pub const fn form(&self) -> Option<&FormState> {
        self.form.as_ref()
    }

    pub const fn saving(&self) -> bool {
        self.saving
    }

    pub const fn detail(&self) -> Option<&Detail> {
        self.detail.as_ref()
    }

    pub fn status_line(&self) -> Option<&str> {
        self.status_line.as_deref()
    }

    pub const fn help_visible(&self) -> bool {
        self.help_visible
    }

    pub const fn prefs(&self) -> &UiPreferences {
        &self.prefs
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        self.visits.set_viewport_height(height);
        self.restaurants.set_viewport_height(height);
        self.wishlist.set_viewport_height(height);
    }

    pub fn dispatch(&mut self, command: AppCommand) -> Vec<AppEvent> {
        if command != AppCommand::PressG && !is_background(&command) {
            self.nav.reset_gesture();
        }
        if self.nav.column_jump_pending()
            && !matches!(
                command,
                AppCommand::JumpToColumn(_) | AppCommand::CancelColumnJump
            )
            && !is_background(&command)
        {
            self.nav.end_column_jump();
        }

        match command {
            AppCommand::NextList => self.rotate_list(1),
            AppCommand::PrevList => self.rotate_list(-1),
            AppCommand::FirstList => {
                let changed = self.nav.first_list();
                self.screen_events(changed.is_some())
            }
            AppCommand::LastList => {
                let changed = self.nav.last_list();
                self.screen_events(changed.is_some())
            }
            AppCommand::MoveRows(delta) => self.on_list(|state, list| {
                with_table!(state, list, |table| table.move_cursor(delta));
                Vec::new()
            }),
            AppCommand::PressG => {
                if self.nav.press_g() {
                    return self.on_list(|state, list| {
                        with_table!(state, list, |table| table.jump_top());
                        Vec::new()
                    });
                }
                Vec::new()
            }
            AppCommand::JumpBottom => self.on_list(|state, list| {
                with_table!(state, list, |table| table.jump_bottom());
                Vec::new()
            }),
            AppCommand::HalfPageDown => self.on_list(|state, list| {
                let fixed = state.settings.half_page;
                with_table!(state, list, |table| {
                    let rows = fixed.unwrap_or_else(|| table.half_page());
                    table.half_page_down(rows);
                });
                Vec::new()
            }),
            AppCommand::HalfPageUp => self.on_list(|state, list| {
                let fixed = state.settings.half_page;
                with_table!(state, list, |table| {
                    let rows = fixed.unwrap_or_else(|| table.half_page());
                    table.half_page_up(rows);
                });
                Vec::new()
            }),
            AppCommand::NextColumn => self.on_list(|state, list| {
                with_table!(state, list, |table| table.move_active_column(1));
                vec![state.persist_prefs(list)]
            }),
            AppCommand::PrevColumn => self.on_list(|state, list| {
                with_table!(state, list, |table| table.move_active_column(-1));
                vec![state.persist_prefs(list)]
            }),
            AppCommand::CycleSort => {
                self.table_status(|list, state| with_table!(state, list, |table| table.cycle_sort()))
            }
            AppCommand::HideColumn => self.table_status(|list, state| {
                with_table!(state, list, |table| table.toggle_hide_active_column())
            }),
            AppCommand::ShowAllColumns => self.table_status(|list, state| {
                with_table!(state, list, |table| table.show_all_columns())
            }),
            AppCommand::CycleFilter => self.table_status(|list, state| {
                with_table!(state, list, |table| table.cycle_filter_from_cursor())
            }),
            AppCommand::ClearFilter => {
                self.table_status(|list, state| with_table!(state, list, |table| table.clear_filter()))
            }
            AppCommand::BeginColumnJump => self.on_list(|state, _| {
                state.nav.begin_column_jump();
                vec![state.set_status("column jump: press 1-9")]
            }),
            AppCommand::JumpToColumn(ordinal) => self.jump_to_column(ordinal),
            AppCommand::CancelColumnJump => {
                self.nav.end_column_jump();
                Vec::new()
            }
            AppCommand::OpenDetail => self.open_detail(),
            AppCommand::Back => self.back(),
            AppCommand::Add => self.add(),
            AppCommand::Edit => self.edit(),
            AppCommand::Delete => self.delete(),
            AppCommand::LogVisit => self.log_visit(),
            AppCommand::Convert => self.convert(),
            AppCommand::Undo => self.begin_history(HistoryDirection::Undo),
            AppCommand::Redo => self.begin_history(HistoryDirection::Redo),
            AppCommand::ToggleHelp => {
                self.help_visible = !self.help_visible;
                Vec::new()
            }
            AppCommand::UnboundKey => Vec::new(),
            AppCommand::FormChar(ch) => self.edit_form(|form| form.type_char(ch)),
            AppCommand::FormBackspace => self.edit_form(FormState::backspace),
            AppCommand::FormNextField => {
                if let Some(form) = self.form.as_mut() {
                    form.focus_next();
                }
                Vec::new()
            }
            AppCommand::FormPrevField => {
                if let Some(form) = self.form.as_mut() {
                    form.focus_prev();
                }
                Vec::new()
            }
            AppCommand::SuggestionMove(delta) => {
                if let Some(search) = self.form.as_mut().and_then(FormState::search_mut) {
                    search.move_cursor(delta);
                }
                Vec::new()
            }
            AppCommand::FormEnter => {
                let dropdown = self
                    .form
                    .as_ref()
                    .and_then(FormState::search)
                    .is_some_and(|search| search.dropdown_visible());
                if dropdown {
                    let chosen = self.form.as_mut().and_then(FormState::accept_suggestion);
                    return chosen
                        .map(|name| vec![self.set_status(&format!("restaurant: {name}"))])
                        .unwrap_or_default();
                }
                self.save_form()
            }
            AppCommand::FormSave => self.save_form(),
            AppCommand::FormEscape => self.escape_form(),
            AppCommand::RepositoryCompleted(outcome) => self.on_repository(outcome),
            AppCommand::DebounceFired { sequence } => {
                let query = self
                    .form
                    .as_mut()
                    .and_then(FormState::search_mut)
                    .and_then(|search| search.debounce_fired(sequence));
                match query {
                    Some(query) => vec![AppEvent::Lookup { sequence, query }],
                    None => {
                        debug!(sequence, "stale debounce timer dropped");
                        Vec::new()
                    }
                }
            }
            AppCommand::SuggestionsLoaded { sequence, result } => {
                let outcome = self
                    .form
                    .as_mut()
                    .and_then(FormState::search_mut)
                    .map_or(LookupOutcome::Stale, |search| {
                        search.lookup_completed(sequence, result)
                    });
                match outcome {
                    LookupOutcome::Failed(error) => {
                        vec![self.set_status(&format!("suggestions unavailable: {error}"))]
                    }
                    LookupOutcome::Stale => {
                        debug!(sequence, "stale suggestions dropped");
                        Vec::new()
                    }
                    LookupOutcome::Shown(_) | LookupOutcome::Empty => Vec::new(),
                }
            }
            AppCommand::ClearStatus => {
                self.status_line = None;
                vec![AppEvent::StatusCleared]
            }
        }
    }

    fn rotate_list(&mut self, delta: isize) -> Vec<AppEvent> {
        let changed = self.nav.rotate_list(delta);
        self.screen_events(changed.is_some())
    }

    fn screen_events(&self, changed: bool) -> Vec<AppEvent> {
        if changed {
            vec![AppEvent::ScreenChanged(self.nav.screen())]
        } else {
            Vec::new()
        }
    }

    /// Runs `work` against the current list when a list screen is showing.
    fn on_list(&mut self, work: impl FnOnce(&mut Self, ListKind) -> Vec<AppEvent>) -> Vec<AppEvent> {
        match self.nav.screen() {
            Screen::List(list) => work(self, list),
            _ => Vec::new(),
        }
    }

    fn table_status(
        &mut self,
        work: impl FnOnce(ListKind, &mut Self) -> TableStatus,
    ) -> Vec<AppEvent> {
        self.on_list(|state, list| {
            let status = work(list, state);
            let mut events = vec![state.set_status(&status.message())];
            if status.changes_prefs() {
                events.push(state.persist_prefs(list));
            }
            events
        })
    }

    fn jump_to_column(&mut self, ordinal: usize) -> Vec<AppEvent> {
        if !self.nav.column_jump_pending() {
            return Vec::new();
        }
        self.on_list(|state, list| {
            let jumped = with_table!(state, list, |table| table.jump_to_column(ordinal));
            if !jumped {
                return vec![state.set_status(&TableStatus::NoSuchColumn(ordinal).message())];
            }
            state.nav.end_column_jump();
            let label = with_table!(state, list, |table| table
                .columns()
                .get(table.active_column())
                .map(|column| column.label)
                .unwrap_or_default());
            vec![
                state.set_status(&TableStatus::ColumnJump(label).message()),
                state.persist_prefs(list),
            ]
        })
    }

    fn persist_prefs(&mut self, list: ListKind) -> AppEvent {
        let prefs = with_table!(self, list, |table| table.prefs());
        self.prefs.set_table(list, prefs);
        AppEvent::PersistPreferences(self.prefs.clone())
    }

    fn selected_id(&self, list: ListKind) -> Option<i64> {
        match list {
            ListKind::Visits => self.visits.selected_id(),
            ListKind::Restaurants => self.restaurants.selected_id(),
            ListKind::WantToVisit => self.wishlist.selected_id(),
        }
    }

    fn open_detail(&mut self) -> Vec<AppEvent> {
        let Screen::List(list) = self.nav.screen() else {
            return Vec::new();
        };
        let Some(id) = self.selected_id(list) else {
            return vec![self.set_status("nothing selected")];
        };
        self.nav.show_detail(list);
        self.detail = None;
        self.detail_target = Some((list, id));
        self.detail_refresh = false;
        vec![
            AppEvent::ScreenChanged(self.nav.screen()),
            AppEvent::Request(RepoRequest::LoadDetail { list, id }),
        ]
    }

    fn back(&mut self) -> Vec<AppEvent> {
        let Screen::Detail(list) = self.nav.screen() else {
            return Vec::new();
        };
        self.leave_detail(list)
    }

    fn leave_detail(&mut self, list: ListKind) -> Vec<AppEvent> {
        self.nav.show_list(list);
        self.detail = None;
        self.detail_target = None;
        self.detail_refresh = false;
        vec![AppEvent::ScreenChanged(self.nav.screen())]
    }

    fn open_form(&mut self, mut form: FormState) -> Vec<AppEvent> {
        form.continue_search_after(self.search_floor);
        let kind = form.kind();
        self.form = Some(form);
        self.saving = false;
        self.converting = false;
        self.nav.enter_insert(kind);
        vec![
            AppEvent::ScreenChanged(self.nav.screen()),
            AppEvent::ModeChanged(AppMode::Insert),
        ]
    }

    fn close_form(&mut self) -> Vec<AppEvent> {
        if let Some(search) = self.form.as_ref().and_then(FormState::search) {
            self.search_floor = self.search_floor.max(search.sequence());
        }
        self.form = None;
        self.saving = false;
        self.converting = false;
        let screen = self.nav.leave_insert();
        vec![
            AppEvent::ScreenChanged(screen),
            AppEvent::ModeChanged(AppMode::Nav),
        ]
    }

    fn add(&mut self) -> Vec<AppEvent> {
        let Screen::List(list) = self.nav.screen() else {
            return Vec::new();
        };
        let searchable = self.settings.suggestions_enabled;
        let form = match list.form() {
            FormKind::Visit => FormState::new_visit(self.settings.today, searchable),
            FormKind::Restaurant => FormState::new_restaurant(),
            FormKind::WantToVisit => FormState::new_want_to_visit(searchable),
        };
        self.open_form(form)
    }

    fn edit(&mut self) -> Vec<AppEvent> {
        if !matches!(self.nav.screen(), Screen::Detail(_)) {
            return Vec::new();
        }
        let searchable = self.settings.suggestions_enabled;
        let form = match &self.detail {
            Some(Detail::Visit(detail)) => FormState::edit_visit(detail, searchable),
            Some(Detail::Restaurant(detail)) => FormState::edit_restaurant(&detail.restaurant),
            Some(Detail::WantToVisit(detail)) => FormState::edit_want_to_visit(detail, searchable),
            None => return vec![self.set_status("still loading")],
        };
        self.open_form(form)
    }

    fn log_visit(&mut self) -> Vec<AppEvent> {
        let searchable = self.settings.suggestions_enabled;
        let today = self.settings.today;
        let form = match self.nav.screen() {
            Screen::List(ListKind::Restaurants) => {
                let Some(row) = self.restaurants.selected() else {
                    return vec![self.set_status("nothing selected")];
                };
                let hint = [row.address.as_str(), row.city.as_str(), row.cuisine.as_str()]
                    .into_iter()
                    .filter(|part| !part.is_empty())
                    .collect::<Vec<_>>()
                    .join(" · ");
                FormState::visit_for(row.id, &row.name, hint, today, searchable)
            }
            Screen::Detail(ListKind::Restaurants) => {
                let Some(Detail::Restaurant(detail)) = &self.detail else {
                    return vec![self.set_status("still loading")];
                };
                let restaurant = &detail.restaurant;
                FormState::visit_for(
                    restaurant.id,
                    &restaurant.name,
                    restaurant_hint(restaurant),
                    today,
                    searchable,
                )
            }
            _ => return Vec::new(),
        };
        self.open_form(form)
    }

    fn convert(&mut self) -> Vec<AppEvent> {
        let Some(Detail::WantToVisit(detail)) = &self.detail else {
            return Vec::new();
        };
        if self.nav.screen() != Screen::Detail(ListKind::WantToVisit) {
            return Vec::new();
        }
        let form = FormState::convert(detail, self.settings.today);
        self.open_form(form)
    }

    fn delete(&mut self) -> Vec<AppEvent> {
        let Some((list, id)) = self.detail_target else {
            return Vec::new();
        };
        if self.nav.screen() != Screen::Detail(list) {
            return Vec::new();
        }
        if let Some(blocked) = self.mutation_blocked() {
            return blocked;
        }
        let mutation = match list {
            ListKind::Visits => Mutation::DeleteVisit(VisitId::new(id)),
            ListKind::Restaurants => Mutation::DeleteRestaurant(RestaurantId::new(id)),
            ListKind::WantToVisit => Mutation::DeleteWantToVisit(WantToVisitId::new(id)),
        };
        self.mutations_in_flight += 1;
        let mut events = self.leave_detail(list);
        events.push(AppEvent::Request(RepoRequest::Mutate(mutation)));
        events
    }

    fn mutation_blocked(&mut self) -> Option<Vec<AppEvent>> {
        let direction = self.history.pending()?;
        Some(vec![self.set_status(&format!(
            "{} in progress, try again",
            direction.verb()
        ))])
    }

    fn edit_form(&mut self, edit: impl FnOnce(&mut FormState) -> Option<u64>) -> Vec<AppEvent> {
        if self.saving {
            return Vec::new();
        }
        let Some(form) = self.form.as_mut() else {
            return Vec::new();
        };
        match edit(form) {
            Some(sequence) => vec![AppEvent::ScheduleDebounce {
                sequence,
                delay: self.settings.debounce,
            }],
            None => Vec::new(),
        }
    }

    fn save_form(&mut self) -> Vec<AppEvent> {
        let Some(form) = self.form.as_ref() else {
            return Vec::new();
        };
        if self.saving {
            return vec![self.set_status("saving...")];
        }
        let mutation = match form.validate() {
            Ok(mutation) => mutation,
            Err(error) => return vec![self.set_status(&error.to_string())],
        };
        if let Some(blocked) = self.mutation_blocked() {
            return blocked;
        }
        // a finished mutation closes the form, so it must be this form's own
        if self.mutations_in_flight > 0 {
            return vec![self.set_status("another change is still saving, try again")];
        }
        self.saving = true;
        self.converting = matches!(
            mutation,
            Mutation::SaveVisit {
                converting: Some(_),
                ..
            }
        );
        self.mutations_in_flight += 1;
        vec![AppEvent::Request(RepoRequest::Mutate(mutation))]
    }

    fn escape_form(&mut self) -> Vec<AppEvent> {
        let Some(form) = self.form.as_mut() else {
            return Vec::new();
        };
        if let Some(search) = form.search_mut()
            && search.dropdown_visible()
        {
            search.dismiss();
            return Vec::new();
        }
        if self.saving {
            return vec![self.set_status("saving...")];
        }
        self.close_form()
    }

    fn begin_history(&mut self, direction: HistoryDirection) -> Vec<AppEvent> {
        if self.nav.mode() != AppMode::Nav {
            return Vec::new();
        }
        if self.mutations_in_flight > 0 {
            return vec![self.set_status("save in progress, try again")];
        }
        match self.history.begin(direction) {
            HistoryStart::Ready(action) => {
                vec![AppEvent::Request(RepoRequest::History { direction, action })]
            }
            HistoryStart::Empty => vec![self.set_status(&format!("nothing to {}", direction.verb()))],
            HistoryStart::Busy => vec![self.set_status(&format!(
                "{} in progress, try again",
                direction.verb()
            ))],
        }
    }

    fn on_repository(&mut self, outcome: RepoOutcome) -> Vec<AppEvent> {
        match outcome {
            RepoOutcome::ListLoaded(data) => {
                self.replace_list(data);
                Vec::new()
            }
            RepoOutcome::DetailLoaded(detail) => {
                if self.detail_target == Some((detail.list(), detail.id())) {
                    self.detail = Some(detail);
                    self.detail_refresh = false;
                } else {
                    debug!(id = detail.id(), "stale detail dropped");
                }
                Vec::new()
            }
            RepoOutcome::LoadFailed { list, error } => {
                vec![self.set_status(&format!("load {} failed: {error}", list.label()))]
            }
            RepoOutcome::DetailFailed { list, id, error } => {
                if self.detail_target != Some((list, id)) {
                    return Vec::new();
                }
                // a refresh after a change fails when that change removed the row
                let quiet = self.detail_refresh;
                let mut events = Vec::new();
                if self.nav.screen() == Screen::Detail(list) {
                    events = self.leave_detail(list);
                } else {
                    self.detail = None;
                    self.detail_target = None;
                    self.detail_refresh = false;
                }
                if quiet {
                    debug!(id, "open detail no longer exists");
                } else {
                    events.push(self.set_status(&error));
                }
                events
            }
            RepoOutcome::Mutated { action, focus } => {
                self.mutations_in_flight = self.mutations_in_flight.saturating_sub(1);
                let lists = action.affected_lists();
                let label = action.label.clone();
                self.history.push(action);
                self.pending_focus = focus;
                let mut events = Vec::new();
                if self.saving {
                    let converted = self.converting;
                    events.extend(self.close_form());
                    if converted && self.nav.screen() == Screen::Detail(ListKind::WantToVisit) {
                        events.extend(self.leave_detail(ListKind::WantToVisit));
                    }
                }
                events.push(self.set_status(&label));
                events.extend(self.reload(&lists));
                events
            }
            RepoOutcome::MutationFailed { error } => {
                self.mutations_in_flight = self.mutations_in_flight.saturating_sub(1);
                self.saving = false;
                self.converting = false;
                vec![self.set_status(&error)]
            }
            RepoOutcome::HistoryApplied { direction } => {
                let Some(label) = self.history.settle(direction, true) else {
                    return Vec::new();
                };
                let opposite = match direction {
                    HistoryDirection::Undo => HistoryDirection::Redo,
                    HistoryDirection::Redo => HistoryDirection::Undo,
                };
                let lists = self
                    .history
                    .peek(opposite)
                    .map(|action| action.affected_lists())
                    .unwrap_or_else(|| ListKind::ALL.to_vec());
                let mut events = vec![self.set_status(&format!("{}: {label}", direction.verb()))];
                events.extend(self.reload(&lists));
                events
            }
            RepoOutcome::HistoryFailed { direction, error } => {
                self.history.settle(direction, false);
                vec![self.set_status(&format!("{} failed: {error}", direction.verb()))]
            }
        }
    }

    /// Reloads every affected list, plus the open detail view.
    fn reload(&mut self, lists: &[ListKind]) -> Vec<AppEvent> {
        let mut events: Vec<AppEvent> = lists
            .iter()
            .map(|list| AppEvent::Request(RepoRequest::LoadList(*list)))
            .collect();
        if let Some((list, id)) = self.detail_target {
            self.detail_refresh = true;
            events.push(AppEvent::Request(RepoRequest::LoadDetail { list, id }));
        }
        events
    }

    fn replace_list(&mut self, data: ListData) {
        let list = data.kind();
        let prefs = self.prefs.table(list).clone();
        let focus = self
            .pending_focus
            .filter(|focus| focus.list == list)
            .map(|focus| focus.id);
        match data {
            ListData::Visits(rows) => rebuild(&mut self.visits, rows, &prefs, focus),
            ListData::Restaurants(rows) => rebuild(&mut self.restaurants, rows, &prefs, focus),
            ListData::WantToVisit(rows) => rebuild(&mut self.wishlist, rows, &prefs, focus),
        }
        if focus.is_some() {
            self.pending_focus = None;
        }
        self.loaded.insert(list);
    }

    fn set_status(&mut self, message: &str) -> AppEvent {
        self.status_line = Some(message.to_owned());
        AppEvent::StatusUpdated(message.to_owned())
    }
}

fn rebuild<R: crate::table::TableRecord>(
    table: &mut TableState<R>,
    rows: Vec<R>,
    prefs: &crate::prefs::TablePrefs,
    focus: Option<i64>,
) {
    let mut fresh = TableState::new(rows);
    fresh.apply_prefs(prefs);
    fresh.carry_view_from(table);
    if let Some(id) = focus {
        fresh.select_id(id);
    }
    *table = fresh;
}

const fn is_background(command: &AppCommand) -> bool {
    matches!(
        command,
        AppCommand::RepositoryCompleted(_)
            | AppCommand::DebounceFired { .. }
            | AppCommand::SuggestionsLoaded { .. }
            | AppCommand::ClearStatus
    )
}
