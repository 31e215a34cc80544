// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Tabs, Wrap};
use std::io;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info};
use tracker_app::{
    AppCommand, AppMode, AppState, Completion, Effect, Entity, EntityKind, FormInput, Job,
    ListCommand, ListEvent, ListView, ModalKind, ModalPhase, RemoteCollection, SearchToken, Skill,
    SortField, Sortable, execute as execute_request,
};

pub const DEFAULT_SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);

pub type SharedRemote<E> = Arc<dyn RemoteCollection<E> + Send + Sync>;

/// Everything the UI needs from the outside world. Requests run through
/// `spawn`, so a runtime decides where the blocking HTTP calls happen.
pub trait AppRuntime {
    fn jobs(&self) -> SharedRemote<Job>;
    fn skills(&self) -> SharedRemote<Skill>;

    fn search_debounce(&self) -> Duration {
        DEFAULT_SEARCH_DEBOUNCE
    }

    fn spawn(&mut self, task: Box<dyn FnOnce() + Send>) {
        thread::spawn(task);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
    Jobs(Completion<Job>),
    Skills(Completion<Skill>),
    SearchSettled { tab: EntityKind, token: SearchToken },
}

#[derive(Debug, Clone, PartialEq)]
struct FormUiState<F> {
    input: F,
    field_index: usize,
}

impl<F> FormUiState<F> {
    fn new(input: F) -> Self {
        Self {
            input,
            field_index: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct TabView<E: Entity> {
    list: ListView<E>,
    selected_row: usize,
    selected_col: usize,
    form: Option<FormUiState<E::Form>>,
}

impl<E: Entity> Default for TabView<E> {
    fn default() -> Self {
        Self {
            list: ListView::new(),
            selected_row: 0,
            selected_col: 0,
            form: None,
        }
    }
}

impl<E: Entity> TabView<E> {
    fn selected(&self) -> Option<&E> {
        self.list.projected().get(self.selected_row).copied()
    }

    fn selected_field(&self) -> Option<E::Field> {
        E::Field::ALL.get(self.selected_col).copied()
    }

    fn clamp_cursor(&mut self) {
        let rows = self.list.collection().len();
        self.selected_row = self.selected_row.min(rows.saturating_sub(1));
        self.selected_col = self
            .selected_col
            .min(E::Field::ALL.len().saturating_sub(1));
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
struct ViewData {
    jobs: TabView<Job>,
    skills: TabView<Skill>,
    status_token: u64,
}

/// Glue between a record type and its slot in the UI.
trait TabEntity: Entity {
    fn wrap(completion: Completion<Self>) -> InternalEvent;
    fn view(view_data: &ViewData) -> &TabView<Self>;
    fn view_mut(view_data: &mut ViewData) -> &mut TabView<Self>;
    fn remote<R: AppRuntime + ?Sized>(runtime: &R) -> SharedRemote<Self>;
}

impl TabEntity for Job {
    fn wrap(completion: Completion<Self>) -> InternalEvent {
        InternalEvent::Jobs(completion)
    }

    fn view(view_data: &ViewData) -> &TabView<Self> {
        &view_data.jobs
    }

    fn view_mut(view_data: &mut ViewData) -> &mut TabView<Self> {
        &mut view_data.jobs
    }

    fn remote<R: AppRuntime + ?Sized>(runtime: &R) -> SharedRemote<Self> {
        runtime.jobs()
    }
}

impl TabEntity for Skill {
    fn wrap(completion: Completion<Self>) -> InternalEvent {
        InternalEvent::Skills(completion)
    }

    fn view(view_data: &ViewData) -> &TabView<Self> {
        &view_data.skills
    }

    fn view_mut(view_data: &mut ViewData) -> &mut TabView<Self> {
        &mut view_data.skills
    }

    fn remote<R: AppRuntime + ?Sized>(runtime: &R) -> SharedRemote<Self> {
        runtime.skills()
    }
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::default();
    let (internal_tx, internal_rx) = mpsc::channel();

    info!(tab = state.active_tab.as_str(), "ui started");
    mount_all(state, runtime, &mut view_data, &internal_tx);

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &view_data)) {
            result = Err(error).context("draw frame");
            break;
        }

        let has_event = match event::poll(Duration::from_millis(120)).context("poll event") {
            Ok(has_event) => has_event,
            Err(error) => {
                result = Err(error);
                break;
            }
        };
        if has_event {
            match event::read().context("read event") {
                Ok(Event::Key(key)) => {
                    if handle_key_event(state, runtime, &mut view_data, &internal_tx, key) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(error) => {
                    result = Err(error);
                    break;
                }
            }
        }
    }

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    info!("ui stopped");
    result
}

fn mount_all<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    mount_tab::<Job, R>(state, runtime, view_data, internal_tx);
    mount_tab::<Skill, R>(state, runtime, view_data, internal_tx);
}

fn mount_tab<E: TabEntity, R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
) {
    let transition = E::view_mut(view_data).list.mount();
    apply_transition::<E, R>(state, runtime, view_data, internal_tx, transition);
}

fn process_internal_events<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
            InternalEvent::Jobs(completion) => {
                dispatch_list::<Job, R>(
                    state,
                    runtime,
                    view_data,
                    tx,
                    ListCommand::Complete(completion),
                );
            }
            InternalEvent::Skills(completion) => {
                dispatch_list::<Skill, R>(
                    state,
                    runtime,
                    view_data,
                    tx,
                    ListCommand::Complete(completion),
                );
            }
            InternalEvent::SearchSettled { tab, token } => match tab {
                EntityKind::Jobs => dispatch_list::<Job, R>(
                    state,
                    runtime,
                    view_data,
                    tx,
                    ListCommand::SearchSettled(token),
                ),
                EntityKind::Skills => dispatch_list::<Skill, R>(
                    state,
                    runtime,
                    view_data,
                    tx,
                    ListCommand::SearchSettled(token),
                ),
            },
        }
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

fn dispatch_list<E: TabEntity, R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: ListCommand<E>,
) {
    let transition = E::view_mut(view_data).list.dispatch(command);
    apply_transition::<E, R>(state, runtime, view_data, internal_tx, transition);
}

fn apply_transition<E: TabEntity, R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    transition: tracker_app::Transition<E>,
) {
    for event in transition.events {
        match event {
            ListEvent::Status(message) | ListEvent::Refused(message) => {
                emit_status(state, view_data, internal_tx, message);
            }
            ListEvent::Alert(message) => {
                state.dispatch(AppCommand::RaiseAlert(format!(
                    "an error occurred: {message}"
                )));
            }
            ListEvent::ModalOpened => sync_form::<E>(view_data),
            ListEvent::ModalClosed => E::view_mut(view_data).form = None,
            ListEvent::CollectionReplaced { .. } => E::view_mut(view_data).clamp_cursor(),
            ListEvent::SortChanged => {
                let status = E::view(view_data)
                    .list
                    .sort()
                    .map(|sort| {
                        format!(
                            "sort {} {}",
                            sort.field.label(),
                            sort.direction.marker()
                        )
                    })
                    .unwrap_or_else(|| "sort cleared".to_owned());
                emit_status(state, view_data, internal_tx, status);
            }
            ListEvent::StaleResponseDropped(request) => {
                debug!(kind = E::KIND.as_str(), %request, "ignored stale response");
            }
            ListEvent::RequestIssued(..)
            | ListEvent::PopularityChanged
            | ListEvent::ModalFailed(_)
            | ListEvent::FilterChanged
            | ListEvent::ErrorRecorded(_) => {}
        }
    }
    run_effects::<E, R>(runtime, internal_tx, transition.effects);
}

fn run_effects<E: TabEntity, R: AppRuntime>(
    runtime: &mut R,
    internal_tx: &Sender<InternalEvent>,
    effects: Vec<Effect<E>>,
) {
    for effect in effects {
        let sender = internal_tx.clone();
        match effect {
            Effect::Remote(request) => {
                let remote = E::remote(runtime);
                runtime.spawn(Box::new(move || {
                    let completion = execute_request(&*remote, &request);
                    let _ = sender.send(E::wrap(completion));
                }));
            }
            Effect::Debounce(token) => {
                let delay = runtime.search_debounce();
                runtime.spawn(Box::new(move || {
                    thread::sleep(delay);
                    let _ = sender.send(InternalEvent::SearchSettled {
                        tab: E::KIND,
                        token,
                    });
                }));
            }
        }
    }
}

fn sync_form<E: TabEntity>(view_data: &mut ViewData) {
    let tab = E::view_mut(view_data);
    let form = match tab.list.modal().map(|modal| &modal.kind) {
        Some(ModalKind::Add) => Some(FormUiState::new(E::Form::default())),
        Some(ModalKind::Edit(target)) => Some(FormUiState::new(target.to_form())),
        Some(ModalKind::Delete(_)) | None => None,
    };
    tab.form = form;
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if state.current_alert().is_some() {
        if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
            state.dispatch(AppCommand::DismissAlert);
        }
        return false;
    }

    match state.active_tab {
        EntityKind::Jobs => handle_tab_key::<Job, R>(state, runtime, view_data, internal_tx, key),
        EntityKind::Skills => {
            handle_tab_key::<Skill, R>(state, runtime, view_data, internal_tx, key)
        }
    }
}

fn handle_tab_key<E: TabEntity, R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if E::view(view_data).list.modal().is_some() {
        handle_modal_key::<E, R>(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match state.mode {
        AppMode::Search | AppMode::RatingFilter => {
            handle_filter_key::<E, R>(state, runtime, view_data, internal_tx, key);
            return false;
        }
        AppMode::Nav => {}
    }

    match (key.code, key.modifiers) {
        (KeyCode::Char('q'), KeyModifiers::NONE) => return true,
        (KeyCode::Tab, _) => {
            state.dispatch(AppCommand::NextTab);
        }
        (KeyCode::BackTab, _) => {
            state.dispatch(AppCommand::PrevTab);
        }
        (KeyCode::Char('1'), _) => {
            state.dispatch(AppCommand::SelectTab(EntityKind::Jobs));
        }
        (KeyCode::Char('2'), _) => {
            state.dispatch(AppCommand::SelectTab(EntityKind::Skills));
        }
        (KeyCode::Char('j') | KeyCode::Down, _) => move_row::<E>(view_data, 1),
        (KeyCode::Char('k') | KeyCode::Up, _) => move_row::<E>(view_data, -1),
        (KeyCode::Char('g'), KeyModifiers::NONE) => E::view_mut(view_data).selected_row = 0,
        (KeyCode::Char('G'), _) => move_row::<E>(view_data, isize::MAX),
        (KeyCode::Char('h') | KeyCode::Left, _) => move_col::<E>(view_data, -1),
        (KeyCode::Char('l') | KeyCode::Right, _) => move_col::<E>(view_data, 1),
        (KeyCode::Char('s'), KeyModifiers::NONE) => {
            if let Some(field) = E::view(view_data).selected_field() {
                dispatch_list::<E, R>(
                    state,
                    runtime,
                    view_data,
                    internal_tx,
                    ListCommand::SetSort(field),
                );
            }
        }
        (KeyCode::Char('/'), _) => {
            if let Some(message) = state
                .dispatch(AppCommand::EnterSearch)
                .into_iter()
                .find_map(|event| match event {
                    tracker_app::AppEvent::StatusUpdated(message) => Some(message),
                    _ => None,
                })
            {
                emit_status(state, view_data, internal_tx, message);
            }
        }
        (KeyCode::Char('r'), KeyModifiers::NONE) => {
            if let Some(message) = state
                .dispatch(AppCommand::EnterRatingFilter)
                .into_iter()
                .find_map(|event| match event {
                    tracker_app::AppEvent::StatusUpdated(message) => Some(message),
                    _ => None,
                })
            {
                emit_status(state, view_data, internal_tx, message);
            }
        }
        (KeyCode::Char('R'), _) => {
            mount_tab::<E, R>(state, runtime, view_data, internal_tx);
            emit_status(state, view_data, internal_tx, "reloading");
        }
        (KeyCode::Char('a'), KeyModifiers::NONE) => {
            dispatch_list::<E, R>(state, runtime, view_data, internal_tx, ListCommand::OpenAdd);
        }
        (KeyCode::Char('e'), KeyModifiers::NONE) => {
            let Some(target) = E::view(view_data).selected().cloned() else {
                emit_status(state, view_data, internal_tx, "nothing selected");
                return false;
            };
            dispatch_list::<E, R>(
                state,
                runtime,
                view_data,
                internal_tx,
                ListCommand::OpenEdit(target),
            );
        }
        (KeyCode::Char('d'), KeyModifiers::NONE) => {
            let Some(id) = E::view(view_data)
                .selected()
                .map(|target| target.id().clone())
            else {
                emit_status(state, view_data, internal_tx, "nothing selected");
                return false;
            };
            dispatch_list::<E, R>(
                state,
                runtime,
                view_data,
                internal_tx,
                ListCommand::OpenDelete(id),
            );
        }
        _ => {}
    }
    false
}

fn handle_filter_key<E: TabEntity, R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
        state.dispatch(AppCommand::ExitToNav);
        return;
    }

    let list = &E::view(view_data).list;
    let command = match state.mode {
        AppMode::Search => {
            let mut text = list.search_input().to_owned();
            match key.code {
                KeyCode::Backspace => {
                    text.pop();
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    text.push(c);
                }
                _ => return,
            }
            ListCommand::SetSearch(text)
        }
        // The filter is a single digit, so each key replaces it.
        AppMode::RatingFilter => match key.code {
            KeyCode::Backspace | KeyCode::Delete => ListCommand::SetMinRating(String::new()),
            KeyCode::Char(c) => ListCommand::SetMinRating(c.to_string()),
            _ => return,
        },
        AppMode::Nav => return,
    };
    dispatch_list::<E, R>(state, runtime, view_data, internal_tx, command);
}

fn handle_modal_key<E: TabEntity, R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    let confirming_delete = E::view(view_data)
        .list
        .modal()
        .is_some_and(|modal| matches!(modal.kind, ModalKind::Delete(_)));

    if confirming_delete {
        let command = match key.code {
            KeyCode::Enter | KeyCode::Char('y') => ListCommand::ConfirmDelete,
            KeyCode::Esc | KeyCode::Char('n') => ListCommand::CloseModal,
            _ => return,
        };
        dispatch_list::<E, R>(state, runtime, view_data, internal_tx, command);
        return;
    }

    match key.code {
        KeyCode::Esc => {
            dispatch_list::<E, R>(
                state,
                runtime,
                view_data,
                internal_tx,
                ListCommand::CloseModal,
            );
        }
        KeyCode::Enter => {
            let Some(form) = &E::view(view_data).form else {
                return;
            };
            let input = form.input.clone();
            dispatch_list::<E, R>(
                state,
                runtime,
                view_data,
                internal_tx,
                ListCommand::Submit(input),
            );
        }
        KeyCode::Tab | KeyCode::Down => move_form_field::<E>(view_data, 1),
        KeyCode::BackTab | KeyCode::Up => move_form_field::<E>(view_data, -1),
        KeyCode::Backspace => edit_form_field::<E>(view_data, |value| {
            value.pop();
        }),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            edit_form_field::<E>(view_data, |value| value.push(c));
        }
        _ => {}
    }
}

fn move_form_field<E: TabEntity>(view_data: &mut ViewData, delta: isize) {
    let Some(form) = &mut E::view_mut(view_data).form else {
        return;
    };
    let len = <E::Form as FormInput>::FIELDS.len() as isize;
    if len == 0 {
        return;
    }
    form.field_index = (form.field_index as isize + delta).rem_euclid(len) as usize;
}

fn edit_form_field<E: TabEntity>(view_data: &mut ViewData, edit: impl FnOnce(&mut String)) {
    let tab = E::view_mut(view_data);
    if tab.list.modal().is_some_and(|modal| modal.is_pending()) {
        return;
    }
    let Some(form) = &mut tab.form else {
        return;
    };
    if let Some(value) = form.input.value_mut(form.field_index) {
        edit(value);
    }
}

fn move_row<E: TabEntity>(view_data: &mut ViewData, delta: isize) {
    let tab = E::view_mut(view_data);
    let row_count = tab.list.collection().len();
    if row_count == 0 {
        tab.selected_row = 0;
        return;
    }
    let current = tab.selected_row;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    tab.selected_row = next.min(row_count.saturating_sub(1));
}

fn move_col<E: TabEntity>(view_data: &mut ViewData, delta: isize) {
    let tab = E::view_mut(view_data);
    let columns = E::Field::ALL.len();
    let current = tab.selected_col;
    let next = if delta.is_negative() {
        current.saturating_sub(delta.unsigned_abs())
    } else {
        current.saturating_add(delta as usize)
    };
    tab.selected_col = next.min(columns.saturating_sub(1));
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let selected = EntityKind::ALL
        .iter()
        .position(|tab| *tab == state.active_tab)
        .unwrap_or(0);
    let tab_titles = vec![
        tab_title(&view_data.jobs),
        tab_title(&view_data.skills),
    ];
    let tabs = Tabs::new(tab_titles)
        .block(Block::default().title("tracker").borders(Borders::ALL))
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .select(selected);
    frame.render_widget(tabs, layout[0]);

    match state.active_tab {
        EntityKind::Jobs => render_tab(frame, &layout, state, &view_data.jobs),
        EntityKind::Skills => render_tab(frame, &layout, state, &view_data.skills),
    }

    let status = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if let Some(alert) = state.current_alert() {
        let area = centered_rect(50, 24, frame.area());
        frame.render_widget(Clear, area);
        let dialog = Paragraph::new(render_alert_text(alert))
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("alert")
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Red)),
            );
        frame.render_widget(dialog, area);
    }
}

fn render_tab<E: TabEntity>(
    frame: &mut ratatui::Frame<'_>,
    layout: &[Rect],
    state: &AppState,
    tab: &TabView<E>,
) {
    let filter_style = if tab.list.error().is_some() || tab.list.popularity_error().is_some() {
        Style::default().fg(Color::Red)
    } else {
        Style::default()
    };
    let filter = Paragraph::new(render_filter_text(state, tab))
        .style(filter_style)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(filter, layout[1]);

    render_table(frame, layout[2], tab);

    if let Some(text) = render_modal_text(tab) {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let dialog = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(modal_title(tab))
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(dialog, area);
    }
}

fn render_table<E: TabEntity>(frame: &mut ratatui::Frame<'_>, area: Rect, tab: &TabView<E>) {
    let columns = E::Field::ALL;
    let widths = vec![Constraint::Min(8); columns.len().max(1)];

    let header = Row::new(header_labels(&tab.list).into_iter().map(|label| {
        Cell::from(label).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = tab
        .list
        .projected()
        .into_iter()
        .enumerate()
        .map(|(row_index, entity)| {
            let selected_row = row_index == tab.selected_row;
            let cells = columns
                .iter()
                .enumerate()
                .map(|(column_index, field)| {
                    let mut style = Style::default();
                    if selected_row {
                        style = style.bg(Color::DarkGray);
                    }
                    if selected_row && column_index == tab.selected_col {
                        style = Style::default()
                            .fg(Color::Black)
                            .bg(Color::Cyan)
                            .add_modifier(Modifier::BOLD);
                    }
                    Cell::from(entity.field(*field).display()).style(style)
                })
                .collect::<Vec<_>>();
            Row::new(cells)
        })
        .collect::<Vec<_>>();

    let table = Table::new(rows, widths)
        .header(header)
        .column_spacing(1)
        .block(
            Block::default()
                .title(table_title(tab))
                .borders(Borders::ALL),
        );
    frame.render_widget(table, area);
}

fn tab_title<E: TabEntity>(tab: &TabView<E>) -> String {
    if tab.list.is_loading() {
        format!(" {} … ", E::KIND.as_str())
    } else {
        format!(" {} ", E::KIND.as_str())
    }
}

fn table_title<E: TabEntity>(tab: &TabView<E>) -> String {
    let count = tab.list.collection().len();
    let noun = if count == 1 {
        E::KIND.singular()
    } else {
        E::KIND.as_str()
    };
    if tab.list.is_loading() {
        format!("{count} {noun} · loading")
    } else {
        format!("{count} {noun}")
    }
}

fn header_labels<E: Entity>(list: &ListView<E>) -> Vec<String> {
    E::Field::ALL
        .iter()
        .map(|field| match list.sort() {
            Some(sort) if sort.field == *field => {
                format!("{} {}", field.label(), sort.direction.marker())
            }
            _ => field.label().to_owned(),
        })
        .collect()
}

fn render_filter_text<E: TabEntity>(state: &AppState, tab: &TabView<E>) -> String {
    let list = &tab.list;
    let mut parts = Vec::new();

    if E::KIND == EntityKind::Skills {
        let search_cursor = if state.mode == AppMode::Search { "_" } else { "" };
        parts.push(format!("search: {}{search_cursor}", list.search_input()));
        let rating_cursor = if state.mode == AppMode::RatingFilter {
            "_"
        } else {
            ""
        };
        let rating = if list.rating_input().is_empty() && rating_cursor.is_empty() {
            "any".to_owned()
        } else {
            format!("{}{rating_cursor}", list.rating_input())
        };
        parts.push(format!("min rating: {rating}"));
        if let Some(error) = list.popularity_error() {
            parts.push(format!("most popular: unavailable ({error})"));
        } else if let Some(popular) = list.popularity() {
            parts.push(popular.summary());
        } else if list.is_popularity_loading() {
            parts.push("most popular: …".to_owned());
        }
    } else {
        parts.push("filters live on the skills tab".to_owned());
    }

    if let Some(error) = list.error() {
        parts.push(format!("error: {error}"));
    }
    parts.join(" | ")
}

fn modal_title<E: TabEntity>(tab: &TabView<E>) -> String {
    let verb = match tab.list.modal().map(|modal| &modal.kind) {
        Some(ModalKind::Add) => "add",
        Some(ModalKind::Edit(_)) => "edit",
        Some(ModalKind::Delete(_)) => "delete",
        None => return String::new(),
    };
    format!("{verb} {}", E::KIND.singular())
}

fn render_modal_text<E: TabEntity>(tab: &TabView<E>) -> Option<String> {
    let modal = tab.list.modal()?;
    let mut lines = Vec::new();
    match &modal.kind {
        ModalKind::Delete(target) => {
            lines.push(format!("delete {}?", target.label()));
            lines.push(String::new());
            lines.push("enter/y confirm | esc/n cancel".to_owned());
        }
        ModalKind::Add | ModalKind::Edit(_) => {
            if let Some(form) = &tab.form {
                for (index, spec) in <E::Form as FormInput>::FIELDS.iter().enumerate() {
                    let cursor = if index == form.field_index { ">" } else { " " };
                    let value = form.input.value(index).unwrap_or_default();
                    let hint = if spec.hint.is_empty() {
                        String::new()
                    } else {
                        format!("  ({})", spec.hint)
                    };
                    lines.push(format!("{cursor} {:<9} {value}{hint}", spec.label));
                }
                lines.push(String::new());
                lines.push("tab/shift+tab field | enter save | esc cancel".to_owned());
            }
        }
    }
    match &modal.phase {
        ModalPhase::Editing => {}
        ModalPhase::Pending(_) => {
            lines.push(String::new());
            lines.push("saving…".to_owned());
        }
        ModalPhase::Failed(message) => {
            lines.push(String::new());
            lines.push(format!("error: {message}"));
        }
    }
    Some(lines.join("\n"))
}

fn render_alert_text(message: &str) -> String {
    format!("{message}\n\nenter/esc dismiss")
}

fn modal_open(state: &AppState, view_data: &ViewData) -> bool {
    match state.active_tab {
        EntityKind::Jobs => view_data.jobs.list.modal().is_some(),
        EntityKind::Skills => view_data.skills.list.modal().is_some(),
    }
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    let mode = match state.mode {
        AppMode::Nav => "NAV",
        AppMode::Search => "SEARCH",
        AppMode::RatingFilter => "RATING",
    };
    let keys = if state.current_alert().is_some() {
        "enter/esc dismiss"
    } else if modal_open(state, view_data) {
        "tab field | enter save | esc cancel"
    } else {
        match state.mode {
            AppMode::Nav if state.active_tab == EntityKind::Skills => {
                "j/k/h/l g/G | s sort | / search | r rating | a/e/d | R reload | tab 1/2 | q"
            }
            AppMode::Nav => "j/k/h/l g/G | s sort | a/e/d | R reload | tab 1/2 | q",
            AppMode::Search | AppMode::RatingFilter => "type to filter | enter/esc done",
        }
    };
    match &state.status_line {
        Some(status) => format!("{mode} | {status} | {keys}"),
        None => format!("{mode} | {keys}"),
    }
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
