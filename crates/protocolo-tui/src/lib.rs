// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

mod markup;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use protocolo_app::{
    AppCommand, AppEvent, AppState, ArchivedStatus, ExportReceipt, ListModel, NavDirection,
    ProtocolId, ProtocolPage, QueryParams, RecordDetail, RecordSummary, StatusFilter, Totals,
    build_query, requests_refresh,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_STARTUP_DELAY: Duration = Duration::from_secs(2);
const STATUS_CLEAR_DELAY: Duration = Duration::from_secs(4);
const DETAIL_PAGE_LINES: u16 = 10;

const MSG_LOADING: &str = "Carregando...";
const MSG_SEARCHING: &str = "Buscando protocolos...";
const MSG_EMPTY_LIST: &str = "Nenhum protocolo encontrado.";
const MSG_DETAIL_PLACEHOLDER: &str = "Selecione um protocolo à esquerda...";
const MSG_DETAIL_LOADING: &str = "Carregando protocolo...";
const MSG_REMOVED: &str = "Protocolo removido.";
const MSG_NOTHING_TO_EXPORT: &str = "Nenhum protocolo para exportar!";
const MSG_CONFIRM_REMOVE: &str = "Tem certeza que deseja remover este protocolo?";
const MSG_REMOVE_REFUSED: &str = "Erro ao remover protocolo.";

pub trait AppRuntime {
    fn load_last_update(&mut self) -> Result<Option<String>>;
    fn load_protocols(&mut self, query: &QueryParams) -> Result<ProtocolPage>;
    fn load_detail(&mut self, id: &ProtocolId, search: &str) -> Result<RecordDetail>;
    fn export_protocols(&mut self, ids: &[ProtocolId]) -> Result<ExportReceipt>;
    fn remove_protocol(&mut self, id: &ProtocolId) -> Result<bool>;

    // The spawn_* hooks run inline by default; runtimes backed by a network
    // client override them to run on worker threads.
    fn spawn_last_update(&mut self, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self.load_last_update().map_err(|error| format!("{error:#}"));
        send_event(&tx, InternalEvent::LastUpdateLoaded(result))
    }

    fn spawn_protocols(
        &mut self,
        request_id: u64,
        query: &QueryParams,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .load_protocols(query)
            .map_err(|error| format!("{error:#}"));
        send_event(&tx, InternalEvent::ProtocolsLoaded { request_id, result })
    }

    fn spawn_detail(
        &mut self,
        request_id: u64,
        id: &ProtocolId,
        search: &str,
        tx: Sender<InternalEvent>,
    ) -> Result<()> {
        let result = self
            .load_detail(id, search)
            .map_err(|error| format!("{error:#}"));
        send_event(
            &tx,
            InternalEvent::DetailLoaded {
                request_id,
                id: id.clone(),
                result,
            },
        )
    }

    fn spawn_export(&mut self, ids: Vec<ProtocolId>, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .export_protocols(&ids)
            .map_err(|error| format!("{error:#}"));
        send_event(&tx, InternalEvent::ExportFinished(result))
    }

    fn spawn_remove(&mut self, id: ProtocolId, tx: Sender<InternalEvent>) -> Result<()> {
        let result = self
            .remove_protocol(&id)
            .map_err(|error| format!("{error:#}"));
        send_event(&tx, InternalEvent::RemoveFinished { id, result })
    }
}

pub fn send_event(tx: &Sender<InternalEvent>, event: InternalEvent) -> Result<()> {
    tx.send(event)
        .map_err(|_| anyhow::anyhow!("ui event channel closed"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus {
        token: u64,
    },
    StartupDelayElapsed,
    LastUpdateLoaded(Result<Option<String>, String>),
    ProtocolsLoaded {
        request_id: u64,
        result: Result<ProtocolPage, String>,
    },
    DetailLoaded {
        request_id: u64,
        id: ProtocolId,
        result: Result<RecordDetail, String>,
    },
    ExportFinished(Result<ExportReceipt, String>),
    RemoveFinished {
        id: ProtocolId,
        result: Result<bool, String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiOptions {
    pub startup_delay: Duration,
}

impl Default for UiOptions {
    fn default() -> Self {
        Self {
            startup_delay: DEFAULT_STARTUP_DELAY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum StartupPhase {
    #[default]
    Instructions,
    Loading,
    Ready,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum DetailPane {
    Message(String),
    Loaded { id: ProtocolId, detail: RecordDetail },
}

impl Default for DetailPane {
    fn default() -> Self {
        Self::Message(MSG_DETAIL_PLACEHOLDER.to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct SearchInput {
    active: bool,
    buffer: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Overlay {
    ConfirmRemove(ProtocolId),
    Alert(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    options: UiOptions,
    startup: StartupPhase,
    list: ListModel,
    list_message: Option<String>,
    list_offset: usize,
    totals: Option<Totals>,
    detail: DetailPane,
    detail_scroll: u16,
    search: SearchInput,
    overlay: Option<Overlay>,
    list_request_id: u64,
    detail_request_id: u64,
    status_token: u64,
}

impl ViewData {
    fn new(options: UiOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }
}

pub fn run_app<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    options: UiOptions,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData::new(options);
    let (internal_tx, internal_rx) = mpsc::channel();

    let mut result = Ok(());
    loop {
        process_internal_events(state, runtime, &mut view_data, &internal_tx, &internal_rx);

        if let Err(error) = terminal.draw(|frame| render(frame, state, &mut view_data)) {
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
    result
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
    match event {
        InternalEvent::ClearStatus { token } if token == view_data.status_token => {
            state.dispatch(AppCommand::ClearStatus);
        }
        InternalEvent::ClearStatus { .. } => {}
        InternalEvent::StartupDelayElapsed => {
            if view_data.startup == StartupPhase::Loading {
                begin_browsing(state, runtime, view_data, tx);
            }
        }
        InternalEvent::LastUpdateLoaded(result) => {
            handle_last_update(state, runtime, view_data, tx, result);
        }
        InternalEvent::ProtocolsLoaded { request_id, result } => {
            if request_id != view_data.list_request_id {
                debug!(
                    request_id,
                    latest = view_data.list_request_id,
                    "discard stale protocol list"
                );
                return;
            }
            match result {
                Ok(page) => {
                    info!(
                        request_id,
                        count = page.protocols.len(),
                        "protocol list loaded"
                    );
                    view_data.totals = Some(page.totals);
                    render_records(state, runtime, view_data, tx, page.protocols);
                }
                Err(error) => {
                    warn!(request_id, %error, "protocol list failed");
                    view_data.list_message = Some(format!("Erro ao carregar protocolos: {error}"));
                }
            }
        }
        InternalEvent::DetailLoaded {
            request_id,
            id,
            result,
        } => {
            if request_id != view_data.detail_request_id {
                debug!(
                    request_id,
                    latest = view_data.detail_request_id,
                    %id,
                    "discard stale protocol detail"
                );
                return;
            }
            view_data.detail = match result {
                Ok(detail) => DetailPane::Loaded { id, detail },
                Err(error) => {
                    warn!(%id, %error, "protocol detail failed");
                    DetailPane::Message(format!("Erro ao carregar protocolo: {error}"))
                }
            };
        }
        InternalEvent::ExportFinished(result) => match result {
            Ok(receipt) => {
                info!(count = receipt.count, path = %receipt.path.display(), "export saved");
                emit_status(
                    state,
                    view_data,
                    tx,
                    format!(
                        "{} protocolo(s) exportado(s) em {}",
                        receipt.count,
                        receipt.path.display()
                    ),
                );
            }
            Err(error) => {
                warn!(%error, "export failed");
                view_data.overlay = Some(Overlay::Alert(format!("Erro ao exportar: {error}")));
            }
        },
        InternalEvent::RemoveFinished { id, result } => match result {
            Ok(true) => {
                info!(%id, "protocol removed");
                view_data.list.remove(&id);
                clear_detail(view_data, MSG_REMOVED);
                refresh(state, runtime, view_data, tx);
            }
            Ok(false) => {
                warn!(%id, "server refused removal");
                view_data.overlay = Some(Overlay::Alert(MSG_REMOVE_REFUSED.to_owned()));
            }
            Err(error) => {
                warn!(%id, %error, "removal failed");
                view_data.overlay = Some(Overlay::Alert(format!("Erro ao remover: {error}")));
            }
        },
    }
}

fn start_loading<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    view_data.startup = StartupPhase::Loading;
    view_data.detail = DetailPane::default();
    view_data.list_message = Some(MSG_LOADING.to_owned());
    if let Err(error) = runtime.spawn_last_update(tx.clone()) {
        warn!(error = %format!("{error:#}"), "last update request failed to start");
        begin_browsing(state, runtime, view_data, tx);
    }
}

fn handle_last_update<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    result: Result<Option<String>, String>,
) {
    if view_data.startup != StartupPhase::Loading {
        return;
    }
    match result {
        Ok(last_update) => {
            if let Some(timestamp) = last_update {
                view_data.list_message = Some(format!(
                    "Carregando banco de dados atualizado em {timestamp}"
                ));
            }
            schedule_startup_refresh(tx, view_data.options.startup_delay);
        }
        Err(error) => {
            warn!(%error, "last update lookup failed; loading list now");
            begin_browsing(state, runtime, view_data, tx);
        }
    }
}

fn schedule_startup_refresh(tx: &Sender<InternalEvent>, delay: Duration) {
    if delay.is_zero() {
        let _ = tx.send(InternalEvent::StartupDelayElapsed);
        return;
    }
    let sender = tx.clone();
    thread::spawn(move || {
        thread::sleep(delay);
        let _ = sender.send(InternalEvent::StartupDelayElapsed);
    });
}

fn begin_browsing<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    view_data.startup = StartupPhase::Ready;
    refresh(state, runtime, view_data, tx);
}

/// Re-derives the list from the current filter with a fresh server query.
fn refresh<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let query = build_query(&state.filter);
    view_data.list_request_id = view_data.list_request_id.wrapping_add(1);
    let request_id = view_data.list_request_id;

    view_data.list.replace(Vec::new());
    view_data.list_offset = 0;
    view_data.list_message = Some(MSG_SEARCHING.to_owned());
    // Details requested against the old list must not land after it is gone.
    view_data.detail_request_id = view_data.detail_request_id.wrapping_add(1);

    info!(request_id, query = %query.to_query_string(), "refresh protocol list");
    if let Err(error) = runtime.spawn_protocols(request_id, &query, tx.clone()) {
        warn!(request_id, error = %format!("{error:#}"), "protocol list request failed to start");
        view_data.list_message = Some(format!("Erro ao carregar protocolos: {error:#}"));
    }
}

fn render_records<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    records: Vec<RecordSummary>,
) {
    view_data.list_offset = 0;
    match view_data.list.replace(records) {
        Some(first) => {
            view_data.list_message = None;
            load_detail(state, runtime, view_data, tx, &first);
        }
        None => {
            view_data.list_message = Some(MSG_EMPTY_LIST.to_owned());
            clear_detail(view_data, MSG_DETAIL_PLACEHOLDER);
        }
    }
}

/// Loading a detail is what marks a list entry selected.
fn load_detail<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    id: &ProtocolId,
) {
    view_data.list.select(id);
    view_data.detail_request_id = view_data.detail_request_id.wrapping_add(1);
    let request_id = view_data.detail_request_id;
    view_data.detail = DetailPane::Message(MSG_DETAIL_LOADING.to_owned());
    view_data.detail_scroll = 0;

    debug!(request_id, %id, "load protocol detail");
    if let Err(error) =
        runtime.spawn_detail(request_id, id, state.filter.search_term(), tx.clone())
    {
        view_data.detail = DetailPane::Message(format!("Erro ao carregar protocolo: {error:#}"));
    }
}

fn clear_detail(view_data: &mut ViewData, message: &str) {
    // Orphan any in-flight detail so it cannot repaint the pane.
    view_data.detail_request_id = view_data.detail_request_id.wrapping_add(1);
    view_data.detail = DetailPane::Message(message.to_owned());
    view_data.detail_scroll = 0;
}

fn move_selection<R: AppRuntime>(
    state: &AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    direction: NavDirection,
) {
    let Some(target) = view_data.list.neighbor(direction) else {
        return;
    };
    if view_data.list.selected() == Some(&target) {
        return;
    }
    load_detail(state, runtime, view_data, tx, &target);
}

fn request_remove_selected(view_data: &mut ViewData) {
    if let Some(id) = view_data.list.selected().cloned() {
        view_data.overlay = Some(Overlay::ConfirmRemove(id));
    }
}

fn confirm_remove<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    id: ProtocolId,
) {
    view_data.overlay = None;
    info!(%id, "remove protocol");
    if let Err(error) = runtime.spawn_remove(id, tx.clone()) {
        view_data.overlay = Some(Overlay::Alert(format!("Erro ao remover: {error:#}")));
    }
}

fn export_visible<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let ids = view_data.list.visible_ids();
    if ids.is_empty() {
        view_data.overlay = Some(Overlay::Alert(MSG_NOTHING_TO_EXPORT.to_owned()));
        return;
    }

    info!(count = ids.len(), "export visible protocols");
    emit_status(
        state,
        view_data,
        tx,
        format!("exportando {} protocolo(s)...", ids.len()),
    );
    if let Err(error) = runtime.spawn_export(ids, tx.clone()) {
        view_data.overlay = Some(Overlay::Alert(format!("Erro ao exportar: {error:#}")));
    }
}

fn hide_selected<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
) {
    let Some(selected) = view_data.list.selected().cloned() else {
        return;
    };
    let next = view_data
        .list
        .neighbor(NavDirection::Next)
        .filter(|next| *next != selected);
    view_data.list.hide(&selected);
    emit_status(state, view_data, tx, format!("{selected} oculto até a próxima busca"));

    match next {
        Some(next) => load_detail(state, runtime, view_data, tx, &next),
        None => clear_detail(view_data, MSG_DETAIL_PLACEHOLDER),
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_DELAY);
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

fn dispatch_and_refresh<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    let events = state.dispatch(command);
    if events
        .iter()
        .any(|event| matches!(event, AppEvent::StatusUpdated(_)))
    {
        view_data.status_token = view_data.status_token.saturating_add(1);
        schedule_status_clear(tx, view_data.status_token);
    }
    if requests_refresh(&events) {
        refresh(state, runtime, view_data, tx);
    }
}

fn handle_key_event<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if let Some(overlay) = view_data.overlay.clone() {
        handle_overlay_key(runtime, view_data, internal_tx, overlay, key);
        return false;
    }

    if view_data.startup == StartupPhase::Instructions {
        match key.code {
            KeyCode::Enter => start_loading(state, runtime, view_data, internal_tx),
            KeyCode::Char('q') | KeyCode::Esc => return true,
            _ => {}
        }
        return false;
    }

    if view_data.search.active {
        handle_search_key(state, runtime, view_data, internal_tx, key);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('/') => {
            view_data.search = SearchInput {
                active: true,
                buffer: state.filter.search_text.clone(),
            };
        }
        KeyCode::Char(digit @ '1'..='4') => {
            let index = digit as usize - '1' as usize;
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SelectStatus(StatusFilter::ALL[index]),
            );
        }
        KeyCode::Char('s') => {
            dispatch_and_refresh(state, runtime, view_data, internal_tx, AppCommand::ToggleSort);
        }
        KeyCode::Char('p') => dispatch_and_refresh(
            state,
            runtime,
            view_data,
            internal_tx,
            AppCommand::ToggleKeywordFilter,
        ),
        KeyCode::Char('e') => export_visible(state, runtime, view_data, internal_tx),
        KeyCode::Char('h') => hide_selected(state, runtime, view_data, internal_tx),
        KeyCode::Delete => request_remove_selected(view_data),
        KeyCode::Down | KeyCode::Char('j') => {
            move_selection(state, runtime, view_data, internal_tx, NavDirection::Next);
        }
        KeyCode::Up | KeyCode::Char('k') => {
            move_selection(state, runtime, view_data, internal_tx, NavDirection::Prev);
        }
        KeyCode::PageDown => {
            view_data.detail_scroll = view_data.detail_scroll.saturating_add(DETAIL_PAGE_LINES);
        }
        KeyCode::PageUp => {
            view_data.detail_scroll = view_data.detail_scroll.saturating_sub(DETAIL_PAGE_LINES);
        }
        _ => {}
    }
    false
}

fn handle_overlay_key<R: AppRuntime>(
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    overlay: Overlay,
    key: KeyEvent,
) {
    match overlay {
        Overlay::Alert(_) => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                view_data.overlay = None;
            }
        }
        Overlay::ConfirmRemove(id) => match key.code {
            KeyCode::Char('s') | KeyCode::Char('y') | KeyCode::Enter => {
                confirm_remove(runtime, view_data, internal_tx, id);
            }
            KeyCode::Char('n') | KeyCode::Esc => {
                debug!(%id, "removal declined");
                view_data.overlay = None;
            }
            _ => {}
        },
    }
}

fn handle_search_key<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) {
    match key.code {
        KeyCode::Enter => {
            view_data.search.active = false;
            let text = std::mem::take(&mut view_data.search.buffer);
            dispatch_and_refresh(
                state,
                runtime,
                view_data,
                internal_tx,
                AppCommand::SubmitSearch(text),
            );
        }
        KeyCode::Esc => {
            view_data.search = SearchInput::default();
        }
        KeyCode::Backspace => {
            view_data.search.buffer.pop();
        }
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            view_data.search.buffer.push(ch);
        }
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &mut ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let toolbar = Paragraph::new(toolbar_lines(state, view_data))
        .block(Block::default().title("protocolos").borders(Borders::ALL));
    frame.render_widget(toolbar, layout[0]);

    let panes = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(layout[1]);
    render_list(frame, panes[0], view_data);

    let detail = Paragraph::new(detail_lines(&view_data.detail))
        .block(
            Block::default()
                .title(detail_title(&view_data.detail))
                .borders(Borders::ALL),
        )
        .wrap(Wrap { trim: false })
        .scroll((view_data.detail_scroll, 0));
    frame.render_widget(detail, panes[1]);

    let status_widget = Paragraph::new(status_text(state, view_data))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status_widget, layout[2]);

    if view_data.startup == StartupPhase::Instructions {
        let area = centered_rect(70, 50, frame.area());
        frame.render_widget(Clear, area);
        let instructions = Paragraph::new(instructions_text())
            .wrap(Wrap { trim: false })
            .block(Block::default().title("bem-vindo").borders(Borders::ALL));
        frame.render_widget(instructions, area);
    }

    if let Some(overlay) = &view_data.overlay {
        let area = centered_rect(60, 25, frame.area());
        frame.render_widget(Clear, area);
        let (title, body) = overlay_text(overlay);
        let popup = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title)
                    .borders(Borders::ALL)
                    .style(Style::default().fg(Color::Cyan)),
            );
        frame.render_widget(popup, area);
    }
}

fn render_list(frame: &mut ratatui::Frame<'_>, area: Rect, view_data: &mut ViewData) {
    let title = format!("lista ({})", view_data.list.visible_len());
    let block = Block::default().title(title).borders(Borders::ALL);

    if let Some(message) = list_placeholder(view_data) {
        let placeholder = Paragraph::new(Span::styled(
            message.to_owned(),
            Style::default().add_modifier(Modifier::ITALIC),
        ))
        .wrap(Wrap { trim: false })
        .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let items: Vec<ListItem<'_>> = view_data
        .list
        .visible()
        .map(|entry| ListItem::new(entry.record.label()))
        .collect();
    let height = usize::from(area.height.saturating_sub(2));
    view_data.list_offset = list_viewport_offset(
        view_data.list_offset,
        view_data.list.selected_index(),
        height,
        items.len(),
    );

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");
    let mut list_state = ListState::default()
        .with_offset(view_data.list_offset)
        .with_selected(view_data.list.selected_index());
    frame.render_stateful_widget(list, area, &mut list_state);
}

fn list_placeholder(view_data: &ViewData) -> Option<&str> {
    if let Some(message) = &view_data.list_message {
        return Some(message.as_str());
    }
    if view_data.startup == StartupPhase::Ready && view_data.list.is_empty() {
        return Some(MSG_EMPTY_LIST);
    }
    None
}

/// Scrolls just enough to keep `selected` inside a window of `height` rows.
fn list_viewport_offset(
    offset: usize,
    selected: Option<usize>,
    height: usize,
    len: usize,
) -> usize {
    if height == 0 || len == 0 {
        return 0;
    }
    let mut offset = offset.min(len.saturating_sub(height));
    if let Some(selected) = selected {
        if selected < offset {
            offset = selected;
        } else if selected >= offset + height {
            offset = selected + 1 - height;
        }
    }
    offset
}

fn toolbar_lines(state: &AppState, view_data: &ViewData) -> Vec<Line<'static>> {
    let active = Style::default()
        .fg(Color::Black)
        .bg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let idle = Style::default().fg(Color::White);

    let search = if view_data.search.active {
        format!("{}_", view_data.search.buffer)
    } else if state.filter.search_term().is_empty() {
        "(vazia)".to_owned()
    } else {
        state.filter.search_term().to_owned()
    };
    let search_style = if view_data.search.active { active } else { idle };

    let first = Line::from(vec![
        Span::raw("busca: "),
        Span::styled(search, search_style),
        Span::raw("  "),
        Span::styled(
            "Palavras-chave",
            if state.filter.keyword_filter {
                active
            } else {
                idle
            },
        ),
        Span::raw("  ordem: "),
        Span::styled(state.filter.sort_order.label(), idle),
    ]);

    let mut filters = Vec::new();
    for (index, status) in StatusFilter::ALL.iter().enumerate() {
        if index > 0 {
            filters.push(Span::raw("  "));
        }
        let style = if *status == state.filter.status {
            active
        } else {
            idle
        };
        filters.push(Span::styled(
            format!("{} {}", index + 1, filter_label(*status, view_data.totals)),
            style,
        ));
    }

    vec![first, Line::from(filters)]
}

fn filter_label(status: StatusFilter, totals: Option<Totals>) -> String {
    match totals {
        Some(totals) => format!("{} ({})", status.label(), status.count(&totals)),
        None => status.label().to_owned(),
    }
}

fn detail_title(detail: &DetailPane) -> String {
    match detail {
        DetailPane::Loaded { id, .. } => format!("protocolo {id}"),
        DetailPane::Message(_) => "detalhe".to_owned(),
    }
}

fn detail_lines(detail: &DetailPane) -> Vec<Line<'static>> {
    let (id, detail) = match detail {
        DetailPane::Message(message) => {
            return vec![Line::from(Span::styled(
                message.clone(),
                Style::default().add_modifier(Modifier::ITALIC),
            ))];
        }
        DetailPane::Loaded { id, detail } => (id, detail),
    };
    let label = Style::default().add_modifier(Modifier::BOLD);

    let mut lines = Vec::new();
    if let Some(last_update) = &detail.last_update {
        lines.push(Line::from(vec![
            Span::styled("Última Atualização: ", label),
            Span::raw(last_update.clone()),
        ]));
    }
    if let Some(archived) = detail.archived {
        let color = match archived {
            ArchivedStatus::Yes => Color::Green,
            ArchivedStatus::No => Color::Red,
        };
        lines.push(Line::from(vec![
            Span::styled("Arquivado: ", label),
            Span::styled(
                archived.label(),
                Style::default().fg(color).add_modifier(Modifier::BOLD),
            ),
        ]));
    }
    if !lines.is_empty() {
        lines.push(Line::default());
    }
    debug!(%id, bytes = detail.html.len(), "render protocol detail");
    lines.extend(markup::markup_lines(&detail.html));
    lines
}

fn overlay_text(overlay: &Overlay) -> (&'static str, String) {
    match overlay {
        Overlay::ConfirmRemove(id) => (
            "remover",
            format!("{MSG_CONFIRM_REMOVE}\n\n{id}\n\ns/enter confirmar | n/esc cancelar"),
        ),
        Overlay::Alert(message) => ("aviso", format!("{message}\n\nenter/esc fechar")),
    }
}

fn instructions_text() -> &'static str {
    "Consulta de protocolos\n\n\
     / buscar (enter confirma, esc cancela)\n\
     1-4 filtrar: todos, arquivados, não arquivados, AMABRE\n\
     s alternar ordem A-Z / Z-A\n\
     p filtro de palavras-chave\n\
     ↑/↓ ou j/k navegar, pgup/pgdn rolar o detalhe\n\
     e exportar os protocolos visíveis\n\
     h ocultar o protocolo selecionado\n\
     delete remover o protocolo selecionado\n\
     ctrl+q sair\n\n\
     Pressione enter para começar."
}

fn status_text(state: &AppState, view_data: &ViewData) -> String {
    if view_data.overlay.is_some() || view_data.startup == StartupPhase::Instructions {
        return String::new();
    }
    if view_data.search.active {
        return "BUSCA | enter buscar | esc cancelar".to_owned();
    }

    let default = "/ busca | 1-4 filtro | s ordem | p palavras | j/k nav | e exportar | h ocultar | del remover | ctrl+q";
    match &state.status_line {
        Some(status) => format!("{status} | {default}"),
        None => default.to_owned(),
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
