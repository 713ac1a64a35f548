use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Frame;
use strum_macros::Display;

use crate::api::ApiService;
use crate::config::AppConfig;
use crate::internal::audio::{AudioPlayer, AudioSink, CommandSink, PlaybackKey};
use crate::internal::list::RemoteList;
use crate::internal::models::{AnalysisResult, HistoryEntry, MonumentSummary, SelectedImage};
use crate::internal::notification::Notification;
use crate::internal::ui::keybindings::{KeyBindingMap, create_default_keybindings};
use crate::internal::upload;
use crate::internal::workflow::{ANALYSIS_FAILED_MESSAGE, Workflow};
use crate::utils::theme_loader::{TuiTheme, theme_from_config};

pub const MONUMENTS_FAILED_MESSAGE: &str = "Failed to load monuments. Please try again.";
pub const HISTORY_FAILED_MESSAGE: &str = "Failed to load history. Please try again.";
pub const DELETE_FAILED_MESSAGE: &str = "Failed to delete history entry. Please try again.";
pub const AUDIO_FAILED_MESSAGE: &str = "Could not start audio playback.";

/// Top level tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Page {
    Home,
    Explore,
    History,
    About,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Home, Page::Explore, Page::History, Page::About];

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, PartialEq, Clone, Copy)]
pub enum InputMode {
    Normal,
    /// Typing a file path for the browse entry point.
    PathEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online,
    Offline,
}

/// Messages sent through the app action channel: key bindings on one side,
/// completed background tasks on the other.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Quit,
    NextPage,
    PrevPage,
    ShowPage(Page),
    ToggleHelp,
    NavigateUp,
    NavigateDown,
    BrowseImage,
    ImageDropped(String),
    ImageLoaded(SelectedImage),
    ImageLoadFailed(String),
    ClearImage,
    Analyze,
    AnalysisFinished(Result<AnalysisResult, String>),
    ToggleAudio,
    OpenReference,
    OpenImage,
    Refresh,
    MonumentsLoaded {
        seq: u64,
        result: Result<Vec<MonumentSummary>, String>,
    },
    HistoryLoaded {
        seq: u64,
        result: Result<Vec<HistoryEntry>, String>,
    },
    DeleteSelected,
    HistoryEntryDeleted {
        id: String,
        result: Result<(), String>,
    },
    HealthChecked(bool),
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub app_version: String,
    pub page: Page,
    pub input_mode: InputMode,
    pub path_input: String,
    pub workflow: Workflow,
    pub monuments: RemoteList<MonumentSummary>,
    pub history: RemoteList<HistoryEntry>,
    /// History ids with a delete request in flight.
    pub pending_deletes: HashSet<String>,
    pub audio: AudioPlayer,
    pub api_service: Arc<ApiService>,
    pub backend_status: BackendStatus,
    pub theme: TuiTheme,
    pub notification: Option<Notification>,
    pub spinner_state: usize,
    pub last_spinner_update: Option<tokio::time::Instant>,
    pub show_help: bool,
    pub config: AppConfig,
    pub keybindings: KeyBindingMap,
    pub action_tx: UnboundedSender<Action>,
    pub action_rx: UnboundedReceiver<Action>,
}

impl App {
    pub fn new(config: AppConfig) -> Result<Self> {
        let sink = CommandSink::new(config.audio.player.clone(), config.audio.args.clone());
        Self::with_audio_sink(config, Box::new(sink))
    }

    #[tracing::instrument(skip_all, fields(base_url = %config.api.base_url))]
    pub fn with_audio_sink(config: AppConfig, sink: Box<dyn AudioSink>) -> Result<Self> {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let api_service = Arc::new(
            ApiService::new(&config.api).context("invalid backend settings in `api` config")?,
        );
        let theme = theme_from_config(&config);

        Ok(Self {
            running: true,
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            page: Page::Home,
            input_mode: InputMode::Normal,
            path_input: String::new(),
            workflow: Workflow::new(),
            monuments: RemoteList::new(MONUMENTS_FAILED_MESSAGE),
            history: RemoteList::new(HISTORY_FAILED_MESSAGE),
            pending_deletes: HashSet::new(),
            audio: AudioPlayer::new(sink),
            api_service,
            backend_status: BackendStatus::Unknown,
            theme,
            notification: None,
            spinner_state: 0,
            last_spinner_update: None,
            show_help: false,
            config,
            keybindings: create_default_keybindings(),
            action_tx,
            action_rx,
        })
    }

    pub fn notify_warning(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::warning(message));
    }

    pub fn notify_error(&mut self, message: impl Into<String>) {
        self.notification = Some(Notification::error(message));
    }

    pub fn clear_notification(&mut self) {
        self.notification = None;
    }

    pub async fn run(&mut self, mut tui: crate::tui::Tui) -> Result<()> {
        self.check_backend_health();

        let mut event_interval = tokio::time::interval(std::time::Duration::from_millis(16));

        loop {
            let now = tokio::time::Instant::now();
            match self.last_spinner_update {
                Some(last) if now.duration_since(last).as_millis() >= 100 => {
                    self.spinner_state = self.spinner_state.wrapping_add(1);
                    self.last_spinner_update = Some(now);
                }
                Some(_) => {}
                None => self.last_spinner_update = Some(now),
            }

            if let Some(notification) = &self.notification
                && notification.should_dismiss()
            {
                self.clear_notification();
            }

            if self.audio.poll() {
                tracing::debug!("Audio playback finished");
            }

            tui.draw(|f| self.ui(f))?;

            tokio::select! {
                _ = event_interval.tick() => {
                    if event::poll(std::time::Duration::from_millis(0))? {
                        self.handle_event(event::read()?);
                    }
                }
                Some(action) = self.action_rx.recv() => {
                    self.handle_action(action).await;
                }
            }

            if !self.running {
                break;
            }
        }

        self.audio.stop();
        Ok(())
    }

    pub fn handle_event(&mut self, event: Event) {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key_event(key),
            Event::Paste(text) => match self.input_mode {
                InputMode::PathEntry => self.path_input.push_str(text.trim_end()),
                InputMode::Normal if self.page == Page::Home => {
                    let _ = self.action_tx.send(Action::ImageDropped(text));
                }
                InputMode::Normal => {}
            },
            _ => {}
        }
    }

    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.show_help {
            if matches!(
                key.code,
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?')
            ) {
                self.show_help = false;
            }
            return;
        }

        match self.input_mode {
            InputMode::PathEntry => self.handle_path_input(key),
            InputMode::Normal => {
                if let Some(action) = self.keybindings.get_action(&key, self.page) {
                    let _ = self.action_tx.send(action);
                }
            }
        }
    }

    fn handle_path_input(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.path_input.push(c),
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            KeyCode::Esc => {
                self.path_input.clear();
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Enter => {
                let raw = std::mem::take(&mut self.path_input);
                self.input_mode = InputMode::Normal;
                match expand_typed_path(&raw) {
                    Some(path) if upload::is_image_path(&path) => self.spawn_image_load(path),
                    Some(path) => {
                        tracing::info!(path = %path.display(), "Rejected non-image path");
                        self.notify_warning("Please choose an image file (JPG, PNG, GIF, WebP).");
                    }
                    None => {}
                }
            }
            _ => {}
        }
    }

    pub async fn handle_action(&mut self, action: Action) {
        match action {
            Action::Quit => {
                self.audio.stop();
                self.running = false;
            }
            Action::NextPage => self.enter_page(self.page.next()),
            Action::PrevPage => self.enter_page(self.page.prev()),
            Action::ShowPage(page) => self.enter_page(page),
            Action::ToggleHelp => self.show_help = !self.show_help,
            Action::NavigateUp => match self.page {
                Page::Explore => self.monuments.select_prev(),
                Page::History => self.history.select_prev(),
                _ => {}
            },
            Action::NavigateDown => match self.page {
                Page::Explore => self.monuments.select_next(),
                Page::History => self.history.select_next(),
                _ => {}
            },
            Action::BrowseImage => {
                if self.workflow.is_processing() {
                    tracing::debug!("Browse ignored while analyzing");
                    return;
                }
                self.path_input.clear();
                self.input_mode = InputMode::PathEntry;
            }
            Action::ImageDropped(text) => {
                if self.workflow.is_processing() {
                    tracing::debug!("Drop ignored while analyzing");
                    return;
                }
                match upload::first_dropped_path(&text) {
                    Some(path) => self.spawn_image_load(path),
                    None => tracing::debug!("Paste did not contain a path"),
                }
            }
            Action::ImageLoaded(image) => {
                let filename = image.filename.clone();
                match self.workflow.select_image(image) {
                    Ok(()) => {
                        if self.audio.is_playing(&PlaybackKey::ResultCard) {
                            self.audio.stop();
                        }
                        tracing::info!(%filename, "Image selected");
                    }
                    Err(e) => tracing::debug!(%filename, "Image selection rejected: {}", e),
                }
            }
            Action::ImageLoadFailed(message) => self.notify_error(message),
            Action::ClearImage => match self.workflow.clear() {
                Ok(()) => {
                    if self.audio.is_playing(&PlaybackKey::ResultCard) {
                        self.audio.stop();
                    }
                }
                Err(e) => tracing::debug!("Clear rejected: {}", e),
            },
            Action::Analyze => match self.workflow.begin_analysis() {
                Ok(image) => self.spawn_analysis(image),
                Err(e) => tracing::debug!("Analyze ignored: {}", e),
            },
            Action::AnalysisFinished(outcome) => {
                let outcome = outcome.map_err(|cause| {
                    tracing::warn!(%cause, "Image analysis failed");
                    ANALYSIS_FAILED_MESSAGE.to_string()
                });
                if !self.workflow.finish_analysis(outcome) {
                    tracing::warn!("Analysis result arrived with no analysis in flight");
                }
            }
            Action::ToggleAudio => self.toggle_audio(),
            Action::OpenReference => {
                let url = match self.page {
                    Page::Home => self
                        .workflow
                        .result()
                        .and_then(|r| r.reference_url.clone()),
                    Page::Explore => self
                        .monuments
                        .selected()
                        .and_then(|m| m.reference_url.clone()),
                    _ => None,
                };
                self.open_resource(url);
            }
            Action::OpenImage => {
                let url = match self.page {
                    Page::Home => self.workflow.result().and_then(|r| r.image_url.clone()),
                    Page::Explore => self.monuments.selected().map(|m| m.image.clone()),
                    Page::History => self.history.selected().and_then(|h| h.image_url.clone()),
                    Page::About => None,
                };
                self.open_resource(url);
            }
            Action::Refresh => match self.page {
                Page::Explore => self.load_monuments(),
                Page::History => self.load_history(),
                _ => {}
            },
            Action::MonumentsLoaded { seq, result } => {
                self.monuments.apply(seq, result);
            }
            Action::HistoryLoaded { seq, result } => {
                self.history.apply(seq, result);
            }
            Action::DeleteSelected => {
                if self.page != Page::History {
                    return;
                }
                if let Some(id) = self.history.selected().map(|e| e.id.clone())
                    && self.pending_deletes.insert(id.clone())
                {
                    self.spawn_delete(id);
                }
            }
            Action::HistoryEntryDeleted { id, result } => {
                self.pending_deletes.remove(&id);
                match result {
                    Ok(()) => {
                        self.history.remove_first(|e| e.id == id);
                    }
                    Err(cause) => {
                        tracing::warn!(%id, %cause, "History delete failed; entry kept");
                        self.notify_error(DELETE_FAILED_MESSAGE);
                    }
                }
            }
            Action::HealthChecked(online) => {
                self.backend_status = match online {
                    true => BackendStatus::Online,
                    false => BackendStatus::Offline,
                };
            }
        }
    }

    /// Switch tabs. Entering a list page fetches it, like mounting a page.
    fn enter_page(&mut self, page: Page) {
        if page == self.page {
            return;
        }
        tracing::debug!(from = %self.page, to = %page, "Page change");
        self.page = page;
        match page {
            Page::Explore => self.load_monuments(),
            Page::History => self.load_history(),
            _ => {}
        }
    }

    fn spawn_image_load(&self, path: PathBuf) {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let action = match upload::load_image(&path).await {
                Ok(image) => Action::ImageLoaded(image),
                Err(e) => {
                    tracing::warn!("Image load failed: {:#}", e);
                    Action::ImageLoadFailed(format!("Could not read {}", path.display()))
                }
            };
            let _ = tx.send(action);
        });
    }

    fn spawn_analysis(&self, image: SelectedImage) {
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let outcome = api.identify(&image).await.map_err(|e| {
                tracing::warn!(kind = e.kind(), "identify failed: {}", e);
                e.to_string()
            });
            let _ = tx.send(Action::AnalysisFinished(outcome));
        });
    }

    pub fn load_monuments(&mut self) {
        let seq = self.monuments.begin_fetch();
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_monuments().await.map_err(|e| {
                tracing::warn!(kind = e.kind(), "explore fetch failed: {}", e);
                e.to_string()
            });
            let _ = tx.send(Action::MonumentsLoaded { seq, result });
        });
    }

    pub fn load_history(&mut self) {
        let seq = self.history.begin_fetch();
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = api.fetch_history().await.map_err(|e| {
                tracing::warn!(kind = e.kind(), "history fetch failed: {}", e);
                e.to_string()
            });
            let _ = tx.send(Action::HistoryLoaded { seq, result });
        });
    }

    fn spawn_delete(&self, id: String) {
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let result = api
                .delete_history_entry(&id)
                .await
                .map_err(|e| e.to_string());
            let _ = tx.send(Action::HistoryEntryDeleted { id, result });
        });
    }

    fn check_backend_health(&self) {
        let api = self.api_service.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let online = match api.check_health().await {
                Ok(status) => status.is_healthy(),
                Err(e) => {
                    tracing::info!(kind = e.kind(), "Backend health check failed: {}", e);
                    false
                }
            };
            let _ = tx.send(Action::HealthChecked(online));
        });
    }

    fn toggle_audio(&mut self) {
        let target = match self.page {
            Page::Home => self
                .workflow
                .result()
                .and_then(|r| r.audio_url.clone())
                .map(|url| (PlaybackKey::ResultCard, url)),
            Page::Explore => self.monuments.selected().and_then(|m| {
                m.audio_preview_url
                    .clone()
                    .map(|url| (PlaybackKey::Monument(m.id.clone()), url))
            }),
            _ => None,
        };
        let Some((key, raw_url)) = target else {
            return;
        };
        let Some(url) = self.api_service.resolve_resource_url(&raw_url) else {
            tracing::warn!(%raw_url, "Unusable audio URL");
            return;
        };
        if let Err(e) = self.audio.toggle(key, url.as_str()) {
            tracing::error!("Audio playback failed: {:#}", e);
            self.notify_error(AUDIO_FAILED_MESSAGE);
        }
    }

    fn open_resource(&mut self, raw: Option<String>) {
        let Some(url) = raw.and_then(|r| self.api_service.resolve_resource_url(&r)) else {
            return;
        };
        if let Err(e) = open::that(url.as_str()) {
            tracing::error!(%url, "Failed to open browser: {}", e);
            self.notify_error(format!("Could not open {}", url));
        }
    }

    pub fn get_spinner_char(&self) -> &'static str {
        const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        SPINNER_FRAMES[self.spinner_state % SPINNER_FRAMES.len()]
    }

    pub fn loading_description(&self) -> Option<&'static str> {
        match (
            self.workflow.is_processing(),
            self.monuments.is_loading(),
            self.history.is_loading(),
        ) {
            (true, _, _) => Some("Analyzing image..."),
            (_, true, _) if self.page == Page::Explore => Some("Loading monuments..."),
            (_, _, true) if self.page == Page::History => Some("Loading history..."),
            _ => None,
        }
    }

    pub fn ui(&mut self, f: &mut Frame) {
        super::view::draw(self, f);
    }
}

/// Turn what the user typed into a path: trims, strips one pair of quotes,
/// expands a leading `~/`.
fn expand_typed_path(raw: &str) -> Option<PathBuf> {
    let trimmed = raw.trim();
    let unquoted = ['"', '\'']
        .iter()
        .find_map(|q| {
            trimmed
                .strip_prefix(*q)
                .and_then(|rest| rest.strip_suffix(*q))
        })
        .unwrap_or(trimmed);
    if unquoted.is_empty() {
        return None;
    }
    match unquoted.strip_prefix("~/") {
        Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
        None => Some(PathBuf::from(unquoted)),
    }
}
