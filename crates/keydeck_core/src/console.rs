use crate::error::ConsoleError;
use crate::key_table::{KeyFilter, SortKey};
use crate::key_value::{KeyType, KeyWriteRequest, NO_EXPIRY, normalize_ttl};
use crate::listing;
use crate::pagination::PageMeta;
use crate::preferences::{PreferenceStore, Preferences, Theme};
use crate::render::TableView;
use crate::state::KeyTableState;
use crate::stats::{ConnectionStatus, ServerStats, StatsTicket, StatsTracker, StatsUpdate};
use crate::traits::ConsoleBackend;
use crate::value_format::{self, KeyView};
use chrono::{DateTime, Local};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Info,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub at: DateTime<Local>,
}

/// Contents of the add/edit dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditForm {
    pub key: String,
    pub key_type: KeyType,
    pub text: String,
    pub ttl: i64,
    /// False when the form was opened on an existing key.
    pub is_new: bool,
}

impl EditForm {
    pub fn new_key() -> Self {
        Self {
            key: String::new(),
            key_type: KeyType::String,
            text: String::new(),
            ttl: NO_EXPIRY,
            is_new: true,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    pub fn with_key_type(mut self, key_type: KeyType) -> Self {
        self.key_type = key_type;
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_ttl(mut self, ttl: i64) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn placeholder(&self) -> &'static str {
        self.key_type.edit_placeholder()
    }

    pub fn hint(&self) -> &'static str {
        self.key_type.edit_hint()
    }

    /// Validate the form and build the write it describes.
    pub fn to_write_request(&self) -> Result<KeyWriteRequest, ConsoleError> {
        if self.key.trim().is_empty() {
            return Err(ConsoleError::MissingKey);
        }

        let value = value_format::parse_edit_text(self.key_type, &self.text)?;
        Ok(KeyWriteRequest::new(self.key.as_str(), self.key_type, value.to_wire())
            .with_ttl(normalize_ttl(self.ttl)))
    }
}

/// A destructive request waiting for the operator's confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingConfirmation {
    DeleteKey(String),
    Flush,
}

impl PendingConfirmation {
    pub fn prompt(&self) -> String {
        match self {
            PendingConfirmation::DeleteKey(key) => format!("Delete key '{}'?", key),
            PendingConfirmation::Flush => {
                "Delete ALL keys in the current database? This cannot be undone.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleAction {
    SetFilter(KeyFilter),
    SetSort(SortKey),
    NextPage,
    PrevPage,
    GoToPage(usize),
    ResetFilters,
    /// Glob pattern; empty means `*`.
    Search(String),
    View(String),
    BeginAdd,
    BeginEdit(String),
    Submit(EditForm),
    RequestDelete(String),
    RequestFlush,
    Confirm,
    Cancel,
    Reload,
    CheckConnection,
    TickStats,
    ToggleTheme,
}

/// What the front end should show after an action.
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    Table(TableView),
    View(KeyView),
    Form(EditForm),
    Confirm(PendingConfirmation),
    Stats(StatsUpdate),
    Theme(Theme),
    /// Whether the admin service reached the store.
    Connection(bool),
    /// Nothing to show, e.g. `Confirm` with no pending request.
    Idle,
    /// The action failed; the message was also pushed as a notification.
    Failed(String),
}

/// The console session: key table state, stats, theme and pending
/// confirmation, driven by [`ConsoleAction`]s against a backend.
pub struct Console {
    backend: Arc<dyn ConsoleBackend>,
    preferences: Box<dyn PreferenceStore>,
    table: KeyTableState,
    stats: StatsTracker,
    theme: Theme,
    pending: Option<PendingConfirmation>,
    notifications: Vec<Notification>,
}

impl Console {
    pub fn new(
        backend: Arc<dyn ConsoleBackend>,
        preferences: Box<dyn PreferenceStore>,
        page_size: usize,
    ) -> Self {
        let theme = match preferences.load() {
            Ok(prefs) => prefs.theme,
            Err(e) => {
                log::warn!("Failed to load preferences: {}", e);
                Theme::default()
            }
        };

        log::info!("Console for {} (theme {})", backend.describe(), theme.as_str());

        Self {
            backend,
            preferences,
            table: KeyTableState::new(page_size),
            stats: StatsTracker::new(),
            theme,
            pending: None,
            notifications: Vec::new(),
        }
    }

    pub fn table(&self) -> &KeyTableState {
        &self.table
    }

    pub fn render(&self) -> TableView {
        self.table.render()
    }

    pub fn page_meta(&self) -> PageMeta {
        self.table.page_meta()
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn pending(&self) -> Option<&PendingConfirmation> {
        self.pending.as_ref()
    }

    pub fn latest_stats(&self) -> Option<&ServerStats> {
        self.stats.latest()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.stats.status()
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub async fn dispatch(&mut self, action: ConsoleAction) -> ActionOutcome {
        log::debug!("Dispatching {:?}", action);

        match action {
            ConsoleAction::SetFilter(filter) => self.set_filter(filter),
            ConsoleAction::SetSort(sort) => self.set_sort(sort),
            ConsoleAction::NextPage => self.next_page(),
            ConsoleAction::PrevPage => self.prev_page(),
            ConsoleAction::GoToPage(page) => self.go_to_page(page),
            ConsoleAction::ResetFilters => self.reset_filters(),
            ConsoleAction::Search(pattern) => self.search(&pattern).await,
            ConsoleAction::View(key) => self.view(&key).await,
            ConsoleAction::BeginAdd => self.begin_add(),
            ConsoleAction::BeginEdit(key) => self.begin_edit(&key).await,
            ConsoleAction::Submit(form) => self.submit(form).await,
            ConsoleAction::RequestDelete(key) => self.request_delete(key),
            ConsoleAction::RequestFlush => self.request_flush(),
            ConsoleAction::Confirm => self.confirm().await,
            ConsoleAction::Cancel => self.cancel(),
            ConsoleAction::Reload => self.reload().await,
            ConsoleAction::CheckConnection => self.check_connection().await,
            ConsoleAction::TickStats => self.tick_stats().await,
            ConsoleAction::ToggleTheme => self.toggle_theme(),
        }
    }

    pub fn set_filter(&mut self, filter: KeyFilter) -> ActionOutcome {
        self.table.set_filter(filter);
        ActionOutcome::Table(self.table.render())
    }

    pub fn set_sort(&mut self, sort: SortKey) -> ActionOutcome {
        self.table.set_sort(sort);
        ActionOutcome::Table(self.table.render())
    }

    pub fn next_page(&mut self) -> ActionOutcome {
        self.table.next_page();
        ActionOutcome::Table(self.table.render())
    }

    pub fn prev_page(&mut self) -> ActionOutcome {
        self.table.prev_page();
        ActionOutcome::Table(self.table.render())
    }

    pub fn go_to_page(&mut self, page: usize) -> ActionOutcome {
        self.table.go_to_page(page);
        ActionOutcome::Table(self.table.render())
    }

    pub fn reset_filters(&mut self) -> ActionOutcome {
        self.table.reset_filters();
        ActionOutcome::Table(self.table.render())
    }

    /// Replace the key snapshot with a fresh listing.
    pub async fn reload(&mut self) -> ActionOutcome {
        match self.backend.list_keys().await {
            Ok(raw) => {
                self.table.replace_keys(listing::normalize(raw));
                ActionOutcome::Table(self.table.render())
            }
            Err(e) => self.fail("Failed to load keys", e),
        }
    }

    pub async fn search(&mut self, pattern: &str) -> ActionOutcome {
        let pattern = match pattern.trim() {
            "" => "*",
            trimmed => trimmed,
        };

        let matches = match self.backend.search(pattern).await {
            Ok(matches) => matches,
            Err(e) => return self.fail("Search failed", e),
        };

        if matches.is_empty() {
            self.notify(NotificationLevel::Info, "No keys found");
        } else {
            let kept = self.table.retain_matches(&matches);
            log::info!("Search '{}' matched {} keys, {} listed", pattern, matches.len(), kept);
            self.notify(
                NotificationLevel::Success,
                format!("Found {} keys", matches.len()),
            );
        }

        ActionOutcome::Table(self.table.render())
    }

    pub async fn view(&mut self, key: &str) -> ActionOutcome {
        match self.backend.key_detail(key).await {
            Ok(detail) => ActionOutcome::View(KeyView::from_detail(&detail)),
            Err(e) => self.fail("Failed to load key", e),
        }
    }

    pub fn begin_add(&mut self) -> ActionOutcome {
        ActionOutcome::Form(EditForm::new_key())
    }

    pub async fn begin_edit(&mut self, key: &str) -> ActionOutcome {
        match self.backend.key_detail(key).await {
            Ok(detail) => ActionOutcome::Form(EditForm {
                key: detail.key.clone(),
                key_type: detail.key_type(),
                text: value_format::edit_text(&detail.value),
                ttl: detail.ttl,
                is_new: false,
            }),
            Err(e) => self.fail("Failed to load key", e),
        }
    }

    /// Validate and write the form. The snapshot is refreshed only after
    /// the backend confirms the write.
    pub async fn submit(&mut self, form: EditForm) -> ActionOutcome {
        let request = match form.to_write_request() {
            Ok(request) => request,
            Err(e) => return self.fail("Invalid value", e),
        };

        if let Err(e) = self.backend.set_key(&request).await {
            return self.fail("Failed to save key", e);
        }

        log::info!("Saved key '{}' ({})", request.key, request.key_type);
        self.notify(
            NotificationLevel::Success,
            format!("Key '{}' saved", request.key),
        );
        self.reload().await
    }

    pub fn request_delete(&mut self, key: String) -> ActionOutcome {
        let pending = PendingConfirmation::DeleteKey(key);
        self.pending = Some(pending.clone());
        ActionOutcome::Confirm(pending)
    }

    pub fn request_flush(&mut self) -> ActionOutcome {
        self.pending = Some(PendingConfirmation::Flush);
        ActionOutcome::Confirm(PendingConfirmation::Flush)
    }

    pub async fn confirm(&mut self) -> ActionOutcome {
        let Some(pending) = self.pending.take() else {
            log::debug!("Confirm with nothing pending");
            return ActionOutcome::Idle;
        };

        match pending {
            PendingConfirmation::DeleteKey(key) => {
                if let Err(e) = self.backend.delete_key(&key).await {
                    return self.fail("Failed to delete key", e);
                }
                log::info!("Deleted key '{}'", key);
                self.notify(NotificationLevel::Success, format!("Key '{}' deleted", key));
            }
            PendingConfirmation::Flush => {
                if let Err(e) = self.backend.flush().await {
                    return self.fail("Failed to flush database", e);
                }
                log::info!("Flushed database");
                self.notify(NotificationLevel::Success, "Database flushed");
            }
        }

        self.reload().await
    }

    pub fn cancel(&mut self) -> ActionOutcome {
        if let Some(pending) = self.pending.take() {
            log::debug!("Cancelled: {}", pending.prompt());
        }
        ActionOutcome::Idle
    }

    pub async fn check_connection(&mut self) -> ActionOutcome {
        match self.backend.test_connection().await {
            Ok(true) => {
                self.notify(NotificationLevel::Success, "Connected to the store");
                ActionOutcome::Connection(true)
            }
            Ok(false) => {
                self.notify(NotificationLevel::Error, "No connection to the store");
                ActionOutcome::Connection(false)
            }
            Err(e) => self.fail("Connection check failed", e),
        }
    }

    /// Start a stats poll. Pair with [`Console::apply_stats`] when polls
    /// run outside the console.
    pub fn begin_stats_poll(&mut self) -> StatsTicket {
        self.stats.begin()
    }

    pub fn apply_stats(
        &mut self,
        ticket: StatsTicket,
        result: Result<ServerStats, ConsoleError>,
    ) -> ActionOutcome {
        let update = self.stats.apply(ticket, result);

        match &update {
            StatsUpdate::ConnectionLost => {
                self.notify(NotificationLevel::Error, "Connection to the store lost");
            }
            StatsUpdate::Reconnected => {
                self.notify(NotificationLevel::Success, "Connection restored");
            }
            StatsUpdate::FetchFailed(message) => {
                self.notify(
                    NotificationLevel::Error,
                    format!("Failed to fetch stats: {}", message),
                );
            }
            StatsUpdate::Stale | StatsUpdate::Refreshed | StatsUpdate::StillDisconnected => {}
        }

        ActionOutcome::Stats(update)
    }

    pub async fn tick_stats(&mut self) -> ActionOutcome {
        let ticket = self.begin_stats_poll();
        let result = self.backend.stats().await;
        self.apply_stats(ticket, result)
    }

    pub fn set_theme(&mut self, theme: Theme) -> ActionOutcome {
        self.theme = theme;
        if let Err(e) = self.preferences.save(&Preferences { theme }) {
            log::warn!("Failed to save theme: {}", e);
            self.notify(
                NotificationLevel::Error,
                format!("Theme not saved: {}", e),
            );
        }
        ActionOutcome::Theme(theme)
    }

    pub fn toggle_theme(&mut self) -> ActionOutcome {
        self.set_theme(self.theme.toggled())
    }

    fn notify(&mut self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        log::debug!("[{}] {}", level.as_str(), message);
        self.notifications.push(Notification {
            level,
            message,
            at: Local::now(),
        });
    }

    fn fail(&mut self, context: &str, error: ConsoleError) -> ActionOutcome {
        let message = format!("{}: {}", context, error);
        log::warn!("{}", message);
        self.notify(NotificationLevel::Error, message.clone());
        ActionOutcome::Failed(message)
    }
}
