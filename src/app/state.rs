// ABOUTME: Application state for the inspector TUI: selection, focus, tabs, command line and toasts
// ABOUTME: App owns the ConnectionManager and turns queued actions into spawned connect/disconnect tasks

use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::mcp::{
    ConnectionManager, ConnectionState, ConnectionStatus, Direction, InspectorError, MessageEntry,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationType {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub notification_type: NotificationType,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notification {
    pub fn success(message: String) -> Self {
        Self {
            message,
            notification_type: NotificationType::Success,
            created_at: Instant::now(),
            duration: Duration::from_secs(3),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            message,
            notification_type: NotificationType::Error,
            created_at: Instant::now(),
            duration: Duration::from_secs(5),
        }
    }

    pub fn info(message: String) -> Self {
        Self {
            message,
            notification_type: NotificationType::Info,
            created_at: Instant::now(),
            duration: Duration::from_secs(3),
        }
    }

    pub fn warning(message: String) -> Self {
        Self {
            message,
            notification_type: NotificationType::Warning,
            created_at: Instant::now(),
            duration: Duration::from_secs(4),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.duration
    }
}

/// Right-pane tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Resources,
    Prompts,
    Tools,
    Notifications,
    History,
}

impl Tab {
    pub const ALL: [Self; 5] = [
        Self::Resources,
        Self::Prompts,
        Self::Tools,
        Self::Notifications,
        Self::History,
    ];

    pub const fn title(self) -> &'static str {
        match self {
            Self::Resources => "Resources",
            Self::Prompts => "Prompts",
            Self::Tools => "Tools",
            Self::Notifications => "Notifications",
            Self::History => "History",
        }
    }

    /// Single-key accelerator.
    pub const fn key(self) -> char {
        match self {
            Self::Resources => 'r',
            Self::Prompts => 'p',
            Self::Tools => 't',
            Self::Notifications => 'n',
            Self::History => 'h',
        }
    }

    pub fn from_key(c: char) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.key() == c)
    }

    pub fn index(self) -> usize {
        Self::ALL.iter().position(|t| *t == self).unwrap_or(0)
    }

    pub fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn previous(self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusArea {
    ServerList,
    Tabs,
    TabContent,
    HistoryList,
    HistoryDetail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncAction {
    Connect(String),
    Disconnect(String),
    Refresh(String),
}

/// Outcome of a spawned action, reported back to the UI thread.
#[derive(Debug)]
pub struct ActionOutcome {
    pub action: AsyncAction,
    pub result: Result<ConnectionStatus, InspectorError>,
    pub error: Option<String>,
}

/// One row of the server list.
#[derive(Debug, Clone)]
pub struct ServerView {
    pub config: ServerConfig,
    pub state: ConnectionState,
}

pub struct AppState {
    pub servers: Vec<ServerView>,
    pub selected_server: usize,
    pub active_tab: Tab,
    pub focus: FocusArea,
    /// History snapshot of the selected server
    pub history: Vec<MessageEntry>,
    /// Selected row per tab, indexed by `Tab::index`
    pub tab_selection: [usize; 5],
    pub detail_scroll: u16,
    /// `Some` while the `/` command line is open
    pub command_input: Option<String>,
    pub help_visible: bool,
    pub should_quit: bool,
    pub notifications: Vec<Notification>,
    pub pending_async_action: Option<AsyncAction>,
    pub ui_needs_refresh: bool,
}

impl AppState {
    pub fn new(configs: Vec<ServerConfig>) -> Self {
        Self {
            servers: configs
                .into_iter()
                .map(|config| ServerView {
                    config,
                    state: ConnectionState::default(),
                })
                .collect(),
            selected_server: 0,
            active_tab: Tab::Resources,
            focus: FocusArea::ServerList,
            history: Vec::new(),
            tab_selection: [0; 5],
            detail_scroll: 0,
            command_input: None,
            help_visible: false,
            should_quit: false,
            notifications: Vec::new(),
            pending_async_action: None,
            ui_needs_refresh: false,
        }
    }

    pub fn selected(&self) -> Option<&ServerView> {
        self.servers.get(self.selected_server)
    }

    pub fn selected_name(&self) -> Option<String> {
        self.selected().map(|s| s.config.name.clone())
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_help(&mut self) {
        self.help_visible = !self.help_visible;
    }

    pub fn add_notification(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub fn cleanup_expired_notifications(&mut self) {
        let before = self.notifications.len();
        self.notifications.retain(|n| !n.is_expired());
        if self.notifications.len() != before {
            self.ui_needs_refresh = true;
        }
    }

    // Server list

    pub fn next_server(&mut self) {
        if self.servers.is_empty() {
            return;
        }
        self.selected_server = (self.selected_server + 1) % self.servers.len();
        self.on_server_changed();
    }

    pub fn previous_server(&mut self) {
        if self.servers.is_empty() {
            return;
        }
        self.selected_server = (self.selected_server + self.servers.len() - 1) % self.servers.len();
        self.on_server_changed();
    }

    pub fn select_server(&mut self, name: &str) -> bool {
        match self.servers.iter().position(|s| s.config.name == name) {
            Some(idx) => {
                self.selected_server = idx;
                self.on_server_changed();
                true
            }
            None => false,
        }
    }

    fn on_server_changed(&mut self) {
        self.tab_selection = [0; 5];
        self.detail_scroll = 0;
        self.history.clear();
    }

    // Focus and tabs

    fn focus_order(&self) -> &'static [FocusArea] {
        if self.active_tab == Tab::History {
            &[
                FocusArea::ServerList,
                FocusArea::Tabs,
                FocusArea::HistoryList,
                FocusArea::HistoryDetail,
            ]
        } else {
            &[FocusArea::ServerList, FocusArea::Tabs, FocusArea::TabContent]
        }
    }

    pub fn focus_next(&mut self) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(idx + 1) % order.len()];
    }

    pub fn focus_previous(&mut self) {
        let order = self.focus_order();
        let idx = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        self.focus = order[(idx + order.len() - 1) % order.len()];
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active_tab = tab;
        self.detail_scroll = 0;
        // Content focus areas differ between History and the other tabs
        self.focus = match (self.focus, tab) {
            (FocusArea::TabContent, Tab::History) => FocusArea::HistoryList,
            (FocusArea::HistoryList | FocusArea::HistoryDetail, t) if t != Tab::History => {
                FocusArea::TabContent
            }
            (focus, _) => focus,
        };
    }

    // Tab content

    /// Notification entries of the selected server's history.
    pub fn notification_entries(&self) -> Vec<&MessageEntry> {
        self.history
            .iter()
            .filter(|e| e.direction == Direction::Notification)
            .collect()
    }

    pub fn item_count(&self, tab: Tab) -> usize {
        let Some(server) = self.selected() else {
            return 0;
        };
        match tab {
            Tab::Resources => server.state.resources.len(),
            Tab::Prompts => server.state.prompts.len(),
            Tab::Tools => server.state.tools.len(),
            Tab::Notifications => self.notification_entries().len(),
            Tab::History => self.history.len(),
        }
    }

    pub fn selection(&self, tab: Tab) -> usize {
        self.tab_selection[tab.index()]
    }

    pub fn select_next_item(&mut self) {
        let count = self.item_count(self.active_tab);
        let slot = &mut self.tab_selection[self.active_tab.index()];
        if count > 0 && *slot + 1 < count {
            *slot += 1;
            self.detail_scroll = 0;
        }
    }

    pub fn select_previous_item(&mut self) {
        let slot = &mut self.tab_selection[self.active_tab.index()];
        if *slot > 0 {
            *slot -= 1;
            self.detail_scroll = 0;
        }
    }

    pub fn scroll_detail_down(&mut self, lines: u16) {
        self.detail_scroll = self.detail_scroll.saturating_add(lines);
    }

    pub fn scroll_detail_up(&mut self, lines: u16) {
        self.detail_scroll = self.detail_scroll.saturating_sub(lines);
    }

    fn clamp_selections(&mut self) {
        for tab in Tab::ALL {
            let count = self.item_count(tab);
            let slot = &mut self.tab_selection[tab.index()];
            *slot = (*slot).min(count.saturating_sub(1));
        }
    }

    // Connection actions

    pub fn request_connect(&mut self) {
        let Some(server) = self.selected() else {
            return;
        };
        if matches!(
            server.state.status,
            ConnectionStatus::Disconnected | ConnectionStatus::Error
        ) {
            self.pending_async_action = Some(AsyncAction::Connect(server.config.name.clone()));
        }
    }

    pub fn request_disconnect(&mut self) {
        let Some(server) = self.selected() else {
            return;
        };
        if matches!(
            server.state.status,
            ConnectionStatus::Connected | ConnectionStatus::Connecting
        ) {
            self.pending_async_action = Some(AsyncAction::Disconnect(server.config.name.clone()));
        }
    }

    pub fn request_refresh(&mut self) {
        match self.selected() {
            Some(server) if server.state.status == ConnectionStatus::Connected => {
                self.pending_async_action = Some(AsyncAction::Refresh(server.config.name.clone()));
            }
            Some(server) => {
                let name = server.config.name.clone();
                self.add_notification(Notification::warning(format!("{name} is not connected")));
            }
            None => {}
        }
    }

    // Command line

    pub fn open_command(&mut self) {
        self.command_input = Some(String::new());
    }

    pub fn close_command(&mut self) {
        self.command_input = None;
    }

    pub fn command_push(&mut self, c: char) {
        if let Some(input) = self.command_input.as_mut() {
            input.push(c);
        }
    }

    pub fn command_backspace(&mut self) {
        if let Some(input) = self.command_input.as_mut() {
            if input.pop().is_none() {
                self.command_input = None;
            }
        }
    }

    /// Run and close the open command line.
    pub fn submit_command(&mut self) {
        let Some(input) = self.command_input.take() else {
            return;
        };
        self.execute_command(&input);
    }

    pub fn execute_command(&mut self, input: &str) {
        let input = input.trim().trim_start_matches('/');
        let mut parts = input.split_whitespace();
        let Some(command) = parts.next() else {
            return;
        };
        let argument = parts.next();
        debug!(command, ?argument, "Executing command");

        match command {
            "quit" | "exit" | "q" => self.quit(),
            "help" => self.help_visible = true,
            "refresh" => self.request_refresh(),
            "disconnect" => self.request_disconnect(),
            "connect" => match argument {
                Some(name) if !self.select_server(name) => {
                    self.add_notification(Notification::error(format!("Unknown server: {name}")));
                }
                _ => self.request_connect(),
            },
            other => {
                self.add_notification(Notification::error(format!("Unknown command: /{other}")));
            }
        }
    }

    /// Replace snapshots with fresh copies from the manager.
    pub fn apply_snapshots(&mut self, manager: &ConnectionManager) {
        for server in &mut self.servers {
            if let Ok(state) = manager.get_state(&server.config.name) {
                server.state = state;
            }
        }
        self.history = self
            .selected_name()
            .and_then(|name| manager.get_history(&name).ok())
            .unwrap_or_default();
        self.clamp_selections();
    }
}

/// The running application: UI state plus the connection core.
pub struct App {
    pub state: AppState,
    manager: ConnectionManager,
    outcomes_tx: mpsc::UnboundedSender<ActionOutcome>,
    outcomes_rx: mpsc::UnboundedReceiver<ActionOutcome>,
}

impl App {
    pub fn new(manager: ConnectionManager) -> Self {
        let configs = manager.registry().configs().to_vec();
        let (outcomes_tx, outcomes_rx) = mpsc::unbounded_channel();
        let mut app = Self {
            state: AppState::new(configs),
            manager,
            outcomes_tx,
            outcomes_rx,
        };
        app.state.apply_snapshots(&app.manager);
        app
    }

    pub const fn manager(&self) -> &ConnectionManager {
        &self.manager
    }

    /// Periodic work: expire toasts, report finished actions, start queued ones, refresh snapshots.
    pub fn tick(&mut self) {
        self.state.cleanup_expired_notifications();

        while let Ok(outcome) = self.outcomes_rx.try_recv() {
            self.report(outcome);
        }

        if let Some(action) = self.state.pending_async_action.take() {
            self.spawn_action(action);
        }

        self.state.apply_snapshots(&self.manager);
    }

    fn spawn_action(&self, action: AsyncAction) {
        info!(?action, "Starting async action");
        let manager = self.manager.clone();
        let tx = self.outcomes_tx.clone();
        tokio::spawn(async move {
            let (result, name) = match &action {
                AsyncAction::Connect(name) => (manager.connect(name).await, name),
                AsyncAction::Disconnect(name) => (
                    manager
                        .disconnect(name)
                        .await
                        .map(|()| ConnectionStatus::Disconnected),
                    name,
                ),
                AsyncAction::Refresh(name) => (
                    manager.refresh(name).await.map(|replaced| {
                        if replaced {
                            ConnectionStatus::Connected
                        } else {
                            ConnectionStatus::Disconnected
                        }
                    }),
                    name,
                ),
            };
            let error = manager.get_state(name).ok().and_then(|s| s.error);
            // Receiver only goes away on shutdown
            let _ = tx.send(ActionOutcome {
                action,
                result,
                error,
            });
        });
    }

    fn report(&mut self, outcome: ActionOutcome) {
        let notification = match (&outcome.action, &outcome.result) {
            (_, Err(e)) => {
                warn!(error = %e, "Async action failed");
                Notification::error(e.to_string())
            }
            (AsyncAction::Connect(name), Ok(ConnectionStatus::Connected)) => {
                Notification::success(format!("Connected to {name}"))
            }
            (AsyncAction::Connect(name), Ok(ConnectionStatus::Error)) => Notification::error(format!(
                "Failed to connect to {name}: {}",
                outcome.error.as_deref().unwrap_or("unknown error")
            )),
            (AsyncAction::Connect(name), Ok(_)) => {
                Notification::info(format!("Connection to {name} was cancelled"))
            }
            (AsyncAction::Disconnect(name), Ok(_)) => {
                Notification::info(format!("Disconnected from {name}"))
            }
            (AsyncAction::Refresh(name), Ok(ConnectionStatus::Connected)) => {
                Notification::success(format!("Refreshed {name}"))
            }
            (AsyncAction::Refresh(name), Ok(_)) => {
                Notification::info(format!("Nothing refreshed, {name} is not connected"))
            }
        };
        self.state.add_notification(notification);
        self.state.ui_needs_refresh = true;
    }

    /// Check if UI needs immediate refresh and clear the flag
    pub fn needs_ui_refresh(&mut self) -> bool {
        if self.state.ui_needs_refresh {
            self.state.ui_needs_refresh = false;
            true
        } else {
            false
        }
    }

    /// Disconnect every server before exit.
    pub async fn shutdown(&self) {
        self.manager.shutdown().await;
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
