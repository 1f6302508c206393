// ABOUTME: Event handling system for keyboard input and app actions

use crate::app::{
    AppState,
    state::{FocusArea, Tab},
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

/// Lines moved by PageUp/PageDown in scrollable panes.
const PAGE_LINES: u16 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Quit,
    ToggleHelp,
    // Focus and navigation
    FocusNext,
    FocusPrevious,
    NextServer,
    PreviousServer,
    NextTab,
    PreviousTab,
    SelectTab(Tab),
    SelectNextItem,
    SelectPreviousItem,
    ScrollDetailUp(u16),
    ScrollDetailDown(u16),
    // Connection actions
    Connect,
    Disconnect,
    Refresh,
    // Command line
    OpenCommand,
    CommandChar(char),
    CommandBackspace,
    CommandSubmit,
    CommandCancel,
}

pub struct EventHandler;

impl EventHandler {
    pub fn handle_key_event(key_event: KeyEvent, state: &mut AppState) -> Option<AppEvent> {
        if key_event.modifiers.contains(KeyModifiers::CONTROL)
            && key_event.code == KeyCode::Char('c')
        {
            return Some(AppEvent::Quit);
        }

        if state.command_input.is_some() {
            return match key_event.code {
                KeyCode::Esc => Some(AppEvent::CommandCancel),
                KeyCode::Enter => Some(AppEvent::CommandSubmit),
                KeyCode::Backspace => Some(AppEvent::CommandBackspace),
                KeyCode::Char(c) => Some(AppEvent::CommandChar(c)),
                _ => None,
            };
        }

        if state.help_visible {
            return match key_event.code {
                KeyCode::Char('?') | KeyCode::Esc => Some(AppEvent::ToggleHelp),
                _ => None,
            };
        }

        match key_event.code {
            KeyCode::Char('?') => Some(AppEvent::ToggleHelp),
            KeyCode::Char('q') => Some(AppEvent::Quit),
            KeyCode::Char('/') => Some(AppEvent::OpenCommand),
            KeyCode::Char('R') => Some(AppEvent::Refresh),
            KeyCode::Tab => Some(AppEvent::FocusNext),
            KeyCode::BackTab => Some(AppEvent::FocusPrevious),
            KeyCode::Char('c') if state.focus == FocusArea::ServerList => Some(AppEvent::Connect),
            KeyCode::Char('d') if state.focus == FocusArea::ServerList => {
                Some(AppEvent::Disconnect)
            }
            KeyCode::Char(c) => Tab::from_key(c).map(AppEvent::SelectTab),
            KeyCode::PageUp => Some(AppEvent::ScrollDetailUp(PAGE_LINES)),
            KeyCode::PageDown => Some(AppEvent::ScrollDetailDown(PAGE_LINES)),
            KeyCode::Left if state.focus == FocusArea::Tabs => Some(AppEvent::PreviousTab),
            KeyCode::Right if state.focus == FocusArea::Tabs => Some(AppEvent::NextTab),
            KeyCode::Up | KeyCode::Down => Self::handle_vertical(key_event.code, state.focus),
            _ => None,
        }
    }

    fn handle_vertical(code: KeyCode, focus: FocusArea) -> Option<AppEvent> {
        let down = code == KeyCode::Down;
        match focus {
            FocusArea::ServerList if down => Some(AppEvent::NextServer),
            FocusArea::ServerList => Some(AppEvent::PreviousServer),
            FocusArea::TabContent | FocusArea::HistoryList if down => {
                Some(AppEvent::SelectNextItem)
            }
            FocusArea::TabContent | FocusArea::HistoryList => Some(AppEvent::SelectPreviousItem),
            FocusArea::HistoryDetail if down => Some(AppEvent::ScrollDetailDown(1)),
            FocusArea::HistoryDetail => Some(AppEvent::ScrollDetailUp(1)),
            FocusArea::Tabs => None,
        }
    }

    pub fn process_event(event: AppEvent, state: &mut AppState) {
        debug!(?event, "Processing event");
        match event {
            AppEvent::Quit => state.quit(),
            AppEvent::ToggleHelp => state.toggle_help(),
            AppEvent::FocusNext => state.focus_next(),
            AppEvent::FocusPrevious => state.focus_previous(),
            AppEvent::NextServer => state.next_server(),
            AppEvent::PreviousServer => state.previous_server(),
            AppEvent::NextTab => state.select_tab(state.active_tab.next()),
            AppEvent::PreviousTab => state.select_tab(state.active_tab.previous()),
            AppEvent::SelectTab(tab) => state.select_tab(tab),
            AppEvent::SelectNextItem => state.select_next_item(),
            AppEvent::SelectPreviousItem => state.select_previous_item(),
            AppEvent::ScrollDetailUp(lines) => state.scroll_detail_up(lines),
            AppEvent::ScrollDetailDown(lines) => state.scroll_detail_down(lines),
            AppEvent::Connect => state.request_connect(),
            AppEvent::Disconnect => state.request_disconnect(),
            AppEvent::Refresh => state.request_refresh(),
            AppEvent::OpenCommand => state.open_command(),
            AppEvent::CommandChar(c) => state.command_push(c),
            AppEvent::CommandBackspace => state.command_backspace(),
            AppEvent::CommandSubmit => state.submit_command(),
            AppEvent::CommandCancel => state.close_command(),
        }
    }
}
