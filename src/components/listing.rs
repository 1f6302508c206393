// ABOUTME: List/detail view shared by the Resources, Prompts, Tools and Notifications tabs
// ABOUTME: Left side lists item names, right side pretty-prints the selected item as JSON

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use serde::Serialize;

const CORNFLOWER_BLUE: Color = Color::Rgb(100, 149, 237);
const SELECTION_GREEN: Color = Color::Rgb(100, 200, 100);
const DARK_BG: Color = Color::Rgb(25, 25, 35);
const LIST_HIGHLIGHT_BG: Color = Color::Rgb(40, 40, 60);
const SOFT_WHITE: Color = Color::Rgb(220, 220, 230);
const MUTED_GRAY: Color = Color::Rgb(120, 120, 140);
const SUBDUED_BORDER: Color = Color::Rgb(60, 60, 80);

use crate::app::{
    AppState,
    state::{FocusArea, Tab},
};
use crate::mcp::ConnectionStatus;

fn pretty<T: Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("<unprintable: {e}>"))
}

#[derive(Default)]
pub struct ListingComponent {
    list_state: ListState,
}

impl ListingComponent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Labels and the selected item's detail text for `tab`.
    fn rows(state: &AppState, tab: Tab) -> (Vec<String>, Option<String>) {
        let Some(server) = state.selected() else {
            return (Vec::new(), None);
        };
        let selected = state.selection(tab);
        let listing = &server.state;

        match tab {
            Tab::Resources => (
                listing
                    .resources
                    .iter()
                    .map(|r| if r.name.is_empty() { r.uri.clone() } else { r.name.clone() })
                    .collect(),
                listing.resources.get(selected).map(pretty),
            ),
            Tab::Prompts => (
                listing.prompts.iter().map(|p| p.name.clone()).collect(),
                listing.prompts.get(selected).map(pretty),
            ),
            Tab::Tools => (
                listing.tools.iter().map(|t| t.name.clone()).collect(),
                listing.tools.get(selected).map(pretty),
            ),
            Tab::Notifications => {
                let entries = state.notification_entries();
                (
                    entries
                        .iter()
                        .map(|e| {
                            format!(
                                "{} {}",
                                e.timestamp.format("%H:%M:%S"),
                                e.method.as_deref().unwrap_or("?")
                            )
                        })
                        .collect(),
                    entries.get(selected).map(|e| pretty(&e.payload)),
                )
            }
            Tab::History => (Vec::new(), None),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let tab = state.active_tab;
        let is_focused = state.focus == FocusArea::TabContent;
        let (labels, detail) = Self::rows(state, tab);

        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(area);

        let block = |title: String, focused: bool| {
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(if focused { SELECTION_GREEN } else { SUBDUED_BORDER }))
                .style(Style::default().bg(DARK_BG))
                .title(Span::styled(
                    title,
                    Style::default().fg(CORNFLOWER_BLUE).add_modifier(Modifier::BOLD),
                ))
        };

        if labels.is_empty() {
            let message = match state.selected().map(|s| s.state.status) {
                Some(ConnectionStatus::Connected) => format!("No {} available", tab.title().to_lowercase()),
                _ => "Not connected".to_string(),
            };
            let empty = Paragraph::new(Span::styled(message, Style::default().fg(MUTED_GRAY)))
                .block(block(format!(" {} ", tab.title()), is_focused));
            frame.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = labels
            .into_iter()
            .map(|label| ListItem::new(Line::from(Span::styled(label, Style::default().fg(SOFT_WHITE)))))
            .collect();
        self.list_state.select(Some(state.selection(tab)));

        let list = List::new(items)
            .block(block(format!(" {} ", tab.title()), is_focused))
            .highlight_style(Style::default().bg(LIST_HIGHLIGHT_BG))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[0], &mut self.list_state);

        let detail = Paragraph::new(detail.unwrap_or_default())
            .style(Style::default().fg(SOFT_WHITE))
            .wrap(Wrap { trim: false })
            .scroll((state.detail_scroll, 0))
            .block(block(" Details ".to_string(), false));
        frame.render_widget(detail, chunks[1]);
    }
}
