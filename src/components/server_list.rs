// ABOUTME: Server list component showing each configured server with its connection status glyph

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState},
};

// Premium color palette (TUI Style Guide)
const CORNFLOWER_BLUE: Color = Color::Rgb(100, 149, 237);
const GOLD: Color = Color::Rgb(255, 215, 0);
const SELECTION_GREEN: Color = Color::Rgb(100, 200, 100);
const WARNING_ORANGE: Color = Color::Rgb(255, 165, 0);
const ERROR_RED: Color = Color::Rgb(230, 80, 80);
const DARK_BG: Color = Color::Rgb(25, 25, 35);
const LIST_HIGHLIGHT_BG: Color = Color::Rgb(40, 40, 60);
const SOFT_WHITE: Color = Color::Rgb(220, 220, 230);
const MUTED_GRAY: Color = Color::Rgb(120, 120, 140);
const SUBDUED_BORDER: Color = Color::Rgb(60, 60, 80);

use crate::app::{AppState, state::FocusArea};
use crate::mcp::ConnectionStatus;

pub const fn status_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Connected => SELECTION_GREEN,
        ConnectionStatus::Connecting => WARNING_ORANGE,
        ConnectionStatus::Error => ERROR_RED,
        ConnectionStatus::Disconnected => MUTED_GRAY,
    }
}

#[derive(Default)]
pub struct ServerListComponent {
    list_state: ListState,
}

impl ServerListComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let is_focused = state.focus == FocusArea::ServerList;
        let border_color = if is_focused { SELECTION_GREEN } else { SUBDUED_BORDER };

        let items: Vec<ListItem> = state
            .servers
            .iter()
            .map(|server| {
                let status = server.state.status;
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{} ", status.symbol()),
                        Style::default().fg(status_color(status)),
                    ),
                    Span::styled(server.config.name.clone(), Style::default().fg(SOFT_WHITE)),
                ]))
            })
            .collect();

        self.list_state
            .select((!state.servers.is_empty()).then_some(state.selected_server));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(border_color))
                    .style(Style::default().bg(DARK_BG))
                    .title(Line::from(vec![
                        Span::styled(" Servers ", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
                        Span::styled(
                            format!("({})", state.servers.len()),
                            Style::default()
                                .fg(if is_focused { CORNFLOWER_BLUE } else { MUTED_GRAY })
                                .add_modifier(Modifier::BOLD),
                        ),
                    ]))
                    .title_bottom(Line::from(vec![
                        Span::styled(" ↑/↓", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
                        Span::styled(" nav ", Style::default().fg(MUTED_GRAY)),
                        Span::styled("│", Style::default().fg(SUBDUED_BORDER)),
                        Span::styled(" c", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
                        Span::styled(" connect ", Style::default().fg(MUTED_GRAY)),
                        Span::styled("│", Style::default().fg(SUBDUED_BORDER)),
                        Span::styled(" d", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
                        Span::styled(" disconnect ", Style::default().fg(MUTED_GRAY)),
                    ])),
            )
            .highlight_style(Style::default().bg(LIST_HIGHLIGHT_BG))
            .highlight_symbol("▶ ");

        frame.render_stateful_widget(list, area, &mut self.list_state);
    }
}
