// ABOUTME: Help overlay component displaying keyboard shortcuts and commands

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem},
};

pub struct HelpComponent;

impl HelpComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let popup_area = centered_rect(60, 80, area);

        frame.render_widget(Clear, popup_area);

        let section = |title: &'static str| {
            ListItem::new(title).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD))
        };

        let help_items = vec![
            section("Navigation:"),
            ListItem::new("  Tab/S-Tab  Cycle focus"),
            ListItem::new("  ↑/↓        Move in focused pane"),
            ListItem::new("  ←/→        Switch tab (tab bar focused)"),
            ListItem::new("  r p t n h  Resources/Prompts/Tools/Notifications/History"),
            ListItem::new("  PgUp/PgDn  Scroll details"),
            ListItem::new(""),
            section("Server Actions:"),
            ListItem::new("  c          Connect selected server"),
            ListItem::new("  d          Disconnect selected server"),
            ListItem::new("  R          Refresh listings"),
            ListItem::new(""),
            section("Commands:"),
            ListItem::new("  /connect <name>   Select and connect"),
            ListItem::new("  /disconnect       Disconnect selected"),
            ListItem::new("  /refresh          Refresh listings"),
            ListItem::new("  /help             Show this help"),
            ListItem::new("  /quit, /exit      Quit"),
            ListItem::new(""),
            section("General:"),
            ListItem::new("  ?          Toggle this help"),
            ListItem::new("  q          Quit application"),
            ListItem::new("  Ctrl+C     Force quit"),
        ];

        let help_list = List::new(help_items).block(
            Block::default()
                .title("Help - Press ? or Esc to close")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

        frame.render_widget(help_list, popup_area);
    }
}

impl Default for HelpComponent {
    fn default() -> Self {
        Self::new()
    }
}

pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
