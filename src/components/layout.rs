// ABOUTME: Main layout component: header, server list, right-hand details/tabs pane and bottom bar
// ABOUTME: Also draws toast notifications, the command line and the help overlay on top

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph},
};

// Premium color palette (TUI Style Guide)
const CORNFLOWER_BLUE: Color = Color::Rgb(100, 149, 237);
const GOLD: Color = Color::Rgb(255, 215, 0);
const SELECTION_GREEN: Color = Color::Rgb(100, 200, 100);
const WARNING_ORANGE: Color = Color::Rgb(255, 165, 0);
const DARK_BG: Color = Color::Rgb(25, 25, 35);
const PANEL_BG: Color = Color::Rgb(30, 30, 40);
const SOFT_WHITE: Color = Color::Rgb(220, 220, 230);
const MUTED_GRAY: Color = Color::Rgb(120, 120, 140);
const SUBDUED_BORDER: Color = Color::Rgb(60, 60, 80);

use super::{
    HelpComponent, HistoryComponent, ListingComponent, ServerDetailsComponent,
    ServerListComponent, TabBarComponent,
};
use crate::app::{
    AppState,
    state::{NotificationType, Tab},
};

pub struct LayoutComponent {
    server_list: ServerListComponent,
    server_details: ServerDetailsComponent,
    tab_bar: TabBarComponent,
    listing: ListingComponent,
    history: HistoryComponent,
    help: HelpComponent,
}

impl LayoutComponent {
    pub fn new() -> Self {
        Self {
            server_list: ServerListComponent::new(),
            server_details: ServerDetailsComponent::new(),
            tab_bar: TabBarComponent::new(),
            listing: ListingComponent::new(),
            history: HistoryComponent::new(),
            help: HelpComponent::new(),
        }
    }

    pub fn render(&mut self, frame: &mut Frame, state: &mut AppState) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(10),   // Body
                Constraint::Length(3), // Bottom bar / command line
            ])
            .split(frame.size());

        Self::render_header(frame, rows[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(28), Constraint::Percentage(72)])
            .split(rows[1]);

        self.server_list.render(frame, columns[0], state);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(7), // Server details
                Constraint::Length(3), // Tab bar
                Constraint::Min(5),    // Tab content
            ])
            .split(columns[1]);

        self.server_details.render(frame, right[0], state);
        self.tab_bar.render(frame, right[1], state);
        match state.active_tab {
            Tab::History => self.history.render(frame, right[2], state),
            _ => self.listing.render(frame, right[2], state),
        }

        if state.command_input.is_some() {
            Self::render_command_line(frame, rows[2], state);
        } else {
            Self::render_menu_bar(frame, rows[2]);
        }

        Self::render_notifications(frame, frame.size(), state);

        if state.help_visible {
            self.help.render(frame, frame.size());
        }
    }

    fn render_header(frame: &mut Frame, area: Rect) {
        let header = Paragraph::new(Line::from(vec![
            Span::styled(" MCP Inspect ", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("v{}", env!("CARGO_PKG_VERSION")),
                Style::default().fg(MUTED_GRAY),
            ),
        ]))
        .style(Style::default().bg(DARK_BG));
        frame.render_widget(header, area);
    }

    fn render_menu_bar(frame: &mut Frame, area: Rect) {
        let key = |k: &'static str| {
            Span::styled(k, Style::default().fg(CORNFLOWER_BLUE).add_modifier(Modifier::BOLD))
        };
        let text = |t: &'static str| Span::styled(t, Style::default().fg(MUTED_GRAY));
        let sep = || Span::styled(" │ ", Style::default().fg(SUBDUED_BORDER));

        let spans = vec![
            key("Tab"),
            text(" focus "),
            key("↑↓"),
            text(" move"),
            sep(),
            key("c"),
            text(" connect "),
            key("d"),
            text(" disconnect "),
            key("R"),
            text(" refresh"),
            sep(),
            key("/"),
            text(" command "),
            key("?"),
            text(" help "),
            key("q"),
            text(" quit"),
        ];

        let menu = Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(SUBDUED_BORDER))
                    .style(Style::default().bg(PANEL_BG)),
            )
            .alignment(Alignment::Center);

        frame.render_widget(menu, area);
    }

    fn render_command_line(frame: &mut Frame, area: Rect, state: &AppState) {
        let input = state.command_input.as_deref().unwrap_or_default();
        let line = Line::from(vec![
            Span::styled("/", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
            Span::styled(input.to_string(), Style::default().fg(SOFT_WHITE)),
            Span::styled("█", Style::default().fg(SOFT_WHITE)),
        ]);

        let command = Paragraph::new(line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(Style::default().fg(GOLD))
                .style(Style::default().bg(PANEL_BG))
                .title(Span::styled(
                    " Command (Enter to run, Esc to cancel) ",
                    Style::default().fg(MUTED_GRAY),
                )),
        );
        frame.render_widget(command, area);
    }

    fn render_notifications(frame: &mut Frame, area: Rect, state: &AppState) {
        if state.notifications.is_empty() {
            return;
        }

        // Position notifications in the top-right corner
        let notification_width = 50.min(area.width);
        let notification_height =
            u16::try_from(state.notifications.len() * 3).unwrap_or(u16::MAX); // 3 lines per notification

        let notification_area = Rect {
            x: area.width.saturating_sub(notification_width + 2),
            y: 1,
            width: notification_width,
            height: notification_height.min(area.height.saturating_sub(2)),
        };

        for (i, notification) in state.notifications.iter().enumerate() {
            let y_offset = u16::try_from(i * 3).unwrap_or(u16::MAX);
            if y_offset >= notification_area.height {
                break; // Don't render notifications that won't fit
            }

            let single_notification_area = Rect {
                x: notification_area.x,
                y: notification_area.y + y_offset,
                width: notification_area.width,
                height: 3.min(notification_area.height - y_offset),
            };

            let (icon, color) = match notification.notification_type {
                NotificationType::Success => ("✓ ", SELECTION_GREEN),
                NotificationType::Error => ("✗ ", Color::Rgb(230, 100, 100)),
                NotificationType::Warning => ("⚠ ", WARNING_ORANGE),
                NotificationType::Info => ("ℹ ", CORNFLOWER_BLUE),
            };

            let notification_line = Line::from(vec![
                Span::styled(icon, Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::styled(notification.message.as_str(), Style::default().fg(color)),
            ]);

            let notification_widget = Paragraph::new(notification_line)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_type(BorderType::Rounded)
                        .border_style(Style::default().fg(color))
                        .style(Style::default().bg(PANEL_BG)),
                )
                .wrap(ratatui::widgets::Wrap { trim: true });

            frame.render_widget(ratatui::widgets::Clear, single_notification_area);
            frame.render_widget(notification_widget, single_notification_area);
        }
    }
}

impl Default for LayoutComponent {
    fn default() -> Self {
        Self::new()
    }
}
