// ABOUTME: History tab listing every tracked message with direction, status and latency
// ABOUTME: The detail pane shows the request and its correlated response side by side in time order

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

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

use crate::app::{
    AppState,
    state::{FocusArea, Tab},
};
use crate::mcp::{Direction as MessageDirection, EntryStatus, MessageEntry};

/// One-line summary of a history entry.
pub fn entry_label(entry: &MessageEntry) -> String {
    let glyph = match entry.direction {
        MessageDirection::Request => "→",
        MessageDirection::Response => "←",
        MessageDirection::Notification => "•",
    };

    let name = match entry.direction {
        MessageDirection::Response => match entry.payload.get("error") {
            Some(error) => format!(
                "Response (error: {})",
                error.get("code").map_or_else(|| "?".to_string(), ToString::to_string)
            ),
            None => "Response (result)".to_string(),
        },
        _ => entry.method.clone().unwrap_or_default(),
    };

    let suffix = match (entry.direction, entry.status) {
        (MessageDirection::Request, EntryStatus::Completed) => match entry.duration {
            Some(d) => format!(" ✓ {}ms", d.as_millis()),
            None => " ✓".to_string(),
        },
        (MessageDirection::Request, EntryStatus::Pending) => " ...".to_string(),
        (MessageDirection::Request, EntryStatus::TimedOut) => " ✗ timed out".to_string(),
        (MessageDirection::Request, EntryStatus::Aborted) => " ✗ aborted".to_string(),
        _ => String::new(),
    };

    let anomaly = entry
        .anomaly
        .map(|a| format!(" ! {}", a.label()))
        .unwrap_or_default();

    format!("{glyph} {name}{suffix}{anomaly}")
}

fn entry_color(entry: &MessageEntry) -> Color {
    if entry.anomaly.is_some() || entry.is_error() {
        return ERROR_RED;
    }
    match entry.status {
        EntryStatus::Pending => WARNING_ORANGE,
        EntryStatus::TimedOut | EntryStatus::Aborted => MUTED_GRAY,
        EntryStatus::Completed => SOFT_WHITE,
    }
}

fn detail_lines(entry: &MessageEntry) -> Vec<Line<'static>> {
    let heading = |text: &'static str| {
        Line::from(Span::styled(
            text,
            Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
        ))
    };
    let json_lines = |value: &serde_json::Value| {
        serde_json::to_string_pretty(value)
            .unwrap_or_default()
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), Style::default().fg(SOFT_WHITE))))
            .collect::<Vec<_>>()
    };

    let mut lines = vec![Line::from(vec![
        Span::styled("Time: ", Style::default().fg(MUTED_GRAY)),
        Span::styled(
            entry.timestamp.format("%H:%M:%S%.3f").to_string(),
            Style::default().fg(SOFT_WHITE),
        ),
    ])];
    if let Some(duration) = entry.duration {
        lines.push(Line::from(vec![
            Span::styled("Duration: ", Style::default().fg(MUTED_GRAY)),
            Span::styled(format!("{}ms", duration.as_millis()), Style::default().fg(SOFT_WHITE)),
        ]));
    }
    if let Some(anomaly) = entry.anomaly {
        lines.push(Line::from(Span::styled(
            format!("Anomaly: {}", anomaly.label()),
            Style::default().fg(ERROR_RED),
        )));
    }
    lines.push(Line::default());

    let title = match entry.direction {
        MessageDirection::Request => "Request:",
        MessageDirection::Response => "Response:",
        MessageDirection::Notification => "Notification:",
    };
    lines.push(heading(title));
    lines.extend(json_lines(&entry.payload));

    if let Some(response) = &entry.response {
        lines.push(Line::default());
        lines.push(heading("Response:"));
        lines.extend(json_lines(response));
    }
    lines
}

#[derive(Default)]
pub struct HistoryComponent {
    list_state: ListState,
}

impl HistoryComponent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, frame: &mut Frame, area: Rect, state: &AppState) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(area);

        let border = |focused: bool| {
            Style::default().fg(if focused { SELECTION_GREEN } else { SUBDUED_BORDER })
        };
        let title = |text: String| {
            Span::styled(text, Style::default().fg(CORNFLOWER_BLUE).add_modifier(Modifier::BOLD))
        };

        let items: Vec<ListItem> = state
            .history
            .iter()
            .map(|entry| {
                ListItem::new(Line::from(Span::styled(
                    entry_label(entry),
                    Style::default().fg(entry_color(entry)),
                )))
            })
            .collect();

        let selected = state.selection(Tab::History);
        self.list_state
            .select((!state.history.is_empty()).then_some(selected));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border(state.focus == FocusArea::HistoryList))
                    .style(Style::default().bg(DARK_BG))
                    .title(title(format!(" Messages ({}) ", state.history.len()))),
            )
            .highlight_style(Style::default().bg(LIST_HIGHLIGHT_BG))
            .highlight_symbol("▶ ");
        frame.render_stateful_widget(list, chunks[0], &mut self.list_state);

        let lines = state
            .history
            .get(selected)
            .map(detail_lines)
            .unwrap_or_else(|| {
                vec![Line::from(Span::styled(
                    "No messages yet",
                    Style::default().fg(MUTED_GRAY),
                ))]
            });

        let detail = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .scroll((state.detail_scroll, 0))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(border(state.focus == FocusArea::HistoryDetail))
                    .style(Style::default().bg(DARK_BG))
                    .title(title(" Details ".to_string()))
                    .title_bottom(Line::from(vec![
                        Span::styled(" PgUp/PgDn", Style::default().fg(GOLD).add_modifier(Modifier::BOLD)),
                        Span::styled(" scroll ", Style::default().fg(MUTED_GRAY)),
                    ])),
            );
        frame.render_widget(detail, chunks[1]);
    }
}
