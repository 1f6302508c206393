// ABOUTME: Tab bar for the right pane with per-tab item counts and accelerator hints

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Tabs},
};

const GOLD: Color = Color::Rgb(255, 215, 0);
const SELECTION_GREEN: Color = Color::Rgb(100, 200, 100);
const DARK_BG: Color = Color::Rgb(25, 25, 35);
const MUTED_GRAY: Color = Color::Rgb(120, 120, 140);
const SUBDUED_BORDER: Color = Color::Rgb(60, 60, 80);

use crate::app::{
    AppState,
    state::{FocusArea, Tab},
};

pub struct TabBarComponent;

impl TabBarComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let is_focused = state.focus == FocusArea::Tabs;

        let titles: Vec<Line> = Tab::ALL
            .iter()
            .map(|tab| {
                let title = tab.title();
                // Underline the accelerator (always the first letter)
                let (first, rest) = title.split_at(1);
                Line::from(vec![
                    Span::styled(
                        first.to_string(),
                        Style::default().add_modifier(Modifier::UNDERLINED),
                    ),
                    Span::raw(format!("{rest} ({})", state.item_count(*tab))),
                ])
            })
            .collect();

        let tabs = Tabs::new(titles)
            .select(state.active_tab.index())
            .style(Style::default().fg(MUTED_GRAY))
            .highlight_style(Style::default().fg(GOLD).add_modifier(Modifier::BOLD))
            .divider(Span::styled("│", Style::default().fg(SUBDUED_BORDER)))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_type(BorderType::Rounded)
                    .border_style(Style::default().fg(if is_focused {
                        SELECTION_GREEN
                    } else {
                        SUBDUED_BORDER
                    }))
                    .style(Style::default().bg(DARK_BG)),
            );

        frame.render_widget(tabs, area);
    }
}

impl Default for TabBarComponent {
    fn default() -> Self {
        Self::new()
    }
}
