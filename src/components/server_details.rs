// ABOUTME: Details panel for the selected server: command line, environment and connection status

use ratatui::{
    prelude::*,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Wrap},
};

const GOLD: Color = Color::Rgb(255, 215, 0);
const DARK_BG: Color = Color::Rgb(25, 25, 35);
const SOFT_WHITE: Color = Color::Rgb(220, 220, 230);
const MUTED_GRAY: Color = Color::Rgb(120, 120, 140);
const SUBDUED_BORDER: Color = Color::Rgb(60, 60, 80);
const ERROR_RED: Color = Color::Rgb(230, 80, 80);

use super::server_list::status_color;
use crate::app::AppState;
use crate::mcp::ConnectionStatus;

pub struct ServerDetailsComponent;

impl ServerDetailsComponent {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, state: &AppState) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(SUBDUED_BORDER))
            .style(Style::default().bg(DARK_BG));

        let Some(server) = state.selected() else {
            let empty = Paragraph::new(Span::styled(
                "No servers configured",
                Style::default().fg(MUTED_GRAY),
            ))
            .block(block);
            frame.render_widget(empty, area);
            return;
        };

        let label = |text: &'static str| Span::styled(text, Style::default().fg(MUTED_GRAY));
        let status = server.state.status;
        let action = match status {
            ConnectionStatus::Disconnected | ConnectionStatus::Error => "[C]onnect",
            ConnectionStatus::Connected | ConnectionStatus::Connecting => "[D]isconnect",
        };

        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    server.config.name.clone(),
                    Style::default().fg(GOLD).add_modifier(Modifier::BOLD),
                ),
                Span::raw("  "),
                Span::styled(
                    format!("{} {}", status.symbol(), status),
                    Style::default().fg(status_color(status)),
                ),
                Span::raw("  "),
                Span::styled(action, Style::default().fg(MUTED_GRAY)),
            ]),
            Line::from(vec![
                label("Command: "),
                Span::styled(server.config.command.clone(), Style::default().fg(SOFT_WHITE)),
            ]),
        ];

        if !server.config.args.is_empty() {
            lines.push(Line::from(vec![
                label("Args: "),
                Span::styled(server.config.args.join(" "), Style::default().fg(SOFT_WHITE)),
            ]));
        }

        if !server.config.env.is_empty() {
            let env = server
                .config
                .env
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", ");
            lines.push(Line::from(vec![
                label("Env: "),
                Span::styled(env, Style::default().fg(SOFT_WHITE)),
            ]));
        }

        if let Some(error) = &server.state.error {
            lines.push(Line::from(vec![
                label("Error: "),
                Span::styled(error.clone(), Style::default().fg(ERROR_RED)),
            ]));
        }

        frame.render_widget(
            Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
            area,
        );
    }
}

impl Default for ServerDetailsComponent {
    fn default() -> Self {
        Self::new()
    }
}
