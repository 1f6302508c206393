// ABOUTME: Main entry point for mcp-inspect, an interactive TUI for MCP servers
//
// Binary: mcp-inspect
// Usage: mcp-inspect <CONFIG> [--history-capacity N] [--request-timeout SECS]

#![allow(missing_docs)]

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::Backend, prelude::*};
use std::{
    io::{self, IsTerminal},
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};
use tracing::{error, info};

use mcp_inspect::{
    app::{App, EventHandler},
    cli::Cli,
    components::LayoutComponent,
    config::InspectorConfig,
    mcp::{ConnectionManager, StdioTransportFactory},
};

/// Terminal cleanup utility to ensure proper restoration
fn cleanup_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen);
}

/// Unified terminal cleanup that works with a terminal instance
fn cleanup_terminal_with_instance<B: Backend + std::io::Write>(
    terminal: &mut Terminal<B>,
) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    if let Err(e) = setup_logging() {
        eprintln!("Warning: file logging disabled: {e:#}");
    }
    setup_panic_handler();

    let config = match InspectorConfig::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    };

    let settings = args.settings(config.settings);
    info!(
        servers = config.servers.len(),
        history_capacity = settings.history_capacity,
        request_timeout_secs = settings.request_timeout.as_secs(),
        "Starting mcp-inspect"
    );

    let manager = ConnectionManager::new(
        config.servers,
        &settings,
        Arc::new(StdioTransportFactory),
    );
    let mut app = App::new(manager);
    let mut layout = LayoutComponent::new();

    let result = run_tui(&mut app, &mut layout).await;

    // Child processes go away with their connections
    app.shutdown().await;

    if result.is_err() {
        cleanup_terminal();
    }

    result
}

async fn run_tui(app: &mut App, layout: &mut LayoutComponent) -> Result<()> {
    if !IsTerminal::is_terminal(&io::stdout()) {
        return Err(anyhow::anyhow!(
            "No TTY detected. This application requires a terminal.\n\
             Try running directly in a terminal instead of redirecting output."
        ));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_tui_loop(app, layout, &mut terminal).await;

    if let Err(e) = cleanup_terminal_with_instance(&mut terminal) {
        error!("Failed to cleanup terminal: {}", e);
        cleanup_terminal();
    }

    result
}

async fn run_tui_loop(
    app: &mut App,
    layout: &mut LayoutComponent,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|frame| {
            layout.render(frame, &mut app.state);
        })?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key_event) = event::read()? {
                // Windows reports releases as well as presses
                if key_event.kind == KeyEventKind::Press {
                    if let Some(app_event) =
                        EventHandler::handle_key_event(key_event, &mut app.state)
                    {
                        EventHandler::process_event(app_event, &mut app.state);
                    }
                }
            }
        }

        // Start queued actions right away so status changes show up on the next frame
        if app.state.pending_async_action.is_some() || last_tick.elapsed() >= tick_rate {
            app.tick();
            last_tick = Instant::now();
        }

        if app.needs_ui_refresh() {
            terminal.draw(|frame| {
                layout.render(frame, &mut app.state);
            })?;
        }

        if app.state.should_quit {
            break;
        }

        tokio::task::yield_now().await;
    }

    Ok(())
}

fn log_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".mcp-inspect").join("logs"))
        .unwrap_or_else(|| PathBuf::from(".mcp-inspect/logs"))
}

fn setup_logging() -> Result<()> {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("failed to create {}", log_dir.display()))?;

    // JSONL log file with timestamp
    let log_file = log_dir.join(format!(
        "mcp-inspect-{}.jsonl",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("failed to open {}", log_file.display()))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_target(true)
                .with_writer(file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mcp_inspect=info".into()),
        )
        .init();

    Ok(())
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        // Ensure terminal is restored before logging the panic
        cleanup_terminal();

        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs for more details.");
    }));
}
