//! Ninja Bucks TUI
//!
//! Terminal user interface for Ninja Bucks.
//!
//! ## Layout
//!
//! - Table of ninjas: position, name, ninja bucks, pending amount
//! - Save indicator in the top-right corner
//! - Status bar (or the new-ninja form) at the bottom
//!
//! ## Keys
//!
//! - j/k or ↑/↓: Move selection up/down
//! - 0-9, Backspace: Edit the pending amount of the selected row
//! - + or a: Add the pending amount
//! - - or s: Spend the pending amount
//! - n: New ninja (name, then starting bucks)
//! - r: Reload from the bin
//! - ?: Help
//! - q: Quit

mod app;
mod ui;

use std::fs::File;
use std::io::stdout;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::prelude::*;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use ninja_core::{Config, SaveEvent};

use app::{App, InputMode};

use crate::commands::open_engine;
use crate::output::Output;

/// Printed after the TUI exits with writes that never reached the bin
const UNSAVED_ON_EXIT: &str = "Some changes may not have been saved to the bin.";

/// Run the TUI application
pub async fn run(config: Config, output: &Output) -> Result<()> {
    // Initialize TUI logging (file-based, only if NINJABUCKS_LOG is set)
    init_tui_logging(&config);

    // Fail before touching the terminal if the bin is not configured
    let engine = open_engine(&config)?;

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let mut app = App::new(engine);

    // Run app
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    let unsaved = app.engine.has_unsaved_changes();
    app.engine.shutdown().await;
    if unsaved {
        output.warning(UNSAVED_ON_EXIT);
    }

    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut save_events = app.engine.take_events();

    if !initial_load(terminal, app).await? {
        return Ok(());
    }

    loop {
        // Check for status message timeout
        app.check_status_timeout();

        // Draw UI
        terminal.draw(|frame| ui::draw(frame, app))?;

        // Handle events with a short timeout
        tokio::select! {
            biased;

            save_event = next_save_event(&mut save_events) => {
                if let Some(event) = save_event {
                    app.handle_save_event(event);
                }
            }

            // Poll for terminal events
            _ = tokio::time::sleep(Duration::from_millis(50)) => {
                // Check for terminal events (non-blocking)
                if event::poll(Duration::from_millis(0))? {
                    if let Event::Key(key) = event::read()? {
                        // Only handle key press events (not release)
                        if key.kind != KeyEventKind::Press {
                            continue;
                        }

                        // If help is showing, any key dismisses it
                        if app.show_help {
                            app.show_help = false;
                            continue;
                        }

                        match app.input_mode {
                            InputMode::Normal => {
                                handle_normal_mode(terminal, app, key.code, key.modifiers).await?;
                            }
                            InputMode::NewName | InputMode::NewBucks => {
                                handle_form_mode(app, key.code, key.modifiers);
                            }
                        }
                    }
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Show the loading screen until the first load finishes
///
/// Returns false if the user quit while waiting.
async fn initial_load<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<bool> {
    terminal.draw(|frame| ui::draw(frame, app))?;

    let result = tokio::select! {
        result = app.engine.load() => Some(result),
        quit = wait_for_quit_key() => {
            quit?;
            None
        }
    };

    match result {
        Some(result) => {
            app.after_load(result);
            Ok(true)
        }
        None => {
            info!("Quit while loading");
            Ok(false)
        }
    }
}

/// Resolve once q, Esc or Ctrl+C is pressed
async fn wait_for_quit_key() -> Result<()> {
    loop {
        tokio::time::sleep(Duration::from_millis(50)).await;
        if event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && is_quit_key(&key) {
                    return Ok(());
                }
            }
        }
    }
}

fn is_quit_key(key: &KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

/// Next save event, or never once the channel is gone
async fn next_save_event(
    events: &mut Option<mpsc::UnboundedReceiver<SaveEvent>>,
) -> Option<SaveEvent> {
    match events {
        Some(rx) => match rx.recv().await {
            Some(event) => Some(event),
            None => {
                warn!("Save event channel closed");
                *events = None;
                None
            }
        },
        None => std::future::pending().await,
    }
}

/// Handle key events in normal mode
async fn handle_normal_mode<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
) -> Result<()> {
    match code {
        // Quit
        KeyCode::Char('q') => {
            app.should_quit = true;
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }

        // Navigation
        KeyCode::Char('k') | KeyCode::Up => {
            app.move_up();
        }
        KeyCode::Char('j') | KeyCode::Down => {
            app.move_down();
        }

        // Pending amount
        KeyCode::Char(c) if c.is_ascii_digit() => {
            if let Some(digit) = c.to_digit(10) {
                app.push_amount_digit(digit);
            }
        }
        KeyCode::Backspace => {
            app.pop_amount_digit();
        }

        // Balance changes
        KeyCode::Char('+') | KeyCode::Char('a') => {
            app.submit_add();
        }
        KeyCode::Char('-') | KeyCode::Char('s') => {
            app.submit_spend();
        }

        KeyCode::Char('n') => {
            app.start_new_ninja();
        }

        KeyCode::Char('r') => {
            app.is_loading = true;
            terminal.draw(|frame| ui::draw(frame, app))?;
            app.reload().await;
            app.is_loading = false;
        }

        KeyCode::Char('?') => {
            app.toggle_help();
        }

        _ => {}
    }

    Ok(())
}

/// Handle key events in the new-ninja form
fn handle_form_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Esc => {
            app.cancel_new_ninja();
        }
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.cancel_new_ninja();
        }

        KeyCode::Enter => match app.input_mode {
            InputMode::NewName => app.confirm_new_name(),
            InputMode::NewBucks => app.submit_new_ninja(),
            InputMode::Normal => {}
        },

        // Text input
        KeyCode::Char(c) => {
            app.insert_char(c);
        }
        KeyCode::Backspace => {
            app.delete_char();
        }

        _ => {}
    }
}

/// Initialize logging for TUI mode
///
/// Only initializes if NINJABUCKS_LOG environment variable is set.
/// Logs to file (config.log_file or default {data_dir}/ninjabucks.log).
fn init_tui_logging(config: &Config) {
    let Ok(log_level) = std::env::var("NINJABUCKS_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "ninja_core={},ninjabucks={}",
        log_level, log_level
    ));

    // Initialize file-based logging (ignore error if already initialized)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("TUI logging initialized to {:?}", log_path);
}
