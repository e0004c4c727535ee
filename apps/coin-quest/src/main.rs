//! Coin Quest - Money quiz adventure with a gacha capsule machine.

mod app;
mod config;
mod engine;
mod models;
mod questions;
mod rewards;
mod seals;
mod store;
mod ui;

use app::App;
use crossterm::{
    event::{self, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::sync::Arc;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    init_logging();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }

    Ok(())
}

/// Logs go to a file; stdout belongs to the terminal UI.
fn init_logging() {
    let path = config::Config::load().log_path();
    if let Some(parent) = path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    if let Ok(file) = File::create(&path) {
        tracing_subscriber::fmt()
            .with_writer(Arc::new(file))
            .with_ansi(false)
            .init();
    }
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>) -> anyhow::Result<()> {
    let mut app = App::new()?;
    tracing::info!("coin quest started");

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        // Poll so the gacha reveal timer advances without input.
        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.code == KeyCode::Char('q')
                    && key.modifiers.is_empty()
                    && app.can_quit()
                {
                    break;
                }
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    break;
                }
                app.handle_key(key);
            }
        }

        app.tick();
    }

    Ok(())
}
