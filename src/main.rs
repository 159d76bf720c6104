use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyEventKind};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

mod actions;
mod app;
mod config;
mod ipc;
mod session;

use actions::Action;
use app::App;
use config::Cli;
use ipc::UnixConnector;
use session::SessionEngine;

fn init_logging(log_file: &Path) -> Result<()> {
    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("Failed to open log file {}", log_file.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Cli::parse().into_settings();

    // Initialize logging
    init_logging(&settings.log_file)?;
    tracing::info!(worker = %settings.target, "Starting");

    // Create event channel
    let (tx, mut rx) = mpsc::unbounded_channel::<Action>();

    // Create app state; replies from the worker land in `inbox`
    let (engine, mut inbox) =
        SessionEngine::new(UnixConnector::new(), settings.target, &settings.title);
    let mut app = App::new(engine);

    // Initialize terminal
    let mut terminal = ratatui::init();

    // Spawn input handler
    let input_tx = tx.clone();
    tokio::spawn(async move {
        loop {
            if event::poll(Duration::from_millis(100)).unwrap_or(false) {
                if let Ok(Event::Key(key)) = event::read() {
                    if key.kind == KeyEventKind::Press {
                        let _ = input_tx.send(Action::KeyPress(key));
                    }
                }
            }
        }
    });

    // Spawn notice timer
    let tick_tx = tx.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            if tick_tx.send(Action::Tick).is_err() {
                break;
            }
        }
    });

    // Quit cleanly on SIGINT delivered from outside the terminal
    let signal_tx = tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = signal_tx.send(Action::Quit);
        }
    });

    // Main event loop
    let result = loop {
        // Render
        terminal.draw(|f| app.render(f))?;

        // Process any pending actions from the app
        for pending_action in app.take_pending_actions() {
            if let Action::Connect = pending_action {
                app.engine.connect().await;
            }
        }

        // Handle events; one at a time, in arrival order
        let action = tokio::select! {
            Some(action) = rx.recv() => action,
            Some(inbound) = inbox.recv() => Action::Inbound(inbound),
            else => break Ok(()),
        };
        match app.handle_action(action) {
            Ok(should_quit) => {
                if should_quit {
                    break Ok(());
                }
            }
            Err(e) => {
                break Err(e);
            }
        }
    };

    app.engine.disconnect();
    tracing::info!("Exiting");

    // Restore terminal
    ratatui::restore();
    result
}
