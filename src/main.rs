mod action;
mod api;
mod app;
mod auth;
mod cli;
mod config;
mod error;
mod event;
mod export;
mod feed;
mod form;
mod jwt;
mod scroll;
mod store;
mod tui;
mod types;
mod ui;

use std::panic;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::api::HttpBackend;
use crate::app::App;
use crate::auth::AuthGateway;
use crate::cli::Cli;
use crate::config::{Config, GeneratorConfig};
use crate::event::Event;
use crate::store::{CredentialStore, FileStore, MemoryStore};
use crate::tui::EventHandler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    let store: Arc<dyn CredentialStore> = match FileStore::default_path() {
        Some(path) => Arc::new(FileStore::open(path)),
        None => {
            tracing::warn!("no config directory, session will not persist");
            Arc::new(MemoryStore::default())
        }
    };
    let backend = Arc::new(HttpBackend::new(&config.api)?);
    let gateway = Arc::new(AuthGateway::restore(backend, store));

    if let Some(command) = cli.command {
        cli::execute(command, &gateway, &config).await?;
        return Ok(());
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    // Run the application
    let result = run(gateway, config.generator).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    gateway: Arc<AuthGateway>,
    settings: GeneratorConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    // Create app state
    let session = gateway.state().await;
    let mut app = App::new(gateway, session, settings, action_tx.clone());

    // Create event handler
    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
