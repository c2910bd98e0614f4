use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{bail, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod app;
mod chat;
mod client;
mod config;
mod error;
mod handler;
mod tui;
mod ui;

use app::App;
use chat::ChatView;
use client::{ChatBackend, HttpChatClient};
use config::Config;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "revtalk", version)]
#[command(about = "Chat with the RevTalk EV charging assistant from your terminal")]
struct Cli {
    /// Chat endpoint to POST messages to
    #[arg(long, env = "REVTALK_ENDPOINT")]
    endpoint: Option<String>,

    /// Where to write logs (the terminal UI owns stdout/stderr)
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Store the resolved endpoint in the config file and exit
    #[arg(long)]
    save_endpoint: bool,

    /// Send a single message, print the reply and exit
    #[arg(long, value_name = "MESSAGE")]
    ask: Option<String>,

    /// With --ask, print the whole exchange as JSON
    #[arg(long, requires = "ask")]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = Config::load();
    let mut config = loaded.as_ref().cloned().unwrap_or_else(|_| Config::new());

    let headless = cli.ask.is_some() || cli.save_endpoint;
    init_logging(log_destination(
        headless,
        config.resolve_log_file(cli.log_file.as_deref()),
    ));

    if let Err(e) = &loaded {
        warn!(error = %e, "could not read config, using defaults");
    }

    let endpoint = config.resolve_endpoint(cli.endpoint.as_deref());

    if cli.save_endpoint {
        let path = Config::get_config_path()?;
        save_endpoint(&mut config, &endpoint, &path)?;
        println!("Saved endpoint {} to {}", endpoint, path.display());
        return Ok(());
    }

    let client = HttpChatClient::new(&endpoint);
    info!(endpoint = %client.endpoint(), "chat client ready");

    match cli.ask {
        Some(message) => {
            println!("{}", ask(&client, message, cli.json).await?);
            Ok(())
        }
        None => run_tui(client).await,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum LogDestination {
    Stderr,
    File(PathBuf),
    /// The TUI owns the terminal and there is no usable log file
    Off,
}

/// Headless runs log to stderr. The TUI logs to a file, or not at all when no
/// log path can be worked out.
fn log_destination(headless: bool, log_file: Result<PathBuf>) -> LogDestination {
    if headless {
        return LogDestination::Stderr;
    }
    match log_file {
        Ok(path) => LogDestination::File(path),
        Err(_) => LogDestination::Off,
    }
}

fn open_log_file(path: &Path) -> Option<File> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).ok()?;
    }
    OpenOptions::new().create(true).append(true).open(path).ok()
}

fn init_logging(destination: LogDestination) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "revtalk=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    let file = match &destination {
        LogDestination::File(path) => open_log_file(path),
        _ => None,
    };

    match (destination, file) {
        (LogDestination::Stderr, _) => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        (_, Some(file)) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        // Logging must never draw over the TUI
        _ => registry.init(),
    }
}

/// Send one message and return what `--ask` prints: the reply, or the whole
/// exchange as JSON.
async fn ask(backend: &dyn ChatBackend, message: String, json: bool) -> Result<String> {
    let mut view = ChatView::new();
    view.set_draft(message);

    if !view.send_with(backend).await {
        bail!("Nothing to send: the message is empty");
    }

    if json {
        return Ok(serde_json::to_string_pretty(view.messages())?);
    }
    Ok(view
        .messages()
        .last()
        .map(|reply| reply.text().to_string())
        .unwrap_or_default())
}

fn save_endpoint(config: &mut Config, endpoint: &str, path: &Path) -> Result<()> {
    config.endpoint = Some(endpoint.to_string());
    config.save_to(path)?;
    info!(endpoint, path = %path.display(), "endpoint saved");
    Ok(())
}

async fn run_tui(client: HttpChatClient) -> Result<()> {
    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let mut events = EventHandler::new();
    let endpoint = client.endpoint().to_string();
    let mut app = App::new(Arc::new(client), events.sender(), &endpoint);

    let result = event_loop(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    info!(messages = app.chat.messages().len(), "session ended");
    result
}

async fn event_loop(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event),
            None => break,
        }
    }
    Ok(())
}
