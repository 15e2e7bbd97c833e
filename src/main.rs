// ABOUTME: Main entry point for termbridge
// Connects the local terminal to a backend event channel and runs the bridge loop

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{Event as TermEvent, EventStream};
use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use termbridge::config::{BridgeConfig, ConfigOverrides};
use termbridge::socket::WebSocketClient;
use termbridge::terminal::{is_quit_key, key_to_data, RawModeGuard, StdoutTerminal};
use termbridge::{Event, InputOutputBridge};
use tracing::{error, info, warn};

type TtyBridge = InputOutputBridge<StdoutTerminal, Arc<WebSocketClient>>;

/// Line-buffered terminal client for an app_output/app_input event backend
#[derive(Debug, Parser)]
#[command(name = "termbridge", version, about)]
struct Cli {
    /// Socket.IO server URL, e.g. ws://127.0.0.1:5000
    #[arg(long, env = "TERMBRIDGE_URL")]
    url: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Delay between reconnection attempts
    #[arg(long)]
    reconnect_interval_ms: Option<u64>,

    /// Give up after this many consecutive failed attempts
    #[arg(long)]
    max_reconnect_attempts: Option<u32>,

    /// Directory for log files
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            url: self.url.clone(),
            reconnect_interval_ms: self.reconnect_interval_ms,
            max_reconnect_attempts: self.max_reconnect_attempts,
            log_dir: self.log_dir.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = BridgeConfig::load(cli.config.as_deref(), cli.overrides())
        .context("Failed to load configuration")?;

    setup_logging(&config.log_dir())?;
    setup_panic_handler();
    let client = Arc::new(WebSocketClient::new(
        &config.url,
        config.reconnect_policy(),
    ));
    info!("Starting termbridge against {}", client.url());
    client
        .connect()
        .await
        .with_context(|| format!("Failed to connect to {}", client.url()))?;

    let result = {
        let _raw_mode = RawModeGuard::enable().context("Terminal not compatible")?;
        let mut bridge = InputOutputBridge::new(StdoutTerminal::new(), client.clone());
        run_bridge(&mut bridge, &client).await
    };

    client.disconnect().await;
    if let Err(e) = &result {
        error!("Bridge stopped: {:#}", e);
    }
    result
}

async fn run_bridge(bridge: &mut TtyBridge, client: &WebSocketClient) -> Result<()> {
    let mut keystrokes = EventStream::new();

    loop {
        tokio::select! {
            term_event = keystrokes.next() => match term_event {
                Some(Ok(TermEvent::Key(key))) => {
                    if is_quit_key(&key) {
                        info!("Quit requested");
                        break;
                    }
                    if let Some(data) = key_to_data(key) {
                        bridge.handle_terminal_keystroke(&data)?;
                    }
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return Err(e).context("Failed to read terminal input"),
                None => break,
            },

            received = client.receive() => match received {
                Some(Event::AppOutput(payload)) => bridge.handle_backend_output(&payload.output)?,
                Some(other) => warn!("Ignoring unexpected {} event from backend", other.name()),
                None => {
                    info!("Backend connection closed");
                    break;
                }
            },
        }
    }

    Ok(())
}

fn setup_logging(log_dir: &Path) -> Result<()> {
    use std::fs::OpenOptions;
    use tracing_subscriber::prelude::*;

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory {:?}", log_dir))?;

    let log_file = log_dir.join(format!(
        "termbridge-{}.log",
        chrono::Local::now().format("%Y%m%d-%H%M%S")
    ));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .with_context(|| format!("Failed to create log file {:?}", log_file))?;

    // stdout is the terminal display, so logs only ever go to the file
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(file)
                .with_ansi(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "termbridge=info".into()),
        )
        .init();

    Ok(())
}

fn setup_panic_handler() {
    std::panic::set_hook(Box::new(|panic_info| {
        let _ = crossterm::terminal::disable_raw_mode();

        error!("Application panicked: {}", panic_info);
        eprintln!("Application panicked: {}", panic_info);
        eprintln!("Please check the logs for more details.");
    }));
}
