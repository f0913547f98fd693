//! The `withered` binary: a headless client that joins a game server and
//! logs what it sees until Ctrl-C.

use clap::Parser;
use tokio::sync::mpsc;
use withered_app::headless::{BotInput, HeadlessRenderer, IdleInput};
use withered_app::loop_config;
use withered_client::{ClientController, ClientEvent, ClientLoop, InputSampler, WebSocketTransport};
use withered_config::{CliArgs, Config, default_config_dir};

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config_dir = match args.config.clone() {
        Some(dir) => dir,
        None => match default_config_dir() {
            Ok(dir) => dir,
            Err(e) => {
                eprintln!("Failed to resolve config directory: {e}");
                std::process::exit(1);
            }
        },
    };

    let mut config = match Config::load_or_create(&config_dir) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config from {}: {e}", config_dir.display());
            std::process::exit(1);
        }
    };
    config.apply_cli_overrides(&args);

    withered_log::init_logging(
        Some(&config_dir.join("logs")),
        cfg!(debug_assertions),
        Some(&config),
    );
    tracing::info!(
        server_url = %config.network.server_url,
        tick_rate_hz = config.network.tick_rate_hz,
        reconnect = config.reconnect.enabled,
        "Withered client starting"
    );

    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let transport = WebSocketTransport::new(config.network.server_url.clone(), events_tx);

    if args.bot {
        run(transport, BotInput::default(), events_rx, &config).await;
    } else {
        run(transport, IdleInput, events_rx, &config).await;
    }
}

async fn run<I>(
    transport: WebSocketTransport,
    input: I,
    events_rx: mpsc::UnboundedReceiver<ClientEvent>,
    config: &Config,
) where
    I: InputSampler + Send + 'static,
{
    let controller = ClientController::new(transport, input, HeadlessRenderer::default());
    let handle = ClientLoop::new(controller, events_rx, loop_config(config)).start();

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl-C");
    }
    tracing::info!("Shutting down");

    match handle.shutdown().await {
        Ok(controller) => {
            let stats = controller.stats();
            tracing::info!(
                frames_received = stats.frames_received,
                frames_sent = stats.frames_sent,
                frames_dropped = stats.frames_dropped,
                rendered = controller.renderer().frames(),
                "Client stopped"
            );
        }
        Err(e) => tracing::error!(error = %e, "Client loop panicked"),
    }
}
