//! Command-line argument parsing for the Withered client.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Withered client command-line arguments.
///
/// CLI values override settings loaded from `config.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "withered", about = "Withered multiplayer client")]
pub struct CliArgs {
    /// WebSocket URL of the game server.
    #[arg(long)]
    pub server_url: Option<String>,

    /// Client loop rate in Hz.
    #[arg(long)]
    pub tick_rate: Option<u32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Disable automatic reconnection.
    #[arg(long)]
    pub no_reconnect: bool,

    /// Drive input from a scripted bot instead of staying idle.
    #[arg(long)]
    pub bot: bool,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ref url) = args.server_url {
            self.network.server_url = url.clone();
        }
        if let Some(rate) = args.tick_rate {
            self.network.tick_rate_hz = rate;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
        if args.no_reconnect {
            self.reconnect.enabled = false;
        }
    }
}
