//! Structured logging for the Withered client.
//!
//! Installs a `tracing` subscriber with console output (uptime timestamps and
//! module paths) and, in debug builds, a JSON log file for post-mortem
//! analysis of session traffic. The level comes from `RUST_LOG`, then the
//! config's `debug.log_level`, then [`DEFAULT_FILTER`].

use std::fs::File;
use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use withered_config::Config;

/// Filter used when neither `RUST_LOG` nor the config sets a level.
/// Keeps per-frame websocket chatter out of the default output.
pub const DEFAULT_FILTER: &str = "info,tungstenite=warn,tokio_tungstenite=warn";

/// Name of the JSON log file written in debug builds.
pub const LOG_FILE_NAME: &str = "withered.log";

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - whether to enable file logging
/// * `config` - optional configuration providing the log level
///
/// Calling this twice panics inside `tracing-subscriber`; call it once from `main`.
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_string(config);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(log_file) = open_log_file(log_dir, debug_build) {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// The filter directive that [`init_logging`] falls back to when `RUST_LOG`
/// is unset.
pub fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => {
            format!("{},tungstenite=warn,tokio_tungstenite=warn", config.debug.log_level)
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create `<log_dir>/withered.log` for the JSON layer. `None` in release
/// builds, without a directory, or when the file cannot be created.
fn open_log_file(log_dir: Option<&Path>, debug_build: bool) -> Option<File> {
    if !debug_build {
        return None;
    }
    let log_dir = log_dir?;
    std::fs::create_dir_all(log_dir).ok()?;
    File::create(log_dir.join(LOG_FILE_NAME)).ok()
}
