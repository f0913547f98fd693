//! Headless client application: stand-in renderer and input samplers, and
//! the glue from [`withered_config::Config`] to the client loop.

pub mod headless;

use std::time::Duration;

use withered_client::{LoopConfig, ReconnectConfig};
use withered_config::{Config, ReconnectSettings};

/// Build the client loop configuration from persisted settings.
pub fn loop_config(config: &Config) -> LoopConfig {
    LoopConfig {
        tick_rate_hz: config.network.tick_rate_hz,
        reconnect: config
            .reconnect
            .enabled
            .then(|| reconnect_config(&config.reconnect)),
    }
}

fn reconnect_config(settings: &ReconnectSettings) -> ReconnectConfig {
    ReconnectConfig {
        initial_delay: Duration::from_millis(settings.initial_delay_ms),
        backoff_multiplier: settings.backoff_multiplier,
        max_delay: Duration::from_millis(settings.max_delay_ms),
        max_attempts: settings.max_attempts,
        jitter: settings.jitter,
    }
}
