//! Exponential backoff with jitter for re-establishing a dropped connection.
//!
//! [`ReconnectState`] hands out increasing delays; the client loop arms a
//! timer with each one and calls the controller's `reconnect` when it fires.
//! A successful connect resets the schedule.

use std::time::Duration;

use rand::Rng;

/// Configuration for client-side reconnection behaviour.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Initial delay before the first reconnection attempt. Default: 1 s.
    pub initial_delay: Duration,
    /// Multiplier applied to the delay after each failed attempt. Default: 2.0.
    pub backoff_multiplier: f64,
    /// Maximum delay between reconnection attempts. Default: 30 s.
    pub max_delay: Duration,
    /// Maximum number of reconnection attempts before giving up. Default: 20.
    pub max_attempts: u32,
    /// Jitter factor (0.0–1.0). Applied as ±jitter to the delay. Default: 0.25.
    pub jitter: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_secs(30),
            max_attempts: 20,
            jitter: 0.25,
        }
    }
}

/// Tracks reconnection attempt count and computes the next backoff delay.
#[derive(Debug, Clone)]
pub struct ReconnectState {
    config: ReconnectConfig,
    attempts: u32,
    current_delay: Duration,
}

impl ReconnectState {
    /// Create a new state from the given config.
    pub fn new(config: ReconnectConfig) -> Self {
        let initial = config.initial_delay;
        Self {
            config,
            attempts: 0,
            current_delay: initial,
        }
    }

    /// Compute the next delay and advance the attempt counter.
    /// Returns `None` if max attempts have been exhausted.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.config.max_attempts {
            return None;
        }

        let base = self.current_delay;
        self.attempts += 1;

        // Uniform in [base * (1 - jitter), base * (1 + jitter)]
        let jitter = self.config.jitter.clamp(0.0, 1.0);
        let jittered = if jitter > 0.0 {
            let mut rng = rand::rng();
            let factor = rng.random_range((1.0 - jitter)..=(1.0 + jitter));
            base.mul_f64(factor)
        } else {
            base
        };

        let next = self
            .current_delay
            .mul_f64(self.config.backoff_multiplier.max(1.0));
        self.current_delay = next.min(self.config.max_delay);

        Some(jittered.min(self.config.max_delay))
    }

    /// Reset the reconnection state (called after a successful reconnection).
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.current_delay = self.config.initial_delay;
    }

    /// Return the number of attempts made so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Whether every allowed attempt has been handed out.
    pub fn is_exhausted(&self) -> bool {
        self.attempts >= self.config.max_attempts
    }
}
