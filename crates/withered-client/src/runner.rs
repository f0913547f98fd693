//! The fixed-cadence client loop.
//!
//! One tokio task owns the [`ClientController`] and multiplexes the tick
//! interval, transport events, the reconnect timer and the stop signal. Ticks
//! and events therefore never run concurrently, and session state needs no
//! locking. [`ClientLoop::start`] returns a [`LoopHandle`] that stops the
//! loop deterministically and hands the controller back after teardown.

use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::{JoinError, JoinHandle};
use tokio::time::{Instant, MissedTickBehavior};

use crate::controller::{ClientController, ClientEvent, InputSampler, Renderer};
use crate::reconnection::{ReconnectConfig, ReconnectState};
use crate::session::ConnectionState;
use crate::transport::Transport;

/// Loop cadence and reconnection policy.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopConfig {
    /// Ticks per second. Zero is treated as one.
    pub tick_rate_hz: u32,
    /// Backoff schedule, or `None` to stay disconnected after a drop.
    pub reconnect: Option<ReconnectConfig>,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: 60,
            reconnect: Some(ReconnectConfig::default()),
        }
    }
}

impl LoopConfig {
    /// Time between ticks.
    pub fn tick_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate_hz.max(1)))
    }
}

/// A controller plus the event stream its transport reports on, ready to run.
pub struct ClientLoop<T, I, R> {
    controller: ClientController<T, I, R>,
    events: mpsc::UnboundedReceiver<ClientEvent>,
    config: LoopConfig,
}

impl<T, I, R> ClientLoop<T, I, R>
where
    T: Transport + Send + 'static,
    I: InputSampler + Send + 'static,
    R: Renderer + Send + 'static,
{
    /// Bundle a controller with the receiving end of its transport's events.
    pub fn new(
        controller: ClientController<T, I, R>,
        events: mpsc::UnboundedReceiver<ClientEvent>,
        config: LoopConfig,
    ) -> Self {
        Self {
            controller,
            events,
            config,
        }
    }

    /// Connect the transport and begin ticking on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    pub fn start(self) -> LoopHandle<T, I, R> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let task = tokio::spawn(self.run(stop_rx, state_tx));
        LoopHandle {
            stop_tx,
            state_rx,
            task,
        }
    }

    async fn run(
        mut self,
        mut stop_rx: watch::Receiver<bool>,
        state_tx: watch::Sender<ConnectionState>,
    ) -> ClientController<T, I, R> {
        let mut backoff = self.config.reconnect.clone().map(ReconnectState::new);
        let mut reconnect_at: Option<Instant> = None;
        let mut events_open = true;

        if let Err(e) = self.controller.start() {
            tracing::warn!(error = %e, "Initial connect failed");
            reconnect_at = schedule_reconnect(&mut backoff);
        }

        let mut interval = tokio::time::interval(self.config.tick_period());
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let deadline = reconnect_at.unwrap_or_else(Instant::now);

            tokio::select! {
                biased;

                _ = stop_rx.changed() => break,

                // Ahead of events so a busy socket cannot starve rendering.
                _ = interval.tick() => self.controller.tick(),

                event = self.events.recv(), if events_open => {
                    let Some(event) = event else {
                        tracing::debug!("Transport event channel closed");
                        events_open = false;
                        continue;
                    };
                    match event {
                        ClientEvent::Connected => {
                            if let Some(backoff) = backoff.as_mut() {
                                backoff.reset();
                            }
                            reconnect_at = None;
                        }
                        ClientEvent::Disconnected => {
                            reconnect_at = schedule_reconnect(&mut backoff);
                        }
                        ClientEvent::FrameReceived(_) => {}
                    }
                    self.controller.handle_event(event);
                    state_tx.send_replace(self.controller.connection_state());
                }

                _ = tokio::time::sleep_until(deadline), if reconnect_at.is_some() => {
                    reconnect_at = None;
                    if let Err(e) = self.controller.reconnect() {
                        tracing::warn!(error = %e, "Reconnect attempt failed");
                        reconnect_at = schedule_reconnect(&mut backoff);
                    }
                }
            }
        }

        self.controller.teardown();
        state_tx.send_replace(self.controller.connection_state());
        self.controller
    }
}

fn schedule_reconnect(backoff: &mut Option<ReconnectState>) -> Option<Instant> {
    let backoff = backoff.as_mut()?;
    if backoff.is_exhausted() {
        tracing::warn!(
            attempts = backoff.attempts(),
            "Reconnection attempts exhausted; staying disconnected"
        );
        return None;
    }
    let delay = backoff.next_delay()?;
    tracing::info!(attempt = backoff.attempts(), ?delay, "Scheduling reconnect");
    Some(Instant::now() + delay)
}

/// Stop handle for a running [`ClientLoop`].
///
/// Dropping the handle also stops the loop.
pub struct LoopHandle<T, I, R> {
    stop_tx: watch::Sender<bool>,
    state_rx: watch::Receiver<ConnectionState>,
    task: JoinHandle<ClientController<T, I, R>>,
}

impl<T, I, R> LoopHandle<T, I, R> {
    /// Ask the loop to stop. Teardown runs on the loop task.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Connection state as of the last processed event.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// A receiver notified on every connection state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// Whether the loop task has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the loop, wait for teardown, and return the controller.
    pub async fn shutdown(self) -> Result<ClientController<T, I, R>, JoinError> {
        self.stop();
        self.task.await
    }
}
