//! WebSocket transport over tokio-tungstenite.
//!
//! `connect` spawns a socket task on the current tokio runtime. The task
//! reports `Connected`, forwards every binary message as `FrameReceived`, and
//! reports `Disconnected` when the socket ends. Outbound frames travel over an
//! unbounded channel, so `send` never blocks and never applies backpressure.

use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::{Transport, TransportError};
use crate::controller::ClientEvent;

/// Handles to a running socket task.
struct Link {
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    /// Sending `true` (or dropping) asks the socket task to flush and close.
    shutdown: watch::Sender<bool>,
}

/// Client transport for a single configured WebSocket URL.
pub struct WebSocketTransport {
    url: String,
    events: mpsc::UnboundedSender<ClientEvent>,
    link: Option<Link>,
}

impl WebSocketTransport {
    /// Create a transport for `url` that reports to `events`. Nothing
    /// happens until [`Transport::connect`].
    pub fn new(url: impl Into<String>, events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        Self {
            url: url.into(),
            events,
            link: None,
        }
    }

    /// The configured endpoint.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WebSocketTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| TransportError::NoRuntime)?;

        // A reconnect replaces whatever link is left over.
        self.disconnect();

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        runtime.spawn(run_socket(
            self.url.clone(),
            self.events.clone(),
            outbound_rx,
            shutdown_rx,
        ));

        self.link = Some(Link {
            outbound: outbound_tx,
            shutdown: shutdown_tx,
        });
        Ok(())
    }

    fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let link = self.link.as_ref().ok_or(TransportError::NotConnected)?;
        link.outbound
            .send(frame)
            .map_err(|_| TransportError::Closed)
    }

    fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            let _ = link.shutdown.send(true);
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Drive one WebSocket connection until it closes or shutdown is signalled.
///
/// A deliberate shutdown does not report `Disconnected`; the owner already
/// knows, and a late event could be mistaken for the next connection's.
async fn run_socket(
    url: String,
    events: mpsc::UnboundedSender<ClientEvent>,
    mut outbound_rx: mpsc::UnboundedReceiver<Vec<u8>>,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    tracing::info!(url = %url, "Connecting to WebSocket server");

    let result = tokio::select! {
        result = connect_async(url.as_str()) => result,
        _ = shutdown_rx.changed() => return,
    };

    let ws_stream = match result {
        Ok((ws_stream, _response)) => ws_stream,
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "WebSocket connection failed");
            let _ = events.send(ClientEvent::Disconnected);
            return;
        }
    };

    tracing::info!(url = %url, "WebSocket connection established");
    if events.send(ClientEvent::Connected).is_err() {
        return;
    }

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.changed() => {
                close_by_client(&url, &mut ws_sender, &mut outbound_rx).await;
                return;
            }

            frame = outbound_rx.recv() => {
                // The sender lives in the owner's `Link`; it is gone only
                // after `disconnect` or drop.
                let Some(frame) = frame else {
                    close_by_client(&url, &mut ws_sender, &mut outbound_rx).await;
                    return;
                };
                if let Err(e) = ws_sender.send(Message::Binary(frame)).await {
                    tracing::warn!(error = %e, "Failed to send frame");
                    break;
                }
            }

            msg = ws_receiver.next() => {
                match msg {
                    Some(Ok(Message::Binary(data))) => {
                        if events.send(ClientEvent::FrameReceived(data)).is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("Server closed connection");
                        break;
                    }
                    Some(Ok(_)) => {
                        // Text and control messages carry no protocol frames.
                    }
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket error");
                        break;
                    }
                    None => {
                        tracing::info!("Connection closed");
                        break;
                    }
                }
            }
        }
    }

    let _ = events.send(ClientEvent::Disconnected);
}

/// Flush frames queued before the shutdown (e.g. LEAVE), then send Close.
async fn close_by_client<S>(
    url: &str,
    ws_sender: &mut S,
    outbound_rx: &mut mpsc::UnboundedReceiver<Vec<u8>>,
) where
    S: futures::Sink<Message> + Unpin,
{
    while let Ok(frame) = outbound_rx.try_recv() {
        if ws_sender.send(Message::Binary(frame)).await.is_err() {
            break;
        }
    }
    let _ = ws_sender.send(Message::Close(None)).await;
    tracing::info!(url = %url, "WebSocket connection closed by client");
}
