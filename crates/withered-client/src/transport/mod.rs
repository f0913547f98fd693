//! Transport boundary between the controller and the network.
//!
//! A transport moves opaque frames; it knows nothing about their layout.
//! Connection changes and inbound frames are reported as
//! [`ClientEvent`](crate::ClientEvent)s on a channel supplied at construction.

pub mod memory;
pub mod websocket;

pub use memory::MemoryTransport;
pub use websocket::WebSocketTransport;

/// Errors surfaced by [`Transport`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// `send` was called before `connect`, or after `disconnect`.
    #[error("transport is not connected")]
    NotConnected,

    /// The connection task has already shut down.
    #[error("transport connection closed")]
    Closed,

    /// `connect` was called outside a tokio runtime.
    #[error("no tokio runtime available to drive the connection")]
    NoRuntime,
}

/// Non-blocking, fire-and-forget frame transport.
pub trait Transport {
    /// Begin connecting. Completion is reported asynchronously as
    /// `ClientEvent::Connected` or `ClientEvent::Disconnected`.
    fn connect(&mut self) -> Result<(), TransportError>;

    /// Queue one frame for delivery. No acknowledgement is given.
    fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError>;

    /// Close the connection. Frames queued before this call are still flushed.
    fn disconnect(&mut self);
}
