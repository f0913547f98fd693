//! Client-side session layer: connection/session state machine, the
//! fixed-cadence loop that ties input, outbound frames and rendering
//! together, and the transports it runs over.

pub mod controller;
pub mod reconnection;
pub mod runner;
pub mod session;
pub mod transport;

pub use controller::{ClientController, ClientEvent, ClientStats, InputSampler, Renderer};
pub use reconnection::{ReconnectConfig, ReconnectState};
pub use runner::{ClientLoop, LoopConfig, LoopHandle};
pub use session::{ConnectionState, SessionState};
pub use transport::{MemoryTransport, Transport, TransportError, WebSocketTransport};
