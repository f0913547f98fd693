//! In-process transport that records outbound frames.
//!
//! Clones share one link, so a test can keep a handle while the controller
//! owns another and inspect what was sent or simulate a dropped connection.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;

use super::{Transport, TransportError};
use crate::controller::ClientEvent;

#[derive(Default)]
struct MemoryLink {
    connected: bool,
    connect_count: u32,
    fail_sends: bool,
    refuse_connects: bool,
    sent: Vec<Vec<u8>>,
    events: Option<mpsc::UnboundedSender<ClientEvent>>,
}

/// A transport that connects instantly and keeps every sent frame.
#[derive(Clone, Default)]
pub struct MemoryTransport {
    link: Arc<Mutex<MemoryLink>>,
}

impl MemoryTransport {
    /// A transport that reports nothing; events are fed to the controller by hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// A transport that reports every `connect` outcome and
    /// `Disconnected` on [`drop_connection`](Self::drop_connection).
    pub fn with_events(events: mpsc::UnboundedSender<ClientEvent>) -> Self {
        let transport = Self::default();
        transport.lock().events = Some(events);
        transport
    }

    /// Frames sent so far, oldest first.
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.lock().sent.clone()
    }

    /// Drain and return the frames sent so far.
    pub fn take_sent(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut self.lock().sent)
    }

    /// Number of `connect` calls.
    pub fn connect_count(&self) -> u32 {
        self.lock().connect_count
    }

    /// Whether the link is currently up.
    pub fn is_connected(&self) -> bool {
        self.lock().connected
    }

    /// Make subsequent sends fail with [`TransportError::Closed`].
    pub fn set_fail_sends(&self, fail: bool) {
        self.lock().fail_sends = fail;
    }

    /// Make subsequent connects fail the way an unreachable server does:
    /// the attempt is counted and reported as `Disconnected`.
    pub fn set_refuse_connects(&self, refuse: bool) {
        self.lock().refuse_connects = refuse;
    }

    /// Simulate the peer going away.
    pub fn drop_connection(&self) {
        let mut link = self.lock();
        link.connected = false;
        if let Some(events) = &link.events {
            let _ = events.send(ClientEvent::Disconnected);
        }
    }

    fn lock(&self) -> MutexGuard<'_, MemoryLink> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Transport for MemoryTransport {
    fn connect(&mut self) -> Result<(), TransportError> {
        let mut link = self.lock();
        link.connect_count += 1;
        link.connected = !link.refuse_connects;
        let event = if link.connected {
            ClientEvent::Connected
        } else {
            ClientEvent::Disconnected
        };
        if let Some(events) = &link.events {
            let _ = events.send(event);
        }
        Ok(())
    }

    fn send(&mut self, frame: Vec<u8>) -> Result<(), TransportError> {
        let mut link = self.lock();
        if !link.connected {
            return Err(TransportError::NotConnected);
        }
        if link.fail_sends {
            return Err(TransportError::Closed);
        }
        link.sent.push(frame);
        Ok(())
    }

    fn disconnect(&mut self) {
        self.lock().connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_before_connect_fails() {
        let mut transport = MemoryTransport::new();
        assert_eq!(transport.send(vec![1]), Err(TransportError::NotConnected));
    }

    #[test]
    fn test_clones_share_sent_frames() {
        let observer = MemoryTransport::new();
        let mut transport = observer.clone();
        transport.connect().unwrap();
        transport.send(vec![1, 2]).unwrap();
        transport.send(vec![3]).unwrap();

        assert_eq!(observer.sent(), vec![vec![1, 2], vec![3]]);
        assert_eq!(observer.take_sent().len(), 2);
        assert!(observer.sent().is_empty());
    }

    #[test]
    fn test_failing_sends() {
        let mut transport = MemoryTransport::new();
        transport.connect().unwrap();
        transport.set_fail_sends(true);
        assert_eq!(transport.send(vec![1]), Err(TransportError::Closed));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_events_are_reported() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = MemoryTransport::with_events(tx);
        transport.connect().unwrap();
        transport.drop_connection();

        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Connected)));
        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Disconnected)));
        assert!(!transport.is_connected());
        assert_eq!(transport.connect_count(), 1);
    }

    #[test]
    fn test_refused_connect_reports_disconnected() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut transport = MemoryTransport::with_events(tx);
        transport.set_refuse_connects(true);
        transport.connect().unwrap();

        assert!(matches!(rx.try_recv(), Ok(ClientEvent::Disconnected)));
        assert!(!transport.is_connected());
        assert_eq!(transport.connect_count(), 1);
    }
}
