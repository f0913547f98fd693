//! Session-scoped client state.
//!
//! Tracks Disconnected → Connected → Connected-with-session. The session id
//! only ever comes from the server; the sequence counter outlives sessions.

use withered_protocol::SessionId;

/// Transport-level connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport connection.
    Disconnected,
    /// Transport is up. A session may or may not have been assigned yet.
    Connected,
}

/// Session id, sequence counter and connectivity for one client.
#[derive(Debug, Clone)]
pub struct SessionState {
    connection: ConnectionState,
    session_id: Option<SessionId>,
    sequence: u32,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    /// Disconnected, no session, sequence 0.
    pub fn new() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            session_id: None,
            sequence: 0,
        }
    }

    /// Current connection state.
    pub fn connection(&self) -> ConnectionState {
        self.connection
    }

    /// The assigned session id, if any.
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// The value the next outbound frame will carry.
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Connected and holding a server-assigned session id.
    pub fn is_ready(&self) -> bool {
        self.connection == ConnectionState::Connected && self.session_id.is_some()
    }

    /// Transport came up.
    pub fn mark_connected(&mut self) {
        self.connection = ConnectionState::Connected;
    }

    /// Transport went away. Clears the session id; the sequence is kept.
    pub fn mark_disconnected(&mut self) {
        self.connection = ConnectionState::Disconnected;
        self.session_id = None;
    }

    /// Store a server-assigned session id, replacing any previous one.
    pub fn assign(&mut self, session_id: SessionId) {
        self.session_id = Some(session_id);
    }

    /// Return the current sequence value and advance it, wrapping at `u32::MAX`.
    pub fn next_sequence(&mut self) -> u32 {
        let seq = self.sequence;
        self.sequence = self.sequence.wrapping_add(1);
        seq
    }
}
