//! Client controller: the connection/session state machine and one loop tick.
//!
//! Transport notifications arrive as [`ClientEvent`]s and are consumed one at
//! a time by [`ClientController::handle_event`]. The controller never claims
//! an identity on its own: it sends JOIN only in reaction to the server's
//! ASSIGN, and every other outbound frame comes from [`ClientController::tick`].
//! Malformed inbound frames are logged and dropped.

use tracing::{debug, info, warn};
use withered_protocol::{
    Actor, ControlSubType, DataType, KeyMask, SessionId, control_sub_type, data_type,
    decode_actor_broadcast, decode_assign, encode_control, encode_input,
};

use crate::session::{ConnectionState, SessionState};
use crate::transport::{Transport, TransportError};

/// Something the transport observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// The transport connection is up.
    Connected,
    /// The transport connection is gone.
    Disconnected,
    /// One inbound binary frame.
    FrameReceived(Vec<u8>),
}

/// Draws the world. Receives a read-only view of the latest actor list.
pub trait Renderer {
    /// Draw one frame. `local` is `None` until the server assigns a session.
    fn render(&mut self, actors: &[Actor], local: Option<&SessionId>);
}

/// Samples the currently held control keys.
pub trait InputSampler {
    /// Keys held right now.
    fn key_mask(&mut self) -> KeyMask;

    /// Release any resources (listeners, devices). Called once on teardown.
    fn release(&mut self) {}
}

/// Traffic counters, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Inbound frames seen, including dropped and ignored ones.
    pub frames_received: u64,
    /// Inbound frames dropped as malformed or out of place.
    pub frames_dropped: u64,
    /// Inbound frames with a tag this client does not handle.
    pub frames_ignored: u64,
    /// Outbound frames accepted by the transport.
    pub frames_sent: u64,
    /// Outbound frames the transport refused.
    pub send_failures: u64,
}

/// Owns the session state and actor list, and ties transport, input and
/// renderer together.
pub struct ClientController<T, I, R> {
    transport: T,
    input: I,
    renderer: R,
    session: SessionState,
    actors: Vec<Actor>,
    stats: ClientStats,
    torn_down: bool,
}

impl<T, I, R> ClientController<T, I, R>
where
    T: Transport,
    I: InputSampler,
    R: Renderer,
{
    /// Sequence 0, no session, disconnected. Touches no network.
    pub fn new(transport: T, input: I, renderer: R) -> Self {
        Self {
            transport,
            input,
            renderer,
            session: SessionState::new(),
            actors: Vec::new(),
            stats: ClientStats::default(),
            torn_down: false,
        }
    }

    /// Ask the transport to connect. The outcome arrives later as an event.
    pub fn start(&mut self) -> Result<(), TransportError> {
        info!("Starting client");
        self.torn_down = false;
        self.transport.connect()
    }

    /// Ask the transport to connect again after a drop.
    pub fn reconnect(&mut self) -> Result<(), TransportError> {
        info!("Reconnecting to server");
        self.transport.connect()
    }

    /// Apply one transport event.
    pub fn handle_event(&mut self, event: ClientEvent) {
        match event {
            ClientEvent::Connected => self.on_connect(),
            ClientEvent::Disconnected => self.on_disconnect(),
            ClientEvent::FrameReceived(frame) => self.on_frame(&frame),
        }
    }

    /// One loop iteration: send held keys (if any) then render.
    ///
    /// Input is only sampled once a session exists. Rendering happens in
    /// every state so the display never freezes on a stale frame.
    pub fn tick(&mut self) {
        if self.session.is_ready() {
            let key_mask = self.input.key_mask();
            if !key_mask.is_empty() {
                self.send_input(key_mask);
            }
        }

        self.renderer
            .render(&self.actors, self.session.session_id());
    }

    /// Leave the session (best effort), close the transport and release input.
    ///
    /// Safe to call more than once; only the first call has an effect.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;

        if let Some(session_id) = self.ready_session() {
            let seq = self.session.next_sequence();
            let frame = encode_control(&session_id, seq, ControlSubType::Leave);
            match self.transport.send(frame) {
                Ok(()) => {
                    self.stats.frames_sent += 1;
                    info!(session_id = %session_id, seq, "Sent LEAVE");
                }
                Err(e) => {
                    self.stats.send_failures += 1;
                    debug!(error = %e, "LEAVE not delivered during teardown");
                }
            }
        }

        self.transport.disconnect();
        self.input.release();
        self.session.mark_disconnected();
        self.actors.clear();
        info!("Client torn down");
    }

    /// Current transport state.
    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection()
    }

    /// The server-assigned session id, if any.
    pub fn session_id(&self) -> Option<SessionId> {
        self.session.session_id().copied()
    }

    /// The sequence number the next outbound frame will carry.
    pub fn sequence(&self) -> u32 {
        self.session.sequence()
    }

    /// Connected with a session assigned.
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// The latest actor broadcast.
    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    /// Traffic counters.
    pub fn stats(&self) -> ClientStats {
        self.stats
    }

    /// The transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// The input sampler.
    pub fn input(&self) -> &I {
        &self.input
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    fn on_connect(&mut self) {
        self.session.mark_connected();
        info!("Connected to server, waiting for session id");
    }

    fn on_disconnect(&mut self) {
        self.session.mark_disconnected();
        self.actors.clear();
        info!(seq = self.session.sequence(), "Disconnected from server");
    }

    fn on_frame(&mut self, frame: &[u8]) {
        self.stats.frames_received += 1;

        match data_type(frame) {
            Some(DataType::Control) => self.on_control(frame),
            Some(DataType::Actor) => self.on_actor_broadcast(frame),
            Some(other) => {
                self.stats.frames_ignored += 1;
                debug!(tag = other.to_byte(), "Ignoring frame with unhandled data type");
            }
            None => {
                self.stats.frames_dropped += 1;
                warn!("Dropping empty frame");
            }
        }
    }

    fn on_control(&mut self, frame: &[u8]) {
        match control_sub_type(frame) {
            Some(ControlSubType::Assign) => self.on_assign(frame),
            Some(other) => {
                self.stats.frames_ignored += 1;
                debug!(sub_type = other.to_byte(), "Ignoring control frame");
            }
            None => {
                self.stats.frames_dropped += 1;
                warn!(len = frame.len(), "Dropping control frame without sub type");
            }
        }
    }

    fn on_assign(&mut self, frame: &[u8]) {
        if self.session.connection() != ConnectionState::Connected {
            self.stats.frames_dropped += 1;
            warn!("Dropping ASSIGN received while disconnected");
            return;
        }

        let session_id = match decode_assign(frame) {
            Ok(id) => id,
            Err(e) => {
                self.stats.frames_dropped += 1;
                warn!(error = %e, "Dropping malformed ASSIGN frame");
                return;
            }
        };

        info!(session_id = %session_id, "Received session id");
        self.session.assign(session_id);

        let seq = self.session.next_sequence();
        let frame = encode_control(&session_id, seq, ControlSubType::Join);
        if self.send(frame) {
            info!(session_id = %session_id, seq, "Sent JOIN");
        }
    }

    fn on_actor_broadcast(&mut self, frame: &[u8]) {
        match decode_actor_broadcast(frame) {
            Ok(actors) => {
                debug!(count = actors.len(), "Actor broadcast");
                self.actors = actors;
            }
            Err(e) => {
                self.stats.frames_dropped += 1;
                warn!(error = %e, "Dropping malformed actor broadcast");
            }
        }
    }

    fn send_input(&mut self, key_mask: KeyMask) {
        let Some(session_id) = self.ready_session() else {
            return;
        };
        let seq = self.session.next_sequence();
        let frame = encode_input(&session_id, seq, key_mask);
        self.send(frame);
    }

    fn send(&mut self, frame: Vec<u8>) -> bool {
        match self.transport.send(frame) {
            Ok(()) => {
                self.stats.frames_sent += 1;
                true
            }
            Err(e) => {
                self.stats.send_failures += 1;
                warn!(error = %e, "Failed to send frame");
                false
            }
        }
    }

    fn ready_session(&self) -> Option<SessionId> {
        if self.session.is_ready() {
            self.session.session_id().copied()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MemoryTransport;
    use std::collections::VecDeque;
    use withered_protocol::{
        ACTOR_RECORD_LEN, ControlMessage, decode_control, decode_input, encode_actor_broadcast,
        encode_assign,
    };

    const ID: SessionId = SessionId::new([0xAA; 16]);

    /// Replays a scripted sequence of key masks, then reports nothing held.
    #[derive(Default)]
    struct ScriptedInput {
        masks: VecDeque<KeyMask>,
        samples: u32,
        released: bool,
    }

    impl ScriptedInput {
        fn with(masks: &[KeyMask]) -> Self {
            Self {
                masks: masks.iter().copied().collect(),
                ..Default::default()
            }
        }
    }

    impl InputSampler for ScriptedInput {
        fn key_mask(&mut self) -> KeyMask {
            self.samples += 1;
            self.masks.pop_front().unwrap_or(KeyMask::NONE)
        }

        fn release(&mut self) {
            self.released = true;
        }
    }

    /// Records what each frame was rendered with.
    #[derive(Default)]
    struct RecordingRenderer {
        frames: Vec<(Vec<Actor>, Option<SessionId>)>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&mut self, actors: &[Actor], local: Option<&SessionId>) {
            self.frames.push((actors.to_vec(), local.copied()));
        }
    }

    type TestController = ClientController<MemoryTransport, ScriptedInput, RecordingRenderer>;

    fn controller_with_input(masks: &[KeyMask]) -> (TestController, MemoryTransport) {
        let transport = MemoryTransport::new();
        let controller =
            ClientController::new(transport.clone(), ScriptedInput::with(masks), Default::default());
        (controller, transport)
    }

    fn controller() -> (TestController, MemoryTransport) {
        controller_with_input(&[])
    }

    fn connected_and_assigned(masks: &[KeyMask]) -> (TestController, MemoryTransport) {
        let (mut c, t) = controller_with_input(masks);
        c.start().unwrap();
        c.handle_event(ClientEvent::Connected);
        c.handle_event(ClientEvent::FrameReceived(encode_assign(&ID)));
        (c, t)
    }

    fn actor(tag: u8, x: f32, y: f32) -> Actor {
        Actor {
            session_id: SessionId::new([tag; 16]),
            x,
            y,
        }
    }

    fn sequences(frames: &[Vec<u8>]) -> Vec<u32> {
        frames
            .iter()
            .map(|f| u32::from_le_bytes([f[18], f[19], f[20], f[21]]))
            .collect()
    }

    #[test]
    fn test_construction_is_idle() {
        let (c, t) = controller();
        assert_eq!(c.connection_state(), ConnectionState::Disconnected);
        assert_eq!(c.session_id(), None);
        assert_eq!(c.sequence(), 0);
        assert!(c.actors().is_empty());
        assert_eq!(t.connect_count(), 0);
    }

    #[test]
    fn test_start_connects_transport() {
        let (mut c, t) = controller();
        c.start().unwrap();
        assert_eq!(t.connect_count(), 1);
        // Still disconnected until the transport reports in.
        assert_eq!(c.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_connect_does_not_send_join() {
        let (mut c, t) = controller();
        c.start().unwrap();
        c.handle_event(ClientEvent::Connected);

        assert_eq!(c.connection_state(), ConnectionState::Connected);
        assert!(!c.is_ready());
        assert!(t.sent().is_empty());
    }

    #[test]
    fn test_full_session_scenario() {
        let (mut c, t) = controller();
        c.start().unwrap();
        c.handle_event(ClientEvent::Connected);
        c.handle_event(ClientEvent::FrameReceived(encode_assign(&ID)));

        let sent = t.sent();
        assert_eq!(sent.len(), 1, "exactly one JOIN after ASSIGN");
        assert_eq!(
            decode_control(&sent[0]).unwrap(),
            ControlMessage {
                sub_type: ControlSubType::Join,
                session_id: ID,
                seq: 0,
            }
        );

        let actors = vec![actor(1, 1.0, 2.0), actor(2, 3.0, 4.0)];
        c.handle_event(ClientEvent::FrameReceived(encode_actor_broadcast(&actors)));
        assert_eq!(c.actors(), actors.as_slice());

        c.handle_event(ClientEvent::Disconnected);
        assert_eq!(c.session_id(), None);
        assert!(c.actors().is_empty());
        assert_eq!(c.sequence(), 1);
        assert_eq!(c.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_assign_while_disconnected_is_dropped() {
        let (mut c, t) = controller();
        c.handle_event(ClientEvent::FrameReceived(encode_assign(&ID)));

        assert_eq!(c.session_id(), None);
        assert!(t.sent().is_empty());
        assert_eq!(c.stats().frames_dropped, 1);
    }

    #[test]
    fn test_each_assign_triggers_one_join() {
        let (mut c, t) = connected_and_assigned(&[]);
        let second = SessionId::new([0xBB; 16]);
        c.handle_event(ClientEvent::FrameReceived(encode_assign(&second)));

        let joins: Vec<_> = t
            .sent()
            .iter()
            .map(|f| decode_control(f).unwrap())
            .collect();
        assert_eq!(joins.len(), 2);
        assert_eq!(joins[1].session_id, second);
        assert_eq!(joins[1].seq, 1);
        assert_eq!(c.session_id(), Some(second));
    }

    #[test]
    fn test_broadcast_replaces_never_merges() {
        let (mut c, _t) = connected_and_assigned(&[]);
        let first = vec![actor(1, 0.0, 0.0), actor(2, 0.0, 0.0), actor(3, 0.0, 0.0)];
        let second = vec![actor(9, 5.0, 5.0)];

        c.handle_event(ClientEvent::FrameReceived(encode_actor_broadcast(&first)));
        c.handle_event(ClientEvent::FrameReceived(encode_actor_broadcast(&second)));
        assert_eq!(c.actors(), second.as_slice());

        c.handle_event(ClientEvent::FrameReceived(encode_actor_broadcast(&[])));
        assert!(c.actors().is_empty());
    }

    #[test]
    fn test_malformed_broadcast_keeps_previous_list() {
        let (mut c, _t) = connected_and_assigned(&[]);
        let actors = vec![actor(1, 0.0, 0.0)];
        c.handle_event(ClientEvent::FrameReceived(encode_actor_broadcast(&actors)));

        let mut truncated = encode_actor_broadcast(&[actor(2, 0.0, 0.0), actor(3, 0.0, 0.0)]);
        truncated.truncate(4 + ACTOR_RECORD_LEN);
        c.handle_event(ClientEvent::FrameReceived(truncated));

        assert_eq!(c.actors(), actors.as_slice());
        assert_eq!(c.stats().frames_dropped, 1);
    }

    #[test]
    fn test_truncated_assign_is_dropped() {
        let (mut c, t) = controller();
        c.start().unwrap();
        c.handle_event(ClientEvent::Connected);
        c.handle_event(ClientEvent::FrameReceived(encode_assign(&ID)[..8].to_vec()));

        assert_eq!(c.session_id(), None);
        assert!(t.sent().is_empty());
        assert_eq!(c.sequence(), 0);
    }

    #[test]
    fn test_unknown_and_empty_frames_do_not_disturb_state() {
        let (mut c, t) = connected_and_assigned(&[]);
        c.handle_event(ClientEvent::FrameReceived(vec![0x7F, 0, 1, 2, 3]));
        c.handle_event(ClientEvent::FrameReceived(Vec::new()));
        c.handle_event(ClientEvent::FrameReceived(vec![1]));
        c.handle_event(ClientEvent::FrameReceived(encode_control(
            &ID,
            0,
            ControlSubType::Join,
        )));

        assert_eq!(c.session_id(), Some(ID));
        assert_eq!(t.sent().len(), 1);
        let stats = c.stats();
        assert_eq!(stats.frames_ignored, 2);
        assert_eq!(stats.frames_dropped, 2);
        assert_eq!(stats.frames_received, 5);
    }

    #[test]
    fn test_zero_mask_is_silent() {
        let (mut c, t) = connected_and_assigned(&[KeyMask::NONE, KeyMask::NONE]);
        t.take_sent();
        c.tick();
        c.tick();
        assert!(t.sent().is_empty());
        assert_eq!(c.sequence(), 1);
    }

    #[test]
    fn test_non_zero_mask_sends_one_input_per_tick() {
        let masks = [KeyMask::UP, KeyMask::NONE, KeyMask::LEFT | KeyMask::ACTION];
        let (mut c, t) = connected_and_assigned(&masks);
        t.take_sent();
        for _ in 0..3 {
            c.tick();
        }

        let sent = t.sent();
        assert_eq!(sent.len(), 2);
        let first = decode_input(&sent[0]).unwrap();
        let second = decode_input(&sent[1]).unwrap();
        assert_eq!((first.seq, first.key_mask), (1, KeyMask::UP));
        assert_eq!(
            (second.seq, second.key_mask),
            (2, KeyMask::LEFT | KeyMask::ACTION)
        );
        assert_eq!(first.session_id, ID);
    }

    #[test]
    fn test_input_not_sampled_without_session() {
        let (mut c, t) = controller_with_input(&[KeyMask::UP]);
        c.start().unwrap();
        c.handle_event(ClientEvent::Connected);
        c.tick();

        assert_eq!(c.input().samples, 0);
        assert!(t.sent().is_empty());
    }

    #[test]
    fn test_sequence_is_monotonic_across_message_kinds() {
        let masks = [KeyMask::UP, KeyMask::DOWN, KeyMask::RIGHT];
        let (mut c, t) = connected_and_assigned(&masks);
        for _ in 0..3 {
            c.tick();
        }
        c.teardown();

        assert_eq!(sequences(&t.sent()), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_sequence_survives_reconnect() {
        let (mut c, t) = connected_and_assigned(&[KeyMask::UP]);
        c.tick();
        c.handle_event(ClientEvent::Disconnected);
        assert_eq!(c.sequence(), 2);

        c.reconnect().unwrap();
        c.handle_event(ClientEvent::Connected);
        c.handle_event(ClientEvent::FrameReceived(encode_assign(&ID)));

        let last = t.sent().pop().unwrap();
        assert_eq!(decode_control(&last).unwrap().seq, 2);
    }

    #[test]
    fn test_render_runs_in_every_state() {
        let (mut c, _t) = controller();
        c.tick();
        c.start().unwrap();
        c.handle_event(ClientEvent::Connected);
        c.tick();
        c.handle_event(ClientEvent::FrameReceived(encode_assign(&ID)));
        let actors = vec![actor(0xAA, 1.0, 1.0)];
        c.handle_event(ClientEvent::FrameReceived(encode_actor_broadcast(&actors)));
        c.tick();
        c.handle_event(ClientEvent::Disconnected);
        c.tick();

        let frames = &c.renderer().frames;
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], (Vec::new(), None));
        assert_eq!(frames[1], (Vec::new(), None));
        assert_eq!(frames[2], (actors, Some(ID)));
        assert_eq!(frames[3], (Vec::new(), None));
    }

    #[test]
    fn test_teardown_sends_leave_and_releases() {
        let (mut c, t) = connected_and_assigned(&[]);
        c.teardown();

        let sent = t.sent();
        let leave = decode_control(sent.last().unwrap()).unwrap();
        assert_eq!(leave.sub_type, ControlSubType::Leave);
        assert_eq!(leave.session_id, ID);
        assert_eq!(leave.seq, 1);
        assert!(!t.is_connected());
        assert!(c.input().released);
        assert_eq!(c.session_id(), None);
    }

    #[test]
    fn test_teardown_without_session_sends_nothing() {
        let (mut c, t) = controller();
        c.start().unwrap();
        c.handle_event(ClientEvent::Connected);
        c.teardown();

        assert!(t.sent().is_empty());
        assert!(c.input().released);
    }

    #[test]
    fn test_teardown_send_failure_is_not_escalated() {
        let (mut c, t) = connected_and_assigned(&[]);
        t.set_fail_sends(true);
        c.teardown();

        assert_eq!(c.stats().send_failures, 1);
        assert!(!t.is_connected());
        assert!(c.input().released);
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let (mut c, t) = connected_and_assigned(&[]);
        c.teardown();
        c.teardown();
        assert_eq!(t.sent().len(), 2, "JOIN then a single LEAVE");
    }

    #[test]
    fn test_controllers_do_not_share_state() {
        let (mut a, _ta) = connected_and_assigned(&[]);
        let (b, tb) = controller();
        a.handle_event(ClientEvent::FrameReceived(encode_actor_broadcast(&[actor(
            1, 0.0, 0.0,
        )])));

        assert_eq!(b.session_id(), None);
        assert!(b.actors().is_empty());
        assert_eq!(b.sequence(), 0);
        assert!(tb.sent().is_empty());
    }
}
