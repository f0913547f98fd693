//! Collaborators for running without a window or keyboard.

use tracing::{debug, info};
use withered_client::{InputSampler, Renderer};
use withered_protocol::{Actor, KeyMask, SessionId};

/// Renderer that logs instead of drawing.
///
/// Reports when the visible actor count or the local session changes, and
/// the local actor's position at debug level.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    last_count: Option<usize>,
    last_local: Option<SessionId>,
    frames: u64,
}

impl HeadlessRenderer {
    /// Frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for HeadlessRenderer {
    fn render(&mut self, actors: &[Actor], local: Option<&SessionId>) {
        self.frames += 1;

        if self.last_count != Some(actors.len()) {
            info!(actors = actors.len(), "Visible actors changed");
            self.last_count = Some(actors.len());
        }

        if self.last_local.as_ref() != local {
            match local {
                Some(id) => info!(session_id = %id, "Playing as session"),
                None => info!("No local session"),
            }
            self.last_local = local.copied();
        }

        if let Some(me) = actors.iter().find(|a| a.is_local(local)) {
            debug!(x = me.x, y = me.y, frame = self.frames, "Local actor");
        }
    }
}

/// Input sampler with no keys ever held.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleInput;

impl InputSampler for IdleInput {
    fn key_mask(&mut self) -> KeyMask {
        KeyMask::NONE
    }
}

/// Walks a square: holds each direction for a fixed number of samples.
#[derive(Debug, Clone)]
pub struct BotInput {
    samples_per_leg: u32,
    samples: u32,
    released: bool,
}

const LEGS: [KeyMask; 4] = [KeyMask::UP, KeyMask::RIGHT, KeyMask::DOWN, KeyMask::LEFT];

impl BotInput {
    /// Hold each direction for `samples_per_leg` samples (at least one).
    pub fn new(samples_per_leg: u32) -> Self {
        Self {
            samples_per_leg: samples_per_leg.max(1),
            samples: 0,
            released: false,
        }
    }
}

impl Default for BotInput {
    fn default() -> Self {
        Self::new(30)
    }
}

impl InputSampler for BotInput {
    fn key_mask(&mut self) -> KeyMask {
        if self.released {
            return KeyMask::NONE;
        }
        let leg = (self.samples / self.samples_per_leg) as usize % LEGS.len();
        self.samples = self.samples.wrapping_add(1);
        LEGS[leg]
    }

    fn release(&mut self) {
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_input_holds_nothing() {
        assert!(IdleInput.key_mask().is_empty());
    }

    #[test]
    fn test_bot_walks_a_square() {
        let mut bot = BotInput::new(2);
        let masks: Vec<_> = (0..10).map(|_| bot.key_mask()).collect();
        assert_eq!(
            masks,
            vec![
                KeyMask::UP,
                KeyMask::UP,
                KeyMask::RIGHT,
                KeyMask::RIGHT,
                KeyMask::DOWN,
                KeyMask::DOWN,
                KeyMask::LEFT,
                KeyMask::LEFT,
                KeyMask::UP,
                KeyMask::UP,
            ]
        );
    }

    #[test]
    fn test_bot_stops_after_release() {
        let mut bot = BotInput::new(1);
        bot.release();
        assert!(bot.key_mask().is_empty());
    }

    #[test]
    fn test_headless_renderer_counts_frames() {
        let mut renderer = HeadlessRenderer::default();
        let me = SessionId::new([7; 16]);
        let actors = [Actor {
            session_id: me,
            x: 1.0,
            y: 2.0,
        }];
        renderer.render(&[], None);
        renderer.render(&actors, Some(&me));
        renderer.render(&actors, Some(&me));

        assert_eq!(renderer.frames(), 3);
        assert_eq!(renderer.last_count, Some(1));
        assert_eq!(renderer.last_local, Some(me));
    }
}
