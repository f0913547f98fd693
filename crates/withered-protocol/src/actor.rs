//! ACTOR broadcasts: the server's complete list of entities for one tick.

use crate::error::{DecodeError, ensure_len};
use crate::header::{DataType, HEADER_LEN, write_header};
use crate::session_id::{SESSION_ID_LEN, SessionId};

/// Size of one actor record: session id, x, y.
pub const ACTOR_RECORD_LEN: usize = SESSION_ID_LEN + 4 + 4;

const COUNT_LEN: usize = 2;

/// A server-reported entity snapshot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Actor {
    /// Owning session. Compared against the local session id to find "me".
    pub session_id: SessionId,
    /// World X position.
    pub x: f32,
    /// World Y position.
    pub y: f32,
}

impl Actor {
    /// Returns `true` if this actor belongs to `local`.
    pub fn is_local(&self, local: Option<&SessionId>) -> bool {
        local.is_some_and(|id| *id == self.session_id)
    }
}

/// Encode an ACTOR broadcast.
///
/// Lists longer than `u16::MAX` are cut to the first `u16::MAX` actors.
pub fn encode_actor_broadcast(actors: &[Actor]) -> Vec<u8> {
    let actors = &actors[..actors.len().min(u16::MAX as usize)];
    let mut out = Vec::with_capacity(HEADER_LEN + COUNT_LEN + actors.len() * ACTOR_RECORD_LEN);
    write_header(&mut out, DataType::Actor, 0);
    out.extend_from_slice(&(actors.len() as u16).to_le_bytes());
    for actor in actors {
        out.extend_from_slice(actor.session_id.as_bytes());
        out.extend_from_slice(&actor.x.to_le_bytes());
        out.extend_from_slice(&actor.y.to_le_bytes());
    }
    out
}

/// Decode an ACTOR broadcast into an ordered actor list.
///
/// A count of zero yields an empty list. Bytes after the last record are
/// ignored; a frame too short for its declared count is rejected.
pub fn decode_actor_broadcast(frame: &[u8]) -> Result<Vec<Actor>, DecodeError> {
    ensure_len(frame, HEADER_LEN + COUNT_LEN)?;
    if DataType::from_byte(frame[0]) != DataType::Actor {
        return Err(DecodeError::UnexpectedDataType(frame[0]));
    }

    let count = u16::from_le_bytes([frame[HEADER_LEN], frame[HEADER_LEN + 1]]) as usize;
    let body = &frame[HEADER_LEN + COUNT_LEN..];
    ensure_len(frame, HEADER_LEN + COUNT_LEN + count * ACTOR_RECORD_LEN)?;

    body.chunks_exact(ACTOR_RECORD_LEN)
        .take(count)
        .map(decode_record)
        .collect()
}

fn decode_record(record: &[u8]) -> Result<Actor, DecodeError> {
    let session_id = SessionId::from_slice(&record[..SESSION_ID_LEN])?;
    let mut x = [0u8; 4];
    x.copy_from_slice(&record[SESSION_ID_LEN..SESSION_ID_LEN + 4]);
    let mut y = [0u8; 4];
    y.copy_from_slice(&record[SESSION_ID_LEN + 4..ACTOR_RECORD_LEN]);
    Ok(Actor {
        session_id,
        x: f32::from_le_bytes(x),
        y: f32::from_le_bytes(y),
    })
}
