//! INPUT frames and the key bitmask they carry.

use std::ops::{BitOr, BitOrAssign};

use crate::control::{ASSIGN_FRAME_LEN, CONTROL_FRAME_LEN};
use crate::error::{DecodeError, ensure_len};
use crate::header::{DataType, HEADER_LEN, write_header};
use crate::session_id::SessionId;

/// Length of an INPUT frame: header, session id, sequence, key mask.
pub const INPUT_FRAME_LEN: usize = CONTROL_FRAME_LEN + 2;

/// Bit-per-key set of currently held controls. Combines via bitwise OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct KeyMask(pub u16);

impl KeyMask {
    /// No keys held.
    pub const NONE: Self = Self(0);
    /// Move up.
    pub const UP: Self = Self(1 << 0);
    /// Move down.
    pub const DOWN: Self = Self(1 << 1);
    /// Move left.
    pub const LEFT: Self = Self(1 << 2);
    /// Move right.
    pub const RIGHT: Self = Self(1 << 3);
    /// Primary action.
    pub const ACTION: Self = Self(1 << 4);

    /// Returns `true` if no key is held.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for KeyMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KeyMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// A decoded INPUT frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputMessage {
    /// Sender's session id.
    pub session_id: SessionId,
    /// Sender's sequence number.
    pub seq: u32,
    /// Keys held when the frame was sampled.
    pub key_mask: KeyMask,
}

/// Encode an INPUT frame. The sub-type byte is zero.
pub fn encode_input(session_id: &SessionId, seq: u32, key_mask: KeyMask) -> Vec<u8> {
    let mut out = Vec::with_capacity(INPUT_FRAME_LEN);
    write_header(&mut out, DataType::Input, 0);
    out.extend_from_slice(session_id.as_bytes());
    out.extend_from_slice(&seq.to_le_bytes());
    out.extend_from_slice(&key_mask.0.to_le_bytes());
    out
}

/// Decode an INPUT frame.
pub fn decode_input(frame: &[u8]) -> Result<InputMessage, DecodeError> {
    ensure_len(frame, INPUT_FRAME_LEN)?;
    if DataType::from_byte(frame[0]) != DataType::Input {
        return Err(DecodeError::UnexpectedDataType(frame[0]));
    }

    let session_id = SessionId::from_slice(&frame[HEADER_LEN..ASSIGN_FRAME_LEN])?;
    let mut seq = [0u8; 4];
    seq.copy_from_slice(&frame[ASSIGN_FRAME_LEN..CONTROL_FRAME_LEN]);
    let mut mask = [0u8; 2];
    mask.copy_from_slice(&frame[CONTROL_FRAME_LEN..INPUT_FRAME_LEN]);

    Ok(InputMessage {
        session_id,
        seq: u32::from_le_bytes(seq),
        key_mask: KeyMask(u16::from_le_bytes(mask)),
    })
}
