//! CONTROL frames: ASSIGN, JOIN and LEAVE.

use crate::error::{DecodeError, ensure_len};
use crate::header::{ControlSubType, DataType, HEADER_LEN, write_header};
use crate::session_id::{SESSION_ID_LEN, SessionId};

/// Minimum length of an ASSIGN frame: header plus session id.
pub const ASSIGN_FRAME_LEN: usize = HEADER_LEN + SESSION_ID_LEN;

/// Length of a JOIN or LEAVE frame: header, session id, sequence number.
pub const CONTROL_FRAME_LEN: usize = ASSIGN_FRAME_LEN + 4;

/// A decoded client-originated control frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlMessage {
    /// JOIN or LEAVE.
    pub sub_type: ControlSubType,
    /// Sender's session id.
    pub session_id: SessionId,
    /// Sender's sequence number at the time of sending.
    pub seq: u32,
}

/// Encode a JOIN or LEAVE frame.
pub fn encode_control(session_id: &SessionId, seq: u32, sub_type: ControlSubType) -> Vec<u8> {
    let mut out = Vec::with_capacity(CONTROL_FRAME_LEN);
    write_header(&mut out, DataType::Control, sub_type.to_byte());
    out.extend_from_slice(session_id.as_bytes());
    out.extend_from_slice(&seq.to_le_bytes());
    out
}

/// Encode the server's ASSIGN frame.
pub fn encode_assign(session_id: &SessionId) -> Vec<u8> {
    let mut out = Vec::with_capacity(ASSIGN_FRAME_LEN);
    write_header(&mut out, DataType::Control, ControlSubType::Assign.to_byte());
    out.extend_from_slice(session_id.as_bytes());
    out
}

/// Extract the session id from an ASSIGN frame.
///
/// Bytes past [`ASSIGN_FRAME_LEN`] are ignored.
pub fn decode_assign(frame: &[u8]) -> Result<SessionId, DecodeError> {
    ensure_len(frame, ASSIGN_FRAME_LEN)?;
    expect_control(frame, ControlSubType::Assign)?;
    SessionId::from_slice(&frame[HEADER_LEN..ASSIGN_FRAME_LEN])
}

/// Decode a JOIN or LEAVE frame.
pub fn decode_control(frame: &[u8]) -> Result<ControlMessage, DecodeError> {
    ensure_len(frame, CONTROL_FRAME_LEN)?;
    if DataType::from_byte(frame[0]) != DataType::Control {
        return Err(DecodeError::UnexpectedDataType(frame[0]));
    }
    let sub_type = ControlSubType::from_byte(frame[1]);
    if !matches!(sub_type, ControlSubType::Join | ControlSubType::Leave) {
        return Err(DecodeError::UnexpectedSubType(frame[1]));
    }

    let session_id = SessionId::from_slice(&frame[HEADER_LEN..ASSIGN_FRAME_LEN])?;
    let mut seq = [0u8; 4];
    seq.copy_from_slice(&frame[ASSIGN_FRAME_LEN..CONTROL_FRAME_LEN]);

    Ok(ControlMessage {
        sub_type,
        session_id,
        seq: u32::from_le_bytes(seq),
    })
}

fn expect_control(frame: &[u8], expected: ControlSubType) -> Result<(), DecodeError> {
    if DataType::from_byte(frame[0]) != DataType::Control {
        return Err(DecodeError::UnexpectedDataType(frame[0]));
    }
    if ControlSubType::from_byte(frame[1]) != expected {
        return Err(DecodeError::UnexpectedSubType(frame[1]));
    }
    Ok(())
}
