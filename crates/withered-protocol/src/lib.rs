//! Binary wire protocol shared by the Withered client and game server.
//!
//! Every frame starts with a two-byte payload header (data type, sub type)
//! so a receiver can dispatch with [`data_type`] / [`control_sub_type`]
//! before committing to a full decode. All multi-byte integers are
//! little-endian.
//!
//! ```text
//! +-----------+----------+-----------------------------------------+
//! | data type | sub type | body (layout depends on the data type)  |
//! |   u8      |   u8     |                                         |
//! +-----------+----------+-----------------------------------------+
//! ```
//!
//! | Frame        | Body                                          |
//! |--------------|-----------------------------------------------|
//! | ASSIGN       | session id (16)                               |
//! | JOIN / LEAVE | session id (16), seq u32                      |
//! | INPUT        | session id (16), seq u32, key mask u16        |
//! | ACTOR        | count u16, count x { session id, x f32, y f32 } |

pub mod actor;
pub mod control;
pub mod error;
pub mod header;
pub mod input;
pub mod session_id;

pub use actor::{ACTOR_RECORD_LEN, Actor, decode_actor_broadcast, encode_actor_broadcast};
pub use control::{
    ASSIGN_FRAME_LEN, CONTROL_FRAME_LEN, ControlMessage, decode_assign, decode_control,
    encode_assign, encode_control,
};
pub use error::DecodeError;
pub use header::{ControlSubType, DataType, HEADER_LEN, control_sub_type, data_type};
pub use input::{INPUT_FRAME_LEN, InputMessage, KeyMask, decode_input, encode_input};
pub use session_id::{SESSION_ID_LEN, SessionId};
