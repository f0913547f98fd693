//! Payload header tags and non-consuming peeks used for dispatch.

/// Length of the payload header that starts every frame.
pub const HEADER_LEN: usize = 2;

/// Leading data-type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// Session control: assign, join, leave.
    Control,
    /// Server broadcast of every actor in the room.
    Actor,
    /// Client key state.
    Input,
    /// A tag this client does not know. Receivers ignore it.
    Unknown(u8),
}

impl DataType {
    const CONTROL: u8 = 1;
    const ACTOR: u8 = 2;
    const INPUT: u8 = 3;

    /// Wire value of this tag.
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Control => Self::CONTROL,
            Self::Actor => Self::ACTOR,
            Self::Input => Self::INPUT,
            Self::Unknown(b) => b,
        }
    }

    /// Interpret a wire value.
    pub const fn from_byte(b: u8) -> Self {
        match b {
            Self::CONTROL => Self::Control,
            Self::ACTOR => Self::Actor,
            Self::INPUT => Self::Input,
            other => Self::Unknown(other),
        }
    }
}

/// Control sub-type tag, second header byte of CONTROL frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSubType {
    /// Server to client: here is your session id.
    Assign,
    /// Client to server: I am entering the room.
    Join,
    /// Client to server: I am leaving the room.
    Leave,
    /// Unrecognized sub type.
    Unknown(u8),
}

impl ControlSubType {
    const ASSIGN: u8 = 1;
    const JOIN: u8 = 2;
    const LEAVE: u8 = 3;

    /// Wire value of this tag.
    pub const fn to_byte(self) -> u8 {
        match self {
            Self::Assign => Self::ASSIGN,
            Self::Join => Self::JOIN,
            Self::Leave => Self::LEAVE,
            Self::Unknown(b) => b,
        }
    }

    /// Interpret a wire value.
    pub const fn from_byte(b: u8) -> Self {
        match b {
            Self::ASSIGN => Self::Assign,
            Self::JOIN => Self::Join,
            Self::LEAVE => Self::Leave,
            other => Self::Unknown(other),
        }
    }
}

/// Peek the data-type tag. Returns `None` for an empty frame.
pub fn data_type(frame: &[u8]) -> Option<DataType> {
    frame.first().copied().map(DataType::from_byte)
}

/// Peek the control sub-type tag. Returns `None` if the frame is shorter
/// than the payload header.
///
/// The data-type byte is not checked; call [`data_type`] first.
pub fn control_sub_type(frame: &[u8]) -> Option<ControlSubType> {
    frame.get(1).copied().map(ControlSubType::from_byte)
}

pub(crate) fn write_header(out: &mut Vec<u8>, data_type: DataType, sub_type: u8) {
    out.push(data_type.to_byte());
    out.push(sub_type);
}
