//! Server-issued session identifiers.

use std::fmt;

use crate::error::DecodeError;

/// Width of a session identifier on the wire.
pub const SESSION_ID_LEN: usize = 16;

/// Opaque 16-byte identifier the server assigns to a connection.
///
/// The fixed-size array makes a length mismatch unrepresentable once a
/// value exists; [`SessionId::from_slice`] is the only fallible constructor.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId([u8; SESSION_ID_LEN]);

impl SessionId {
    /// Wrap raw identifier bytes.
    pub const fn new(bytes: [u8; SESSION_ID_LEN]) -> Self {
        Self(bytes)
    }

    /// Build an identifier from a slice that must be exactly 16 bytes long.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let array: [u8; SESSION_ID_LEN] = bytes
            .try_into()
            .map_err(|_| DecodeError::InvalidSessionIdLength(bytes.len()))?;
        Ok(Self(array))
    }

    /// Raw identifier bytes.
    pub const fn as_bytes(&self) -> &[u8; SESSION_ID_LEN] {
        &self.0
    }
}

impl From<[u8; SESSION_ID_LEN]> for SessionId {
    fn from(bytes: [u8; SESSION_ID_LEN]) -> Self {
        Self(bytes)
    }
}

/// Lowercase hex, for logs only.
impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionId({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_lowercase_hex() {
        let mut bytes = [0u8; SESSION_ID_LEN];
        bytes[0] = 0xAB;
        bytes[15] = 0x01;
        let id = SessionId::new(bytes);
        assert_eq!(id.to_string(), "ab000000000000000000000000000001");
    }

    #[test]
    fn test_from_slice_accepts_exact_length() {
        let id = SessionId::from_slice(&[0x11; 16]).unwrap();
        assert_eq!(id.as_bytes(), &[0x11; 16]);
    }

    #[test]
    fn test_from_slice_rejects_wrong_length() {
        assert_eq!(
            SessionId::from_slice(&[0u8; 15]),
            Err(DecodeError::InvalidSessionIdLength(15))
        );
        assert_eq!(
            SessionId::from_slice(&[0u8; 17]),
            Err(DecodeError::InvalidSessionIdLength(17))
        );
    }

    #[test]
    fn test_equality_uses_bytes_not_display() {
        let a = SessionId::new([0xAA; 16]);
        let b = SessionId::from([0xAA; 16]);
        assert_eq!(a, b);
        assert_ne!(a, SessionId::new([0xAB; 16]));
    }
}
