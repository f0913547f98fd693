//! Decode error types.

/// Errors produced while decoding an inbound frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    /// The frame is shorter than the layout it claims to carry.
    #[error("truncated frame: need {needed} bytes, got {actual}")]
    Truncated {
        /// Minimum length required by the layout.
        needed: usize,
        /// Actual frame length.
        actual: usize,
    },

    /// The data-type tag does not match the decoder that was called.
    #[error("unexpected data type tag: {0:#04x}")]
    UnexpectedDataType(u8),

    /// The control sub-type tag does not match the decoder that was called.
    #[error("unexpected control sub type tag: {0:#04x}")]
    UnexpectedSubType(u8),

    /// A session identifier was built from a slice of the wrong length.
    #[error("session id must be 16 bytes, got {0}")]
    InvalidSessionIdLength(usize),
}

/// Fail with [`DecodeError::Truncated`] unless `buf` holds at least `needed` bytes.
pub(crate) fn ensure_len(buf: &[u8], needed: usize) -> Result<(), DecodeError> {
    if buf.len() < needed {
        return Err(DecodeError::Truncated {
            needed,
            actual: buf.len(),
        });
    }
    Ok(())
}
