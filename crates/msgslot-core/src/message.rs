use bytes::Bytes;

use crate::error::{Result, SlotError};

/// Maximum message size in bytes.
pub const MAX_MSG_LEN: usize = 128;

/// An immutable message payload of 1..=[`MAX_MSG_LEN`] bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
}

impl Message {
    /// Copy `payload` into a new message, validating its length.
    pub fn new(payload: &[u8]) -> Result<Self> {
        check_len(payload.len())?;
        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
        })
    }

    /// Message length in bytes. Never zero.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Always false for a constructed message.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Borrow the payload.
    pub fn as_bytes(&self) -> &[u8] {
        self.payload.as_ref()
    }

    /// Shared handle to the payload.
    pub fn into_bytes(self) -> Bytes {
        self.payload
    }
}

pub(crate) fn check_len(len: usize) -> Result<()> {
    if len == 0 || len > MAX_MSG_LEN {
        return Err(SlotError::InvalidLength {
            len,
            max: MAX_MSG_LEN,
        });
    }
    Ok(())
}
