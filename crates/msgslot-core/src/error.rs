use crate::channel::ChannelId;
use crate::registry::DeviceId;

/// Errors that can occur in message slot operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotError {
    /// The device id already has an open session.
    #[error("device {0} is busy")]
    Busy(DeviceId),

    /// The channel id is zero, negative, or out of range.
    #[error("invalid channel id {0}")]
    InvalidChannel(i64),

    /// The message is empty or longer than the maximum.
    #[error("invalid message length ({len} bytes, expected 1..={max})")]
    InvalidLength { len: usize, max: usize },

    /// The read buffer cannot hold the stored message.
    #[error("buffer too small ({capacity} bytes, message is {len})")]
    BufferTooSmall { capacity: usize, len: usize },

    /// The device id is outside the range the host allows.
    #[error("device id {device} out of range (limit {limit})")]
    DeviceOutOfRange { device: DeviceId, limit: DeviceId },

    /// Read or write attempted before a channel was selected.
    #[error("no channel selected")]
    NoChannelSelected,

    /// Nothing was ever written to the selected channel.
    #[error("no message on channel {0}")]
    NotFound(ChannelId),

    /// Occupancy released without a matching acquire.
    #[error("device {0} released without a matching acquire")]
    InvalidState(DeviceId),
}

/// Coarse error classification a host maps onto its own status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Busy,
    InvalidArgument,
    NoChannelSelected,
    NotFound,
    InvalidState,
}

impl SlotError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SlotError::Busy(_) => ErrorKind::Busy,
            SlotError::InvalidChannel(_)
            | SlotError::InvalidLength { .. }
            | SlotError::BufferTooSmall { .. }
            | SlotError::DeviceOutOfRange { .. } => ErrorKind::InvalidArgument,
            SlotError::NoChannelSelected => ErrorKind::NoChannelSelected,
            SlotError::NotFound(_) => ErrorKind::NotFound,
            SlotError::InvalidState(_) => ErrorKind::InvalidState,
        }
    }
}

pub type Result<T> = std::result::Result<T, SlotError>;
