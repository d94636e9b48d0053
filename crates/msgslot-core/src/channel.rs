//! Channel identifiers.
//!
//! Channel `0` is reserved and never valid. Any other value that fits in
//! 32 bits names an independent slot on a device.

use std::fmt;
use std::num::NonZeroU32;

use crate::error::{Result, SlotError};

/// A validated, non-zero channel id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId(NonZeroU32);

impl ChannelId {
    /// Validate a raw channel id as supplied by a caller.
    pub fn new(raw: i64) -> Result<Self> {
        u32::try_from(raw)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(SlotError::InvalidChannel(raw))
    }

    /// The channel number.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl TryFrom<u32> for ChannelId {
    type Error = SlotError;

    fn try_from(raw: u32) -> Result<Self> {
        Self::new(i64::from(raw))
    }
}

impl From<ChannelId> for u32 {
    fn from(id: ChannelId) -> Self {
        id.get()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
