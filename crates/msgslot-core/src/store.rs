//! Channel-keyed message slots for a single device.

use std::collections::HashMap;

use crate::channel::ChannelId;
use crate::error::{Result, SlotError};
use crate::message::Message;
use crate::registry::DeviceId;

/// Channel-keyed message slots for one device.
///
/// Not synchronized on its own; the owning [`crate::DeviceEntry`] wraps it
/// in a mutex.
#[derive(Debug)]
pub struct ChannelStore {
    device_id: DeviceId,
    channels: HashMap<ChannelId, Message>,
}

impl ChannelStore {
    /// Create an empty store for `device_id`.
    pub fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            channels: HashMap::new(),
        }
    }

    /// Store `payload` on `channel`, replacing any previous message.
    pub fn upsert(&mut self, channel: ChannelId, payload: &[u8]) -> Result<()> {
        let message = Message::new(payload)?;
        self.channels.insert(channel, message);
        Ok(())
    }

    /// Current message on `channel`.
    pub fn lookup(&self, channel: ChannelId) -> Result<Message> {
        self.channels
            .get(&channel)
            .cloned()
            .ok_or(SlotError::NotFound(channel))
    }

    /// Drop every stored message.
    pub fn clear(&mut self) {
        self.channels.clear();
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    /// Number of channels holding a message.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn contains(&self, channel: ChannelId) -> bool {
        self.channels.contains_key(&channel)
    }

    /// Channels holding a message, ascending.
    pub fn channels(&self) -> Vec<ChannelId> {
        let mut channels: Vec<ChannelId> = self.channels.keys().copied().collect();
        channels.sort_unstable();
        channels
    }

    /// `(channel, message length)` pairs, ascending by channel.
    pub(crate) fn summary(&self) -> Vec<(ChannelId, usize)> {
        let mut summary: Vec<(ChannelId, usize)> = self
            .channels
            .iter()
            .map(|(channel, msg)| (*channel, msg.len()))
            .collect();
        summary.sort_unstable_by_key(|(channel, _)| *channel);
        summary
    }
}
