use std::sync::Arc;

use bytes::Bytes;

use crate::channel::ChannelId;
use crate::error::{Result, SlotError};
use crate::message::check_len;
use crate::registry::{DeviceEntry, DeviceId};

/// One open-to-close usage window on a device.
///
/// Created by [`crate::DeviceRegistry::open`]. Holds the device's
/// occupancy until [`Session::close`] or drop. The selected channel lives
/// here, not on the device, so it never leaks between sessions.
#[derive(Debug)]
pub struct Session {
    entry: Arc<DeviceEntry>,
    selected: Option<ChannelId>,
    released: bool,
}

impl Session {
    pub(crate) fn new(entry: Arc<DeviceEntry>) -> Self {
        Self {
            entry,
            selected: None,
            released: false,
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.entry.device_id()
    }

    /// Channel chosen by the last successful [`Session::select_channel`].
    pub fn selected_channel(&self) -> Option<ChannelId> {
        self.selected
    }

    /// Select the channel for subsequent reads and writes.
    ///
    /// A rejected id leaves the previous selection in place.
    pub fn select_channel(&mut self, raw: i64) -> Result<()> {
        self.selected = Some(ChannelId::new(raw)?);
        Ok(())
    }

    /// Replace the selected channel's message with `payload`.
    ///
    /// Returns the number of bytes stored, always `payload.len()`.
    pub fn write(&self, payload: &[u8]) -> Result<usize> {
        let channel = self.require_channel()?;
        check_len(payload.len())?;
        self.entry.upsert(channel, payload)?;
        Ok(payload.len())
    }

    /// The selected channel's message, if it fits in `capacity` bytes.
    ///
    /// All or nothing: an undersized buffer is an error, never a truncation.
    /// The stored message is left in place.
    pub fn read(&self, capacity: usize) -> Result<Bytes> {
        let channel = self.require_channel()?;
        let message = self.entry.lookup(channel)?;
        if message.len() > capacity {
            return Err(SlotError::BufferTooSmall {
                capacity,
                len: message.len(),
            });
        }
        Ok(message.into_bytes())
    }

    /// Copy the selected channel's message into `buf`; returns its length.
    pub fn read_into(&self, buf: &mut [u8]) -> Result<usize> {
        let payload = self.read(buf.len())?;
        buf[..payload.len()].copy_from_slice(&payload);
        Ok(payload.len())
    }

    /// End the session and release the device. Messages stay stored.
    pub fn close(mut self) -> Result<()> {
        self.release()
    }

    fn require_channel(&self) -> Result<ChannelId> {
        self.selected.ok_or(SlotError::NoChannelSelected)
    }

    fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.entry.guard().release(self.entry.device_id())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let result = self.release();
        if let Err(err) = &result {
            tracing::warn!(
                device_id = self.entry.device_id(),
                error = %err,
                "session release failed"
            );
        }
        debug_assert!(result.is_ok(), "session release failed: {result:?}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MAX_MSG_LEN;
    use crate::registry::DeviceRegistry;

    #[test]
    fn starts_without_selection() {
        let registry = DeviceRegistry::new();
        let session = registry.open(0).unwrap();
        assert_eq!(session.selected_channel(), None);
        assert_eq!(session.write(b"x"), Err(SlotError::NoChannelSelected));
        assert_eq!(session.read(MAX_MSG_LEN), Err(SlotError::NoChannelSelected));
    }

    #[test]
    fn no_selection_checked_before_length() {
        let registry = DeviceRegistry::new();
        let session = registry.open(0).unwrap();
        assert_eq!(session.write(b""), Err(SlotError::NoChannelSelected));
    }

    #[test]
    fn select_overwrites_and_rejects_zero() {
        let registry = DeviceRegistry::new();
        let mut session = registry.open(0).unwrap();
        session.select_channel(4).unwrap();
        session.select_channel(6).unwrap();
        assert_eq!(session.selected_channel(), ChannelId::new(6).ok());

        assert_eq!(session.select_channel(0), Err(SlotError::InvalidChannel(0)));
        assert_eq!(session.selected_channel(), ChannelId::new(6).ok());
    }

    #[test]
    fn read_is_non_destructive() {
        let registry = DeviceRegistry::new();
        let mut session = registry.open(1).unwrap();
        session.select_channel(1).unwrap();
        assert_eq!(session.write(b"again").unwrap(), 5);
        assert_eq!(session.read(5).unwrap().as_ref(), b"again");
        assert_eq!(session.read(5).unwrap().as_ref(), b"again");
    }

    #[test]
    fn undersized_buffer_rejected() {
        let registry = DeviceRegistry::new();
        let mut session = registry.open(1).unwrap();
        session.select_channel(1).unwrap();
        session.write(b"twelve bytes").unwrap();
        assert_eq!(
            session.read(11),
            Err(SlotError::BufferTooSmall {
                capacity: 11,
                len: 12
            })
        );

        let mut buf = [0u8; 4];
        assert!(session.read_into(&mut buf).is_err());
        assert_eq!(buf, [0u8; 4]);
    }

    #[test]
    fn read_into_copies_prefix() {
        let registry = DeviceRegistry::new();
        let mut session = registry.open(1).unwrap();
        session.select_channel(2).unwrap();
        session.write(b"abc").unwrap();

        let mut buf = [0xFFu8; 8];
        assert_eq!(session.read_into(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");
        assert_eq!(buf[3], 0xFF);
    }

    #[test]
    fn drop_releases_device() {
        let registry = DeviceRegistry::new();
        {
            let _session = registry.open(8).unwrap();
            assert!(registry.is_occupied(8));
        }
        assert!(!registry.is_occupied(8));
        registry.open(8).unwrap().close().unwrap();
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "InvalidState(9)")]
    fn drop_asserts_on_unmatched_release() {
        let registry = DeviceRegistry::new();
        let session = registry.open(9).unwrap();
        // Release behind the session's back so its own release has no match.
        registry.get_or_create(9).unwrap().guard().release(9).unwrap();
        drop(session);
    }
}
