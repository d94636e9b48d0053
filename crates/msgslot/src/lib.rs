//! Multi-channel message slot devices.
//!
//! A device id hosts many channels; each channel keeps one message of up to
//! 128 bytes until it is overwritten. One session at a time may hold a
//! device open.
//!
//! # Crate Structure
//!
//! - [`slot`] — Channel store, device registry, sessions
//!
//! The C-ABI host surface lives in the separate `msgslot-ffi` crate.
//!
//! ```
//! use msgslot::slot::DeviceRegistry;
//!
//! let registry = DeviceRegistry::new();
//! let mut session = registry.open(0)?;
//! session.select_channel(7)?;
//! session.write(b"hello")?;
//! assert_eq!(session.read(128)?.as_ref(), b"hello");
//! session.close()?;
//! # Ok::<(), msgslot::slot::SlotError>(())
//! ```

/// Re-export channel store, registry and session types.
pub mod slot {
    pub use msgslot_core::*;
}
