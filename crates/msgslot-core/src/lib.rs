//! Multi-channel message slots behind a single device identity.
//!
//! A device id hosts any number of independent channels. Each channel holds
//! at most one message of up to [`MAX_MSG_LEN`] bytes, last write wins:
//! - A [`Session`] opens a device id; at most one session per device at a time
//! - The session selects a channel, then reads or writes its message
//! - Messages outlive the session that wrote them
//!
//! The [`DeviceRegistry`] owns every device's [`ChannelStore`] for the life
//! of the process (or until [`DeviceRegistry::teardown`]).

pub mod channel;
pub mod config;
pub mod error;
pub mod guard;
pub mod message;
pub mod registry;
pub mod session;
pub mod store;

pub use channel::ChannelId;
pub use config::RegistryConfig;
pub use error::{ErrorKind, Result, SlotError};
pub use guard::ExclusivityGuard;
pub use message::{Message, MAX_MSG_LEN};
pub use registry::{DeviceEntry, DeviceId, DeviceRegistry, DeviceSnapshot};
pub use session::Session;
pub use store::ChannelStore;
