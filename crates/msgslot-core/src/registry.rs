//! Process-wide device table and per-device shared state.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::channel::ChannelId;
use crate::config::RegistryConfig;
use crate::error::{Result, SlotError};
use crate::guard::ExclusivityGuard;
use crate::message::Message;
use crate::session::Session;
use crate::store::ChannelStore;

/// Identifier of one device endpoint, chosen by the host.
pub type DeviceId = u32;

/// Shared state for one device id: its channel store and occupancy gate.
#[derive(Debug)]
pub struct DeviceEntry {
    device_id: DeviceId,
    store: Mutex<ChannelStore>,
    guard: ExclusivityGuard,
}

impl DeviceEntry {
    fn new(device_id: DeviceId) -> Self {
        Self {
            device_id,
            store: Mutex::new(ChannelStore::new(device_id)),
            guard: ExclusivityGuard::new(),
        }
    }

    pub fn device_id(&self) -> DeviceId {
        self.device_id
    }

    pub fn guard(&self) -> &ExclusivityGuard {
        &self.guard
    }

    /// Store a message under the store lock.
    pub fn upsert(&self, channel: ChannelId, payload: &[u8]) -> Result<()> {
        self.store.lock().upsert(channel, payload)
    }

    /// Fetch a message under the store lock.
    pub fn lookup(&self, channel: ChannelId) -> Result<Message> {
        self.store.lock().lookup(channel)
    }

    fn clear(&self) {
        self.store.lock().clear();
    }

    /// Run `f` against the store while holding its lock.
    pub fn with_store<R>(&self, f: impl FnOnce(&ChannelStore) -> R) -> R {
        f(&self.store.lock())
    }
}

/// Point-in-time view of one device, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSnapshot {
    pub device_id: DeviceId,
    pub occupied: bool,
    /// `(channel, message length)` pairs, ascending by channel.
    pub channels: Vec<(ChannelId, usize)>,
}

/// Process-wide table of device entries, created lazily on first open.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: RwLock<HashMap<DeviceId, Arc<DeviceEntry>>>,
    config: RegistryConfig,
}

impl DeviceRegistry {
    /// Create an empty registry with default config.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create an empty registry with explicit config.
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            devices: RwLock::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Existing entry for `device_id`, or a fresh empty one.
    pub fn get_or_create(&self, device_id: DeviceId) -> Result<Arc<DeviceEntry>> {
        if let Some(limit) = self.config.device_id_limit {
            if device_id >= limit {
                return Err(SlotError::DeviceOutOfRange {
                    device: device_id,
                    limit,
                });
            }
        }

        if let Some(entry) = self.devices.read().get(&device_id) {
            return Ok(Arc::clone(entry));
        }

        let mut devices = self.devices.write();
        let entry = devices.entry(device_id).or_insert_with(|| {
            debug!(device_id, "creating device entry");
            Arc::new(DeviceEntry::new(device_id))
        });
        Ok(Arc::clone(entry))
    }

    /// Open a session on `device_id`. Fails with `Busy` if one is already open.
    pub fn open(&self, device_id: DeviceId) -> Result<Session> {
        let entry = self.get_or_create(device_id)?;
        entry.guard().acquire(device_id)?;
        Ok(Session::new(entry))
    }

    /// Drop every device's messages and every idle device entry. Returns
    /// how many entries were removed.
    ///
    /// An entry whose session is still open stays registered with an empty
    /// store, so its occupancy keeps holding until that session closes.
    pub fn teardown(&self) -> usize {
        let mut devices = self.devices.write();
        let before = devices.len();
        devices.retain(|_, entry| {
            entry.clear();
            entry.guard().is_occupied()
        });
        let released = before - devices.len();
        debug!(released, still_open = devices.len(), "device registry torn down");
        released
    }

    /// Number of device ids seen since start or the last teardown.
    pub fn device_count(&self) -> usize {
        self.devices.read().len()
    }

    /// Whether `device_id` currently has an open session.
    pub fn is_occupied(&self, device_id: DeviceId) -> bool {
        self.devices
            .read()
            .get(&device_id)
            .is_some_and(|entry| entry.guard().is_occupied())
    }

    /// Snapshot of `device_id`, if it has been opened.
    pub fn snapshot(&self, device_id: DeviceId) -> Option<DeviceSnapshot> {
        let entry = self.devices.read().get(&device_id).cloned()?;
        Some(DeviceSnapshot {
            device_id,
            occupied: entry.guard().is_occupied(),
            channels: entry.with_store(ChannelStore::summary),
        })
    }
}
