use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{Result, SlotError};
use crate::registry::DeviceId;

/// Single-occupancy gate for one device id.
///
/// Only gates `open`/`close`; it does not serialize reads and writes.
#[derive(Debug, Default)]
pub struct ExclusivityGuard {
    occupied: AtomicBool,
}

impl ExclusivityGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the device. Fails immediately with `Busy` if already claimed.
    pub fn acquire(&self, device_id: DeviceId) -> Result<()> {
        self.occupied
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| ())
            .map_err(|_| SlotError::Busy(device_id))
    }

    /// Give the device back. Releasing an unclaimed device is a caller bug.
    pub fn release(&self, device_id: DeviceId) -> Result<()> {
        if self.occupied.swap(false, Ordering::AcqRel) {
            Ok(())
        } else {
            Err(SlotError::InvalidState(device_id))
        }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupied.load(Ordering::Acquire)
    }
}
