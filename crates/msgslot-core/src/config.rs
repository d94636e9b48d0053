use crate::registry::DeviceId;

/// Controls device admission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegistryConfig {
    /// Exclusive upper bound on device ids. `None` accepts any id.
    pub device_id_limit: Option<DeviceId>,
}

impl RegistryConfig {
    /// Config that admits device ids below `limit`.
    pub fn with_device_limit(limit: DeviceId) -> Self {
        Self {
            device_id_limit: Some(limit),
        }
    }
}
