use log::debug;
use mbrkit_core::{Device, DeviceManager, MbrError};

/// Used where no native enumeration exists. Devices can still be opened by
/// path with [`crate::FileDisk`].
pub struct FallbackDeviceManager;

impl DeviceManager for FallbackDeviceManager {
    fn enumerate_devices(&self) -> Result<Vec<Device>, MbrError> {
        debug!("Disk enumeration is not supported on this platform");
        Ok(vec![])
    }
}

/// Without a native check, assume access and let opening the disk decide.
pub fn has_raw_disk_access() -> bool {
    true
}
