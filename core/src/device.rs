use crate::sector::SectorImage;
use crate::MbrError;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    pub size: u64,
    pub device_type: DeviceType,
    pub mount_points: Vec<PathBuf>,
    pub is_removable: bool,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DeviceType {
    HardDisk,
    SSD,
    USB,
    SDCard,
    Virtual,
    Unknown,
}

impl Device {
    /// Capacity in 512-byte sectors.
    pub fn sector_count(&self) -> u64 {
        self.size / crate::sector::SECTOR_SIZE as u64
    }
}

/// Enumerates the disks a boot loader could be installed on.
pub trait DeviceManager {
    fn enumerate_devices(&self) -> Result<Vec<Device>, MbrError>;

    fn get_device_by_id(&self, device_id: &str) -> Result<Option<Device>, MbrError> {
        Ok(self
            .enumerate_devices()?
            .into_iter()
            .find(|d| d.id == device_id || d.name.contains(device_id)))
    }
}

/// Whole-sector access to a disk or disk image.
///
/// Sector numbers are absolute LBA values counted from the start of the
/// device. Implementations must fail with [`MbrError::IoError`] on short reads.
pub trait SectorDevice {
    fn read_sector(&mut self, sector: u64) -> Result<SectorImage, MbrError>;

    fn write_sector(&mut self, sector: u64, image: &SectorImage) -> Result<(), MbrError>;
}

impl<T: SectorDevice + ?Sized> SectorDevice for &mut T {
    fn read_sector(&mut self, sector: u64) -> Result<SectorImage, MbrError> {
        (**self).read_sector(sector)
    }

    fn write_sector(&mut self, sector: u64, image: &SectorImage) -> Result<(), MbrError> {
        (**self).write_sector(sector, image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockDeviceManager;

    #[test]
    fn test_lookup_by_id_or_name() {
        let manager = MockDeviceManager::new();
        let usb = manager.get_device_by_id("mock://disk1").unwrap().unwrap();
        assert_eq!(usb.device_type, DeviceType::USB);
        assert_eq!(usb.sector_count(), 16 * 2_097_152);
        assert!(manager.get_device_by_id("System").unwrap().unwrap().is_system);
        assert!(manager.get_device_by_id("mock://disk9").unwrap().is_none());
    }
}
