/// Test utilities and in-memory disks so tests never touch real hardware
use crate::layout::{Field, MENU_TEXT_OFFSET};
use crate::sector::{SectorImage, PARTITION_ENTRY_SIZE, PARTITION_TABLE_OFFSET, SECTOR_SIZE};
use crate::template::Template;
use crate::{Device, DeviceManager, DeviceType, MbrError, SectorDevice};
use std::io;
use std::path::PathBuf;

/// Disk held in memory. Every access is recorded.
#[derive(Clone, Debug)]
pub struct MemoryDisk {
    sectors: Vec<SectorImage>,
    reads: Vec<u64>,
    writes: Vec<u64>,
    read_only: bool,
}

impl MemoryDisk {
    /// A blank disk of `sector_count` zeroed sectors.
    pub fn new(sector_count: usize) -> Self {
        Self {
            sectors: vec![SectorImage::zeroed(); sector_count],
            reads: Vec::new(),
            writes: Vec::new(),
            read_only: false,
        }
    }

    /// A disk that refuses every write.
    pub fn read_only(sector_count: usize) -> Self {
        Self {
            read_only: true,
            ..Self::new(sector_count)
        }
    }

    /// Stores `image` without recording a write.
    pub fn put(&mut self, sector: u64, image: SectorImage) {
        self.sectors[sector as usize] = image;
    }

    pub fn get(&self, sector: u64) -> &SectorImage {
        &self.sectors[sector as usize]
    }

    pub fn read_log(&self) -> Vec<u64> {
        self.reads.clone()
    }

    pub fn write_log(&self) -> Vec<u64> {
        self.writes.clone()
    }

    pub fn was_written(&self) -> bool {
        !self.writes.is_empty()
    }

    fn slot(&self, sector: u64) -> Result<usize, MbrError> {
        let index = sector as usize;
        if index >= self.sectors.len() {
            return Err(MbrError::IoError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("sector {} is past the end of the disk", sector),
            )));
        }
        Ok(index)
    }
}

impl SectorDevice for MemoryDisk {
    fn read_sector(&mut self, sector: u64) -> Result<SectorImage, MbrError> {
        let index = self.slot(sector)?;
        self.reads.push(sector);
        Ok(self.sectors[index].clone())
    }

    fn write_sector(&mut self, sector: u64, image: &SectorImage) -> Result<(), MbrError> {
        if self.read_only {
            return Err(MbrError::IoError(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "disk is opened read-only",
            )));
        }
        let index = self.slot(sector)?;
        self.writes.push(sector);
        self.sectors[index] = image.clone();
        Ok(())
    }
}

/// Device manager that reports a fixed list of fake disks
pub struct MockDeviceManager {
    devices: Vec<Device>,
}

impl Default for MockDeviceManager {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDeviceManager {
    pub fn new() -> Self {
        Self {
            devices: vec![
                Device {
                    id: "mock://disk0".to_string(),
                    name: "System Disk".to_string(),
                    size: 500 * 1_073_741_824,
                    device_type: DeviceType::SSD,
                    mount_points: vec![PathBuf::from("/")],
                    is_removable: false,
                    is_system: true,
                },
                Device {
                    id: "mock://disk1".to_string(),
                    name: "Test USB Stick".to_string(),
                    size: 16 * 1_073_741_824,
                    device_type: DeviceType::USB,
                    mount_points: vec![],
                    is_removable: true,
                    is_system: false,
                },
            ],
        }
    }

    pub fn with_devices(devices: Vec<Device>) -> Self {
        Self { devices }
    }
}

impl DeviceManager for MockDeviceManager {
    fn enumerate_devices(&self) -> Result<Vec<Device>, MbrError> {
        Ok(self.devices.clone())
    }
}

/// Signed sector holding the given `(status, type, start, size)` entries.
pub fn partition_table_sector(entries: &[(u8, u8, u32, u32)]) -> SectorImage {
    let mut image = SectorImage::zeroed();
    for (i, &(status, type_id, start, size)) in entries.iter().take(4).enumerate() {
        let base = PARTITION_TABLE_OFFSET + i * PARTITION_ENTRY_SIZE;
        image.as_bytes_mut()[base] = status;
        image.as_bytes_mut()[base + 4] = type_id;
        image.write_u32(base + 8, start);
        image.write_u32(base + 12, size);
    }
    image.set_boot_signature();
    image
}

/// A synthetic loader image carrying the stock parameter values: user timer,
/// ESC, F-keys, one-minute timeout, progress bar, hiding and activation on.
pub fn sample_template_bytes() -> [u8; SECTOR_SIZE] {
    let mut bytes = [0u8; SECTOR_SIZE];
    for (i, b) in bytes.iter_mut().take(MENU_TEXT_OFFSET).enumerate() {
        *b = (i * 7 + 3) as u8;
    }
    let fields: [(Field, &[u8]); 15] = [
        (Field::TimerVectorPrimary, &[0x70]),
        (Field::TimerInterruptKey, &[0x1B]),
        (Field::KeyCodeModeOpcode, &[0x74, 0x05]),
        (Field::BaseKeyCode, &[0x3B]),
        (Field::BootablePartitionCount, &[0]),
        (Field::Timeout, &[108, 0]),
        (Field::ProgressBarSymbolOpcode, &[0x88, 0xF0]),
        (Field::ProgressBarSwitchOpcode, &[0xEB, 0x10]),
        (Field::DefaultPartitionIndex, &[0]),
        (Field::UpdateDefaultOpcode, &[0x88, 0x1E, 0x6B]),
        (Field::TimerVectorSecondary, &[0x70]),
        (Field::MarkActiveOpcode, &[0x80, 0x0C]),
        (Field::HidingJumpOffset, &[0x02]),
        (Field::TimedBootGate, &[0x9C]),
        (Field::ChainOldHandler, &[0xEA]),
    ];
    for (field, value) in fields {
        bytes[field.range()].copy_from_slice(value);
    }
    bytes[SECTOR_SIZE - 2] = 0x55;
    bytes[SECTOR_SIZE - 1] = 0xAA;
    bytes
}

pub fn sample_template() -> Template {
    match Template::from_bytes(&sample_template_bytes()) {
        Ok(template) => template,
        Err(e) => panic!("sample template is invalid: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_disk_records_access() {
        let mut disk = MemoryDisk::new(4);
        let image = partition_table_sector(&[(0x80, 0x83, 63, 100)]);
        disk.write_sector(2, &image).unwrap();
        assert_eq!(disk.read_sector(2).unwrap(), image);
        assert_eq!(disk.write_log(), vec![2]);
        assert_eq!(disk.read_log(), vec![2]);
        assert!(matches!(disk.read_sector(4), Err(MbrError::IoError(_))));
    }

    #[test]
    fn test_read_only_disk_refuses_writes() {
        let mut disk = MemoryDisk::read_only(1);
        assert!(disk.write_sector(0, &SectorImage::zeroed()).is_err());
        assert!(!disk.was_written());
    }

    #[test]
    fn test_sample_template_menu_region_is_clear() {
        let bytes = sample_template_bytes();
        assert!(bytes[MENU_TEXT_OFFSET..SECTOR_SIZE - 2].iter().all(|&b| b == 0));
        assert_ne!(bytes[Field::TimedBootGate.offset()], crate::layout::NOP);
    }
}
