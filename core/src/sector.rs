use crate::MbrError;
use byteorder::{ByteOrder, LittleEndian};
use std::fmt;

pub const SECTOR_SIZE: usize = 512;
pub const DISK_SIGNATURE_OFFSET: usize = 0x1B8;
pub const PARTITION_TABLE_OFFSET: usize = 0x1BE;
pub const PARTITION_ENTRY_SIZE: usize = 16;
pub const PARTITION_TABLE_SIZE: usize = 4 * PARTITION_ENTRY_SIZE;
pub const BOOT_SIGNATURE_OFFSET: usize = 0x1FE;
pub const BOOT_SIGNATURE: [u8; 2] = [0x55, 0xAA];

/// Raw contents of one 512-byte disk sector.
#[derive(Clone, PartialEq, Eq)]
pub struct SectorImage([u8; SECTOR_SIZE]);

/// Parsed view of a 16-byte partition table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartitionEntry {
    pub status: u8,
    pub type_id: u8,
    pub start_lba: u32,
    pub sector_count: u32,
}

impl PartitionEntry {
    pub fn is_active(&self) -> bool {
        self.status & 0x80 != 0
    }

    pub fn is_empty(&self) -> bool {
        self.type_id == 0x00
    }

    pub fn is_extended(&self) -> bool {
        self.type_id == 0x05 || self.type_id == 0x0F
    }
}

impl SectorImage {
    pub fn zeroed() -> Self {
        Self([0u8; SECTOR_SIZE])
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MbrError> {
        let array: [u8; SECTOR_SIZE] = bytes.try_into().map_err(|_| {
            MbrError::InvalidInput(format!(
                "expected {} bytes of sector data, got {}",
                SECTOR_SIZE,
                bytes.len()
            ))
        })?;
        Ok(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; SECTOR_SIZE] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8; SECTOR_SIZE] {
        &mut self.0
    }

    pub fn has_boot_signature(&self) -> bool {
        self.0[BOOT_SIGNATURE_OFFSET..] == BOOT_SIGNATURE
    }

    pub fn set_boot_signature(&mut self) {
        self.0[BOOT_SIGNATURE_OFFSET..].copy_from_slice(&BOOT_SIGNATURE);
    }

    /// True when every byte of the sector is zero.
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Windows disk signature stored at 0x1B8.
    pub fn disk_signature(&self) -> [u8; 4] {
        let mut signature = [0u8; 4];
        signature.copy_from_slice(&self.0[DISK_SIGNATURE_OFFSET..DISK_SIGNATURE_OFFSET + 4]);
        signature
    }

    pub fn set_disk_signature(&mut self, signature: [u8; 4]) {
        self.0[DISK_SIGNATURE_OFFSET..DISK_SIGNATURE_OFFSET + 4].copy_from_slice(&signature);
    }

    pub fn partition_table(&self) -> &[u8] {
        &self.0[PARTITION_TABLE_OFFSET..PARTITION_TABLE_OFFSET + PARTITION_TABLE_SIZE]
    }

    pub fn set_partition_table(&mut self, table: &[u8]) {
        self.0[PARTITION_TABLE_OFFSET..PARTITION_TABLE_OFFSET + PARTITION_TABLE_SIZE]
            .copy_from_slice(table);
    }

    /// Raw bytes of partition table slot `index` (0..4).
    pub fn entry_bytes(&self, index: usize) -> &[u8] {
        let start = PARTITION_TABLE_OFFSET + index * PARTITION_ENTRY_SIZE;
        &self.0[start..start + PARTITION_ENTRY_SIZE]
    }

    pub fn entry_bytes_mut(&mut self, index: usize) -> &mut [u8] {
        let start = PARTITION_TABLE_OFFSET + index * PARTITION_ENTRY_SIZE;
        &mut self.0[start..start + PARTITION_ENTRY_SIZE]
    }

    pub fn partition_entry(&self, index: usize) -> PartitionEntry {
        let raw = self.entry_bytes(index);
        PartitionEntry {
            status: raw[0],
            type_id: raw[4],
            start_lba: LittleEndian::read_u32(&raw[8..12]),
            sector_count: LittleEndian::read_u32(&raw[12..16]),
        }
    }

    pub fn partition_entries(&self) -> [PartitionEntry; 4] {
        [0, 1, 2, 3].map(|i| self.partition_entry(i))
    }

    pub fn read_u16(&self, offset: usize) -> u16 {
        LittleEndian::read_u16(&self.0[offset..offset + 2])
    }

    pub fn write_u16(&mut self, offset: usize, value: u16) {
        LittleEndian::write_u16(&mut self.0[offset..offset + 2], value);
    }

    pub fn read_u32(&self, offset: usize) -> u32 {
        LittleEndian::read_u32(&self.0[offset..offset + 4])
    }

    pub fn write_u32(&mut self, offset: usize, value: u32) {
        LittleEndian::write_u32(&mut self.0[offset..offset + 4], value);
    }

    /// Hex dump in 16-byte rows, used for trace logging.
    pub fn hex_dump(&self) -> String {
        self.0
            .chunks(16)
            .enumerate()
            .map(|(row, chunk)| format!("{:03X}: {}", row * 16, hex::encode_upper(chunk)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for SectorImage {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl From<[u8; SECTOR_SIZE]> for SectorImage {
    fn from(bytes: [u8; SECTOR_SIZE]) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for SectorImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SectorImage")
            .field("signed", &self.has_boot_signature())
            .field("disk_signature", &hex::encode(self.disk_signature()))
            .finish()
    }
}
