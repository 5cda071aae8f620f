use crate::device::SectorDevice;
use crate::sector::SectorImage;
use crate::MbrError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Upper bound on partitions collected from one disk.
pub const MAX_DISCOVERED_PARTITIONS: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredPartition {
    pub type_id: u8,
    pub is_primary: bool,
    /// Absolute LBA of the first sector.
    pub relative_sector_offset: u32,
    pub size_in_sectors: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ScanWarning {
    /// No partition in the MBR carries the active flag.
    NoActivePartition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Primaries sorted by offset, then logicals in chain order.
    pub partitions: Vec<DiscoveredPartition>,
    pub warnings: Vec<ScanWarning>,
}

/// Walks the MBR and the chain of extended boot records.
pub fn scan<D: SectorDevice + ?Sized>(disk: &mut D) -> Result<ScanReport, MbrError> {
    let mut partitions: Vec<DiscoveredPartition> = Vec::new();
    let mut warnings = Vec::new();
    let mut visited = HashSet::new();
    let mut extended_base = 0u32;
    let mut next = Some(0u64);

    while let Some(sector_number) = next.take() {
        if !visited.insert(sector_number) {
            return Err(MbrError::InvariantViolation(format!(
                "extended partition chain loops back to sector {}",
                sector_number
            )));
        }
        debug!("Reading partition table from sector {}", sector_number);
        let sector = disk.read_sector(sector_number)?;
        if !sector.has_boot_signature() {
            return Err(MbrError::MissingSignature {
                sector: sector_number,
            });
        }

        let is_mbr = sector_number == 0;
        if is_mbr && !has_active_partition(&sector) {
            warn!("No active (bootable) partitions have been found, the hard disk may not be bootable");
            warnings.push(ScanWarning::NoActivePartition);
        }

        let slots = if is_mbr { 4 } else { 2 };
        let mut pointer: Option<u32> = None;
        for entry in sector.partition_entries().iter().take(slots) {
            if entry.is_extended() {
                debug!("Extended partition entry found, type 0x{:02X}", entry.type_id);
                if pointer.is_some() {
                    return Err(MbrError::InvariantViolation(format!(
                        "more than one extended partition in sector {}",
                        sector_number
                    )));
                }
                let target = if is_mbr {
                    extended_base = entry.start_lba;
                    entry.start_lba
                } else {
                    extended_base.wrapping_add(entry.start_lba)
                };
                pointer = Some(target);
            } else if !entry.is_empty() {
                let found = DiscoveredPartition {
                    type_id: entry.type_id,
                    is_primary: is_mbr,
                    relative_sector_offset: (sector_number as u32).wrapping_add(entry.start_lba),
                    size_in_sectors: entry.sector_count,
                };
                debug!(
                    "Partition type 0x{:02X} at offset {} with {} sectors",
                    found.type_id, found.relative_sector_offset, found.size_in_sectors
                );
                if partitions.len() == MAX_DISCOVERED_PARTITIONS {
                    return Err(MbrError::InvariantViolation(format!(
                        "more than {} partitions found",
                        MAX_DISCOVERED_PARTITIONS
                    )));
                }
                partitions.push(found);
                if is_mbr {
                    sort_last_primary(&mut partitions);
                }
            }
        }

        // A zero pointer would lead back to the MBR.
        next = pointer.filter(|&target| target != 0).map(u64::from);
    }

    Ok(ScanReport {
        partitions,
        warnings,
    })
}

fn has_active_partition(sector: &SectorImage) -> bool {
    sector
        .partition_entries()
        .iter()
        .any(|entry| entry.is_active() && !entry.is_empty())
}

/// Moves the newest entry left past every entry with a larger offset.
fn sort_last_primary(partitions: &mut [DiscoveredPartition]) {
    let mut i = partitions.len() - 1;
    while i > 0
        && partitions[i].relative_sector_offset < partitions[i - 1].relative_sector_offset
    {
        partitions.swap(i, i - 1);
        i -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{partition_table_sector, MemoryDisk};

    #[test]
    fn test_primaries_are_sorted_by_offset() {
        let mut disk = MemoryDisk::new(8);
        disk.put(
            0,
            partition_table_sector(&[(0x80, 0x07, 200, 50), (0x00, 0x83, 100, 50)]),
        );
        let report = scan(&mut disk).unwrap();
        let offsets: Vec<u32> = report
            .partitions
            .iter()
            .map(|p| p.relative_sector_offset)
            .collect();
        assert_eq!(offsets, vec![100, 200]);
        assert!(report.partitions.iter().all(|p| p.is_primary));
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_equal_offsets_keep_discovery_order() {
        let mut disk = MemoryDisk::new(4);
        disk.put(
            0,
            partition_table_sector(&[(0x80, 0x07, 300, 1), (0, 0x83, 100, 1), (0, 0x82, 100, 1)]),
        );
        let report = scan(&mut disk).unwrap();
        let types: Vec<u8> = report.partitions.iter().map(|p| p.type_id).collect();
        assert_eq!(types, vec![0x83, 0x82, 0x07]);
    }

    #[test]
    fn test_logical_partitions_follow_the_chain() {
        let mut disk = MemoryDisk::new(2000);
        disk.put(
            0,
            partition_table_sector(&[(0x80, 0x83, 63, 900), (0, 0x0F, 1000, 900)]),
        );
        // First EBR: logical at +63, next EBR at base + 400.
        disk.put(
            1000,
            partition_table_sector(&[(0, 0x0B, 63, 300), (0, 0x05, 400, 300)]),
        );
        disk.put(1400, partition_table_sector(&[(0, 0x83, 63, 200)]));

        let report = scan(&mut disk).unwrap();
        assert_eq!(report.partitions.len(), 3);
        assert_eq!(report.partitions[1].relative_sector_offset, 1063);
        assert_eq!(report.partitions[2].relative_sector_offset, 1463);
        assert!(!report.partitions[1].is_primary);
        assert_eq!(disk.read_log(), vec![0, 1000, 1400]);
    }

    #[test]
    fn test_missing_active_flag_is_a_warning() {
        let mut disk = MemoryDisk::new(4);
        disk.put(0, partition_table_sector(&[(0x00, 0x83, 63, 10)]));
        let report = scan(&mut disk).unwrap();
        assert_eq!(report.warnings, vec![ScanWarning::NoActivePartition]);
    }

    #[test]
    fn test_unsigned_ebr_is_an_error() {
        let mut disk = MemoryDisk::new(2000);
        disk.put(0, partition_table_sector(&[(0x80, 0x05, 1000, 10)]));
        let err = scan(&mut disk).unwrap_err();
        assert!(matches!(err, MbrError::MissingSignature { sector: 1000 }));
    }

    #[test]
    fn test_two_extended_entries_are_rejected() {
        let mut disk = MemoryDisk::new(4);
        disk.put(
            0,
            partition_table_sector(&[(0x80, 0x05, 1, 1), (0, 0x0F, 2, 1)]),
        );
        assert!(matches!(
            scan(&mut disk),
            Err(MbrError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_self_referencing_chain_is_rejected() {
        let mut disk = MemoryDisk::new(20);
        disk.put(0, partition_table_sector(&[(0x80, 0x05, 10, 5)]));
        disk.put(10, partition_table_sector(&[(0, 0x83, 1, 1), (0, 0x05, 0, 5)]));
        assert!(matches!(
            scan(&mut disk),
            Err(MbrError::InvariantViolation(_))
        ));
    }

    #[test]
    fn test_partition_cap() {
        // 255 EBRs with one logical each plus two primaries exceed the cap.
        let mut disk = MemoryDisk::new(1000);
        disk.put(
            0,
            partition_table_sector(&[(0x80, 0x83, 1, 1), (0, 0x83, 2, 1), (0, 0x05, 3, 1)]),
        );
        for i in 0..255u32 {
            let sector = 3 + i;
            disk.put(
                sector as u64,
                partition_table_sector(&[(0, 0x83, 1, 1), (0, 0x05, i + 1, 1)]),
            );
        }
        disk.put(258, partition_table_sector(&[]));
        assert!(matches!(
            scan(&mut disk),
            Err(MbrError::InvariantViolation(_))
        ));
    }
}
