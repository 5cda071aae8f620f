//! One-line descriptions of partitions and boot entries for listings.

use crate::config::{BootEntry, Configuration};
use crate::partition_types;
use crate::scanner::DiscoveredPartition;
use tracing::debug;

/// Offsets at or below this point into the first track.
pub const LAST_FIRST_TRACK_SECTOR: u32 = 62;

/// Formats a sector count the way the listings show it: "1.5Gb", "640Kb".
pub fn format_size(size_in_sectors: u32) -> String {
    if size_in_sectors & 0xC000_0000 != 0 {
        format!("{:.1}Tb", (size_in_sectors >> 21) as f64 / 1024.0)
    } else if size_in_sectors & 0xFFF0_0000 != 0 {
        format!("{:.1}Gb", (size_in_sectors >> 11) as f64 / 1024.0)
    } else if size_in_sectors & 0xFFFF_FC00 != 0 {
        format!("{:.1}Mb", (size_in_sectors >> 1) as f64 / 1024.0)
    } else {
        format!("{}Kb", size_in_sectors >> 1)
    }
}

fn marker(selected: bool) -> char {
    if selected {
        '*'
    } else {
        ' '
    }
}

fn location(partition: &DiscoveredPartition) -> String {
    format!(
        "[{}:{}]",
        if partition.is_primary { "PRI" } else { "EXT" },
        format_size(partition.size_in_sectors)
    )
}

/// Describes a discovered partition, starred when it is already bootable.
pub fn available_partition(partition: &DiscoveredPartition, config: &Configuration) -> String {
    let selected = config
        .bootable_partitions
        .iter()
        .any(|entry| entry.relative_sector_offset == partition.relative_sector_offset);
    format!(
        "{}{} {}",
        marker(selected),
        location(partition),
        partition_types::describe(partition.type_id)
    )
}

/// The "skip boot" pseudo-partition as offered for selection.
pub fn skip_boot_option(config: &Configuration) -> String {
    let selected = config.bootable_partitions.iter().any(BootEntry::is_skip_boot);
    format!(
        "{}[SKIP BOOT] Skip boot attempt and try another device",
        marker(selected)
    )
}

/// The "next hard disk" pseudo-partition as offered for selection.
pub fn next_disk_option(config: &Configuration) -> String {
    let selected = config.bootable_partitions.iter().any(BootEntry::is_next_disk);
    format!(
        "{}[NEXT HDD] Try to boot from next hard disk (dangerous!)",
        marker(selected)
    )
}

/// Describes the configured entry at `index`, starred when it is the default.
///
/// Offsets that match nothing in `partitions` are flagged: those on the first
/// track as chainloaded sectors, anything else as broken.
pub fn bootable_entry(
    config: &Configuration,
    index: usize,
    partitions: &[DiscoveredPartition],
) -> Option<String> {
    let entry = config.bootable_partitions.get(index)?;
    let mut line = String::new();
    line.push(marker(config.default_partition == Some(index)));

    let found = partitions
        .iter()
        .find(|p| p.relative_sector_offset == entry.relative_sector_offset);

    let (tag, fallback) = match found {
        Some(partition) => (
            location(partition),
            partition_types::describe(partition.type_id),
        ),
        None if entry.is_next_disk() => (
            "[NEXT HDD]".to_string(),
            "Try to boot from next hard disk (dangerous!)",
        ),
        None if entry.is_skip_boot() => (
            "[SKIP BOOT]".to_string(),
            "Skip boot attempt and try another device",
        ),
        None if entry.relative_sector_offset <= LAST_FIRST_TRACK_SECTOR => (
            "[CHAINLOAD]".to_string(),
            "Offset points to a sector on a first track",
        ),
        None => {
            debug!(
                "Broken partition offset 0x{:08X} is found in slot {}",
                entry.relative_sector_offset, index
            );
            (
                "[!!!BROKEN!!!]".to_string(),
                "Partition offset points to a wrong sector, remove it",
            )
        }
    };

    line.push_str(&tag);
    line.push(' ');
    if entry.label.is_empty() {
        line.push_str(fallback);
    } else {
        line.push_str(&entry.label);
    }
    Some(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn partition(type_id: u8, is_primary: bool, offset: u32, size: u32) -> DiscoveredPartition {
        DiscoveredPartition {
            type_id,
            is_primary,
            relative_sector_offset: offset,
            size_in_sectors: size,
        }
    }

    #[test]
    fn test_size_units() {
        assert_eq!(format_size(1000), "500Kb");
        assert_eq!(format_size(2048 * 100), "100.0Mb");
        assert_eq!(format_size(3_145_728), "1.5Gb");
        assert_eq!(format_size(0xC000_0000), "1.5Tb");
    }

    #[test]
    fn test_available_partition_marks_selected() {
        let mut config = Configuration::default();
        let linux = partition(0x83, true, 63, 3_145_728);
        assert_eq!(
            available_partition(&linux, &config),
            " [PRI:1.5Gb] Linux native partition"
        );
        config.add_entry(BootEntry::new(63, "")).unwrap();
        assert!(available_partition(&linux, &config).starts_with("*[PRI:"));

        let logical = partition(0x07, false, 5000, 1000);
        assert!(available_partition(&logical, &config).starts_with(" [EXT:500Kb] "));
    }

    #[test]
    fn test_synthetic_options() {
        let mut config = Configuration::default();
        assert!(skip_boot_option(&config).starts_with(" [SKIP BOOT]"));
        config.add_entry(BootEntry::next_disk()).unwrap();
        assert!(next_disk_option(&config).starts_with("*[NEXT HDD]"));
    }

    #[test]
    fn test_bootable_entries() {
        let mut config = Configuration::default();
        config.add_entry(BootEntry::new(63, "Linux")).unwrap();
        config.add_entry(BootEntry::new(2048, "")).unwrap();
        config.add_entry(BootEntry::new(5, "")).unwrap();
        config.add_entry(BootEntry::new(99999, "")).unwrap();
        config.add_entry(BootEntry::skip_boot()).unwrap();
        config.set_default(Some(0)).unwrap();
        let partitions = [
            partition(0x83, true, 63, 1000),
            partition(0x07, true, 2048, 4096),
        ];

        assert_eq!(
            bootable_entry(&config, 0, &partitions).unwrap(),
            "*[PRI:500Kb] Linux"
        );
        assert_eq!(
            bootable_entry(&config, 1, &partitions).unwrap(),
            " [PRI:2.0Mb] Windows NT NTFS or OS/2 HPFS (IFS)"
        );
        assert!(bootable_entry(&config, 2, &partitions)
            .unwrap()
            .starts_with(" [CHAINLOAD] "));
        assert!(bootable_entry(&config, 3, &partitions)
            .unwrap()
            .starts_with(" [!!!BROKEN!!!] "));
        assert_eq!(
            bootable_entry(&config, 4, &partitions).unwrap(),
            " [SKIP BOOT] Skip boot attempt and try another device"
        );
        assert!(bootable_entry(&config, 5, &partitions).is_none());
    }
}
