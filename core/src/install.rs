//! Disk-level operations: reading back, installing, backing up and restoring.

use crate::codec::{decode, encode_onto, DecodeReport};
use crate::config::Configuration;
use crate::device::SectorDevice;
use crate::reconcile::{reconcile_backup, RestorePrompt};
use crate::scanner::DiscoveredPartition;
use crate::sector::SectorImage;
use crate::template::Template;
use crate::track::FIRST_TRACK_SECTORS;
use crate::MbrError;
use serde::Serialize;
use tracing::{debug, info};

pub const MBR_SECTOR: u64 = 0;

/// Decodes whatever loader is installed in the MBR of `disk`.
pub fn decode_existing<D: SectorDevice + ?Sized>(
    disk: &mut D,
    template: &Template,
) -> Result<DecodeReport, MbrError> {
    let sector = disk.read_sector(MBR_SECTOR)?;
    Ok(decode(&sector, template)?)
}

/// Result of a dry run: the sector that would be written and where.
#[derive(Debug, Clone, Serialize)]
pub struct InstallPlan {
    #[serde(skip)]
    pub image: SectorImage,
    pub target_sector: u64,
    /// Free bytes left in the menu text region.
    pub slack: i32,
    pub bootable_partitions: usize,
    pub warnings: Vec<String>,
}

impl InstallPlan {
    pub fn is_outside_first_track(&self) -> bool {
        self.target_sector >= FIRST_TRACK_SECTORS
    }
}

pub struct InstallManager<'a> {
    template: &'a Template,
}

impl<'a> InstallManager<'a> {
    pub fn new(template: &'a Template) -> Self {
        Self { template }
    }

    /// Prepares the loader for `config` on top of the current MBR without
    /// writing anything. The menu text is regenerated unless it is custom.
    pub fn simulate_install<D: SectorDevice + ?Sized>(
        &self,
        disk: &mut D,
        config: &mut Configuration,
        partitions: &[DiscoveredPartition],
        target_sector: u64,
    ) -> Result<InstallPlan, MbrError> {
        if config.bootable_partitions.is_empty() {
            return Err(MbrError::InvalidInput(
                "there are no bootable partitions in the configuration".to_string(),
            ));
        }
        let slack = config.regenerate_menu_text(partitions);
        if slack < 0 {
            return Err(MbrError::InvalidInput(format!(
                "boot menu text does not fit, free at least {} bytes",
                -slack
            )));
        }
        config.validate()?;

        let mut warnings = Vec::new();
        for entry in config.bootable_partitions.iter().filter(|e| !e.is_synthetic()) {
            if !partitions.is_empty()
                && !partitions
                    .iter()
                    .any(|p| p.relative_sector_offset == entry.relative_sector_offset)
            {
                warnings.push(format!(
                    "offset {} does not point to a partition on this disk",
                    entry.relative_sector_offset
                ));
            }
        }
        if target_sector >= FIRST_TRACK_SECTORS {
            warnings.push(format!(
                "sector {} is outside the first track and may belong to a partition",
                target_sector
            ));
        }

        let current = disk.read_sector(MBR_SECTOR)?;
        let image = encode_onto(config, self.template, &current)?;
        debug!(
            "Install plan: sector {}, {} entries, {} bytes free",
            target_sector,
            config.bootable_partitions.len(),
            slack
        );
        Ok(InstallPlan {
            image,
            target_sector,
            slack,
            bootable_partitions: config.bootable_partitions.len(),
            warnings,
        })
    }

    pub fn execute_install<D: SectorDevice + ?Sized>(
        &self,
        disk: &mut D,
        plan: &InstallPlan,
    ) -> Result<(), MbrError> {
        disk.write_sector(plan.target_sector, &plan.image)?;
        info!("Boot loader written to sector {}", plan.target_sector);
        Ok(())
    }
}

/// Copies the MBR to `target_sector` and returns the copy.
pub fn backup_to_sector<D: SectorDevice + ?Sized>(
    disk: &mut D,
    target_sector: u64,
) -> Result<SectorImage, MbrError> {
    if target_sector == MBR_SECTOR {
        return Err(MbrError::InvalidInput(
            "the MBR cannot be backed up onto itself".to_string(),
        ));
    }
    let mbr = disk.read_sector(MBR_SECTOR)?;
    disk.write_sector(target_sector, &mbr)?;
    info!("MBR backed up to sector {}", target_sector);
    Ok(mbr)
}

/// Reads a backup stored in `source_sector`.
pub fn read_backup_sector<D: SectorDevice + ?Sized>(
    disk: &mut D,
    source_sector: u64,
) -> Result<SectorImage, MbrError> {
    if source_sector == MBR_SECTOR {
        return Err(MbrError::InvalidInput(
            "sector 0 is the MBR itself, not a backup".to_string(),
        ));
    }
    disk.read_sector(source_sector)
}

/// Reconciles `backup` with the current MBR and writes the result to it.
pub fn restore_backup<D, P>(
    disk: &mut D,
    backup: &SectorImage,
    prompt: &mut P,
) -> Result<SectorImage, MbrError>
where
    D: SectorDevice + ?Sized,
    P: RestorePrompt + ?Sized,
{
    let current = disk.read_sector(MBR_SECTOR)?;
    let restored = reconcile_backup(&current, backup, prompt)?;
    disk.write_sector(MBR_SECTOR, &restored)?;
    info!("MBR restored from backup");
    Ok(restored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BootEntry;
    use crate::reconcile::{Choice, RestoreQuestion};
    use crate::test_utils::{partition_table_sector, sample_template, MemoryDisk};

    fn disk_with_table() -> MemoryDisk {
        let mut disk = MemoryDisk::new(128);
        let mut mbr = partition_table_sector(&[(0x80, 0x07, 63, 1000), (0, 0x83, 2048, 4096)]);
        mbr.set_disk_signature([0xDE, 0xAD, 0xBE, 0xEF]);
        disk.put(0, mbr);
        disk
    }

    fn partitions() -> Vec<DiscoveredPartition> {
        vec![
            DiscoveredPartition {
                type_id: 0x07,
                is_primary: true,
                relative_sector_offset: 63,
                size_in_sectors: 1000,
            },
            DiscoveredPartition {
                type_id: 0x83,
                is_primary: true,
                relative_sector_offset: 2048,
                size_in_sectors: 4096,
            },
        ]
    }

    #[test]
    fn test_install_keeps_partition_table() {
        let template = sample_template();
        let manager = InstallManager::new(&template);
        let mut disk = disk_with_table();
        let before = disk.get(0).clone();

        let mut config = Configuration::default();
        config.add_entry(BootEntry::new(63, "Windows")).unwrap();
        config.add_entry(BootEntry::new(2048, "Linux")).unwrap();

        let plan = manager
            .simulate_install(&mut disk, &mut config, &partitions(), 0)
            .unwrap();
        assert!(!disk.was_written());
        assert!(plan.warnings.is_empty());
        assert!(config.boot_menu_text.contains("Windows"));

        manager.execute_install(&mut disk, &plan).unwrap();
        let after = disk.get(0);
        assert_eq!(after.partition_table(), before.partition_table());
        assert_eq!(after.disk_signature(), before.disk_signature());

        let report = decode_existing(&mut disk, &template).unwrap();
        assert_eq!(report.configuration, config);
    }

    #[test]
    fn test_empty_configuration_is_refused() {
        let template = sample_template();
        let mut disk = disk_with_table();
        let err = InstallManager::new(&template)
            .simulate_install(&mut disk, &mut Configuration::default(), &[], 0)
            .unwrap_err();
        assert!(matches!(err, MbrError::InvalidInput(_)));
    }

    #[test]
    fn test_plan_warns_about_stale_offsets_and_far_sectors() {
        let template = sample_template();
        let mut disk = disk_with_table();
        let mut config = Configuration::default();
        config.add_entry(BootEntry::new(777, "")).unwrap();
        config.add_entry(BootEntry::skip_boot()).unwrap();
        let plan = InstallManager::new(&template)
            .simulate_install(&mut disk, &mut config, &partitions(), 100)
            .unwrap();
        assert_eq!(plan.warnings.len(), 2);
        assert!(plan.is_outside_first_track());
    }

    #[test]
    fn test_decode_existing_on_foreign_mbr() {
        let template = sample_template();
        let mut disk = disk_with_table();
        assert!(matches!(
            decode_existing(&mut disk, &template),
            Err(MbrError::Decode(_))
        ));
    }

    #[test]
    fn test_backup_and_restore_through_sectors() {
        let mut disk = disk_with_table();
        let original = backup_to_sector(&mut disk, 5).unwrap();
        assert_eq!(disk.get(5), &original);
        assert!(backup_to_sector(&mut disk, 0).is_err());
        assert!(read_backup_sector(&mut disk, 0).is_err());

        let mut changed = original.clone();
        changed.as_bytes_mut()[0x10] = 0x42;
        disk.put(0, changed);

        let backup = read_backup_sector(&mut disk, 5).unwrap();
        let mut asked = Vec::new();
        let mut prompt = |q: &RestoreQuestion| {
            asked.push(*q);
            Choice::First
        };
        let restored = restore_backup(&mut disk, &backup, &mut prompt).unwrap();
        assert_eq!(restored, original);
        assert_eq!(disk.get(0), &original);
        assert_eq!(asked, vec![RestoreQuestion::ConfirmRestore]);
    }

    #[test]
    fn test_cancelled_restore_writes_nothing() {
        let mut disk = disk_with_table();
        let backup = partition_table_sector(&[(0x80, 0x07, 63, 1000)]);
        let mut prompt = |_: &RestoreQuestion| Choice::Cancel;
        let err = restore_backup(&mut disk, &backup, &mut prompt).unwrap_err();
        assert!(matches!(err, MbrError::UserCancelled));
        assert!(!disk.was_written());
    }
}
