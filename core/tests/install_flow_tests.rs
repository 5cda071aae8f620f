/// Scan, configure, install and read back on a disk with logical partitions.

#[cfg(test)]
mod install_flow_tests {
    use mbrkit_core::config::BootEntry;
    use mbrkit_core::describe;
    use mbrkit_core::install::{backup_to_sector, restore_backup};
    use mbrkit_core::test_utils::{partition_table_sector, sample_template, MemoryDisk};
    use mbrkit_core::{
        decode_existing, scan, Choice, Configuration, InstallManager, KeyMode, RestoreQuestion,
    };

    fn partitioned_disk() -> MemoryDisk {
        let mut disk = MemoryDisk::new(4096);
        disk.put(
            0,
            partition_table_sector(&[(0x80, 0x07, 63, 1000), (0, 0x0F, 2000, 2000)]),
        );
        disk.put(
            2000,
            partition_table_sector(&[(0, 0x83, 63, 500), (0, 0x05, 1000, 900)]),
        );
        disk.put(3000, partition_table_sector(&[(0, 0x82, 63, 400)]));
        disk
    }

    #[test]
    fn install_then_reimport() {
        let template = sample_template();
        let mut disk = partitioned_disk();
        let report = scan(&mut disk).unwrap();
        assert_eq!(report.partitions.len(), 3);
        assert_eq!(report.partitions[2].relative_sector_offset, 3063);

        let mut config = Configuration::default();
        config.set_key_mode(KeyMode::FunctionKeys);
        for partition in &report.partitions[..2] {
            config
                .add_entry(BootEntry::new(partition.relative_sector_offset, ""))
                .unwrap();
        }
        config.set_label(1, "Linux").unwrap();
        config.add_entry(BootEntry::next_disk()).unwrap();
        config.set_default(None).unwrap();

        let manager = InstallManager::new(&template);
        let plan = manager
            .simulate_install(&mut disk, &mut config, &report.partitions, 0)
            .unwrap();
        assert!(plan.slack >= 0);
        manager.execute_install(&mut disk, &plan).unwrap();
        assert_eq!(disk.write_log(), vec![0]);

        let imported = decode_existing(&mut disk, &template).unwrap();
        assert!(imported.warnings.is_empty());
        let imported = imported.configuration;
        assert_eq!(imported.key_mode(), KeyMode::FunctionKeys);
        assert_eq!(imported.default_partition, None);
        assert_eq!(imported.bootable_partitions[1].label, "Linux");
        assert!(imported.bootable_partitions[2].is_next_disk());

        let line = describe::bootable_entry(&imported, 1, &report.partitions).unwrap();
        assert_eq!(line, " [EXT:250Kb] Linux");

        // Installing again must not disturb the partition walk.
        assert_eq!(scan(&mut disk).unwrap().partitions, report.partitions);
    }

    #[test]
    fn backup_survives_install_and_restores() {
        let template = sample_template();
        let mut disk = partitioned_disk();
        let original = backup_to_sector(&mut disk, 7).unwrap();

        let mut config = Configuration::default();
        config.add_entry(BootEntry::new(63, "DOS")).unwrap();
        let manager = InstallManager::new(&template);
        let plan = manager
            .simulate_install(&mut disk, &mut config, &[], 0)
            .unwrap();
        manager.execute_install(&mut disk, &plan).unwrap();
        assert_ne!(disk.get(0), &original);

        let backup = disk.get(7).clone();
        let mut prompt = |_: &RestoreQuestion| Choice::First;
        restore_backup(&mut disk, &backup, &mut prompt).unwrap();
        assert_eq!(disk.get(0), &original);
    }
}
