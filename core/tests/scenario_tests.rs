/// End-to-end behaviour of the loader codec, scanner, menu builder and
/// reconciler working against in-memory disks.

#[cfg(test)]
mod scenario_tests {
    use mbrkit_core::config::BootEntry;
    use mbrkit_core::error::DecodeError;
    use mbrkit_core::menu::EMPTY_MENU_PLACEHOLDER;
    use mbrkit_core::test_utils::{partition_table_sector, sample_template, MemoryDisk};
    use mbrkit_core::{
        build_menu_text, decode, encode, reconcile_backup, scan, Choice, Configuration,
        DecodeWarning, MbrError, RestoreQuestion, SectorImage, TimerKey, TimerMode,
    };

    #[test]
    fn blank_sector_is_not_recognized() {
        let template = sample_template();
        let err = decode(&SectorImage::zeroed(), &template).unwrap_err();
        assert!(matches!(err, DecodeError::NotOurLoader(_)));
        assert!(!err.is_fatal());
    }

    #[test]
    fn template_itself_decodes_to_stock_settings() {
        let template = sample_template();
        let report = decode(template.image(), &template).unwrap();
        let config = report.configuration;
        assert!(config.bootable_partitions.is_empty());
        assert_eq!(config.timer_interrupt_key, TimerKey::Esc);
        assert_eq!(config.timed_boot.mode, TimerMode::UserTimer);
        assert_eq!(config.timed_boot.timeout_ticks, 60 * 18);
        assert_eq!(report.warnings, vec![DecodeWarning::EmptyPartitionList]);
    }

    #[test]
    fn primaries_come_back_in_offset_order() {
        let mut disk = MemoryDisk::new(1);
        disk.put(
            0,
            partition_table_sector(&[(0x80, 0x07, 200, 10), (0x00, 0x83, 100, 10)]),
        );
        let report = scan(&mut disk).unwrap();
        let offsets: Vec<u32> = report
            .partitions
            .iter()
            .map(|p| p.relative_sector_offset)
            .collect();
        assert_eq!(offsets, vec![100, 200]);
        assert!(report.partitions.iter().all(|p| p.is_primary));
    }

    #[test]
    fn empty_list_gives_placeholder_menu() {
        let menu = build_menu_text(&Configuration::default(), &[]);
        assert_eq!(menu.text, EMPTY_MENU_PLACEHOLDER);
        assert_eq!(menu.slack, 0);
    }

    #[test]
    fn oversized_labels_report_negative_slack() {
        let mut config = Configuration::default();
        for i in 0..3u32 {
            config
                .add_entry(BootEntry::new(63 + i, "L".repeat(70)))
                .unwrap();
        }
        let menu = build_menu_text(&config, &[]);
        assert!(menu.slack < 0);
        assert!(menu.text.contains("Installation is not allowed"));
    }

    #[test]
    fn reconciler_keeps_current_disk_signature() {
        let mut current = partition_table_sector(&[(0x80, 0x07, 63, 1000)]);
        current.set_disk_signature([0x11, 0x22, 0x33, 0x44]);
        let mut candidate = current.clone();
        candidate.set_disk_signature([0xAA, 0xBB, 0xCC, 0xDD]);

        let mut prompt = |_: &RestoreQuestion| Choice::First;
        let result = reconcile_backup(&current, &candidate, &mut prompt).unwrap();

        assert_eq!(result.disk_signature(), current.disk_signature());
        for (i, (a, b)) in result
            .as_bytes()
            .iter()
            .zip(candidate.as_bytes().iter())
            .enumerate()
        {
            if !(0x1B8..0x1BC).contains(&i) {
                assert_eq!(a, b, "byte 0x{:03X} changed", i);
            }
        }
    }

    #[test]
    fn nine_entries_encode_and_ten_are_refused() {
        let template = sample_template();
        let mut config = Configuration::default();
        for i in 0..9u32 {
            config.add_entry(BootEntry::new(100 + i, "")).unwrap();
        }
        config.regenerate_menu_text(&[]);
        let image = encode(&config, &template).unwrap();
        assert_eq!(image.as_bytes()[0x51], 9);

        assert!(matches!(
            config.add_entry(BootEntry::new(500, "")),
            Err(MbrError::InvalidInput(_))
        ));
        config.bootable_partitions.push(BootEntry::new(500, ""));
        assert!(matches!(
            encode(&config, &template),
            Err(MbrError::PreconditionViolation(_))
        ));
    }

    #[test]
    fn accented_labels_survive_install_and_reimport() {
        let template = sample_template();
        let mut config = Configuration::default();
        config.add_entry(BootEntry::new(63, "Système")).unwrap();
        config.add_entry(BootEntry::new(4096, "Café ½")).unwrap();
        config.set_default(Some(0)).unwrap();
        config.set_timeout_seconds(15).unwrap();
        config.timed_boot.mode = TimerMode::SystemTimer;
        config.regenerate_menu_text(&[]);
        assert!(config.validate().is_ok());

        let image = encode(&config, &template).unwrap();
        let text = &image.as_bytes()[0x10A..];
        assert!(text.windows(7).any(|w| w == b"Syst\x8Ame"));

        let decoded = decode(&image, &template).unwrap().configuration;
        assert_eq!(decoded, config);
        assert_eq!(encode(&decoded, &template).unwrap(), image);
    }
}
