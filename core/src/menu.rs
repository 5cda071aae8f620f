//! Boot menu text generation.
//!
//! The menu shares 174 bytes with the offset table, so it is rendered at
//! increasing verbosity levels and the richest one that still fits wins.

use crate::charset;
use crate::config::{BootEntry, Configuration, KeyMode};
use crate::layout::{MENU_TEXT_REGION, TICKS_PER_MINUTE, TICKS_PER_SECOND};
use crate::scanner::DiscoveredPartition;
use tracing::{debug, warn};

pub const MAX_VERBOSITY: u8 = 6;
pub const PROGRESS_BAR_FRAME: &str = "[          ]\r[";
pub const EMPTY_MENU_PLACEHOLDER: &str =
    "Boot menu text will be generated after adding bootable partitions.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuText {
    pub text: String,
    /// Free bytes left in the text region; negative means overflow.
    pub slack: i32,
}

/// Renders the menu for `config`.
///
/// `partitions` is only consulted to report entries whose offsets no longer
/// match anything on the disk.
pub fn build_menu_text(config: &Configuration, partitions: &[DiscoveredPartition]) -> MenuText {
    let count = config.bootable_partitions.len();

    if config.custom_text_mode {
        let slack = slack_for(count, charset::encoded_len(&config.boot_menu_text));
        debug!("Number of available characters for custom boot menu text: {}", slack);
        if slack < 0 {
            warn!(
                "Custom boot menu text is too long, free at least {} bytes",
                -slack
            );
        }
        return MenuText {
            text: config.boot_menu_text.clone(),
            slack,
        };
    }

    if count == 0 {
        return MenuText {
            text: EMPTY_MENU_PLACEHOLDER.to_string(),
            slack: 0,
        };
    }

    if !partitions.is_empty() {
        for entry in config.bootable_partitions.iter().filter(|e| !e.is_synthetic()) {
            if !partitions
                .iter()
                .any(|p| p.relative_sector_offset == entry.relative_sector_offset)
            {
                debug!(
                    "Bootable partition at offset {} is not among the discovered partitions",
                    entry.relative_sector_offset
                );
            }
        }
    }

    let mut best: Option<MenuText> = None;
    for verbosity in 0..=MAX_VERBOSITY {
        let text = render(config, verbosity);
        let slack = slack_for(count, charset::encoded_len(&text));
        debug!("Verbosity {}: {} characters left", verbosity, slack);
        if slack < 0 {
            break;
        }
        best = Some(MenuText { text, slack });
    }

    best.unwrap_or_else(|| {
        let slack = slack_for(count, charset::encoded_len(&render(config, 0)));
        warn!(
            "Too many characters have been entered for labels, free at least {} bytes",
            -slack
        );
        MenuText {
            text: format!(
                "Too many characters have been entered for labels of bootable partitions.\n\
                 Installation is not allowed until you free at least {} bytes.",
                -slack
            ),
            slack,
        }
    })
}

fn slack_for(count: usize, text_len: usize) -> i32 {
    MENU_TEXT_REGION as i32 - 4 * count as i32 - (text_len as i32 + 1)
}

fn render(config: &Configuration, verbosity: u8) -> String {
    let mut text = String::from("\n");
    let key_mode = config.key_mode();

    if verbosity == MAX_VERBOSITY {
        text.push_str(&format!("mbrkit v{}\r\n\n", env!("CARGO_PKG_VERSION")));
    }

    for (i, entry) in config.bootable_partitions.iter().enumerate() {
        match key_mode {
            KeyMode::Digits | KeyMode::FunctionKeys => {
                if key_mode == KeyMode::FunctionKeys {
                    text.push('F');
                }
                text.push_str(&(i + 1).to_string());
                if verbosity > 4 {
                    text.push('.');
                }
            }
            KeyMode::CustomAscii(_) | KeyMode::CustomScanCode(_) => {}
        }
        text.push(if config.default_partition == Some(i) { '*' } else { ' ' });
        text.push_str(&entry_name(entry, verbosity));
        text.push_str("\r\n");
    }

    let timer_line = config.timed_boot.is_enabled() && config.timed_boot.timeout_ticks > 0;
    if verbosity >= 1 && timer_line {
        let ticks = config.timed_boot.timeout_ticks;
        let long_units = verbosity >= 5;
        let duration = if ticks < TICKS_PER_MINUTE {
            let seconds = ticks / TICKS_PER_SECOND;
            format!("{}{}", seconds, if long_units { "sec" } else { "s" })
        } else {
            let minutes = ticks / TICKS_PER_MINUTE;
            format!("{}{}", minutes, if long_units { "min" } else { "m" })
        };
        text.push_str(&format!(
            "\n{} stops {} timer\r\n",
            config.timer_interrupt_key.name(),
            duration
        ));
    } else if verbosity >= 2 {
        text.push('\n');
    }

    if verbosity >= 2 {
        text.push_str("ENTER boots default\r\n");
    }
    if verbosity >= 3 {
        text.push_str(match key_mode {
            KeyMode::Digits => "Digits boot OS\r\n",
            KeyMode::FunctionKeys => "F-keys boot OS\r\n",
            _ => "Press a key to boot OS\r\n",
        });
    }
    if config.progress_bar.enabled && verbosity >= 4 {
        text.push_str(PROGRESS_BAR_FRAME);
    }
    text
}

fn entry_name(entry: &BootEntry, verbosity: u8) -> String {
    if !entry.label.is_empty() {
        return entry.label.clone();
    }
    let name = if entry.is_next_disk() {
        match verbosity {
            0 | 1 => "Next HDD",
            2 => "Try next HDD",
            3 => "Next hard disk",
            _ => "Try next hard disk",
        }
    } else if entry.is_skip_boot() {
        match verbosity {
            0 | 1 => "Skip",
            2 => "Skip boot",
            3 => "Skip HDDs boot",
            _ => "Skip hard disks boot",
        }
    } else {
        debug!("Unlabelled partition at offset {}", entry.relative_sector_offset);
        "Unknown"
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{TimedBoot, TimerKey, TimerMode};

    fn config_with(labels: &[&str]) -> Configuration {
        let mut config = Configuration::default();
        for (i, label) in labels.iter().enumerate() {
            config
                .add_entry(BootEntry::new(63 + i as u32, *label))
                .unwrap();
        }
        if !labels.is_empty() {
            config.set_default(Some(0)).unwrap();
        }
        config
    }

    #[test]
    fn test_empty_list_gives_placeholder() {
        let menu = build_menu_text(&Configuration::default(), &[]);
        assert_eq!(menu.text, EMPTY_MENU_PLACEHOLDER);
        assert_eq!(menu.slack, 0);
    }

    #[test]
    fn test_short_menu_reaches_full_verbosity() {
        let mut config = config_with(&["DOS"]);
        config.set_default(Some(0)).unwrap();
        let menu = build_menu_text(&config, &[]);
        let expected = format!(
            "\nmbrkit v{}\r\n\n1.*DOS\r\n\nESC stops 1min timer\r\nENTER boots default\r\n\
             Digits boot OS\r\n[          ]\r[",
            env!("CARGO_PKG_VERSION")
        );
        assert_eq!(menu.text, expected);
        assert_eq!(menu.slack, 174 - 4 - (expected.len() as i32 + 1));
    }

    #[test]
    fn test_level_zero_format() {
        let mut config = config_with(&["A"]);
        config.set_key_mode(KeyMode::FunctionKeys);
        config.set_default(None).unwrap();
        assert_eq!(render(&config, 0), "\nF1 A\r\n");
        config.add_entry(BootEntry::skip_boot()).unwrap();
        config.add_entry(BootEntry::next_disk()).unwrap();
        assert_eq!(render(&config, 0), "\nF1 A\r\nF2 Skip\r\nF3 Next HDD\r\n");
    }

    #[test]
    fn test_timer_line_units() {
        let mut config = config_with(&["A"]);
        config.timer_interrupt_key = TimerKey::Space;
        config.timed_boot = TimedBoot {
            mode: TimerMode::UserTimer,
            timeout_ticks: 180,
        };
        assert!(render(&config, 1).ends_with("\nSPACE stops 10s timer\r\n"));
        assert!(render(&config, 5).contains("\nSPACE stops 10sec timer\r\n"));

        config.timed_boot.mode = TimerMode::Disabled;
        assert!(!render(&config, 5).contains("stops"));
        assert!(render(&config, 2).ends_with("\r\n\nENTER boots default\r\n"));
    }

    #[test]
    fn test_custom_keys_have_no_prefix() {
        let mut config = config_with(&["A", "B"]);
        config.set_key_mode(KeyMode::CustomScanCode(0x10));
        let text = render(&config, 3);
        assert!(text.starts_with("\n*A\r\n B\r\n"));
        assert!(text.ends_with("Press a key to boot OS\r\n"));
    }

    #[test]
    fn test_verbosity_drops_when_labels_are_long() {
        let long = "x".repeat(30);
        let config = config_with(&[&long, &long, &long, &long]);
        let menu = build_menu_text(&config, &[]);
        assert!(menu.slack >= 0);
        assert!(!menu.text.contains("mbrkit"));
        assert!(menu.text.starts_with("\n1*"));
    }

    #[test]
    fn test_overflow_returns_warning_text() {
        let long = "x".repeat(60);
        let config = config_with(&[&long, &long, &long]);
        let menu = build_menu_text(&config, &[]);
        assert!(menu.slack < 0);
        assert!(menu.text.starts_with("Too many characters"));
        assert!(menu.text.ends_with(&format!("{} bytes.", -menu.slack)));
    }

    #[test]
    fn test_slack_counts_disk_bytes() {
        let config = config_with(&["Système"]);
        let menu = build_menu_text(&config, &[]);
        assert!(menu.text.contains("1.*Système\r\n"));
        assert_eq!(
            menu.slack,
            174 - 4 - (menu.text.chars().count() as i32 + 1)
        );
    }

    #[test]
    fn test_custom_text_is_kept() {
        let mut config = config_with(&["A"]);
        config.set_custom_menu_text("hello").unwrap();
        let menu = build_menu_text(&config, &[]);
        assert_eq!(menu.text, "hello");
        assert_eq!(menu.slack, 174 - 4 - 6);
    }
}
