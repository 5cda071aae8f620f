use crate::charset;
use crate::layout::{
    KEY_ESC, KEY_SPACE, MAX_BOOTABLE_PARTITIONS, MAX_TIMEOUT_TICKS, MENU_TEXT_REGION,
    TICKS_PER_MINUTE, TICKS_PER_SECOND,
};
use crate::scanner::DiscoveredPartition;
use crate::MbrError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Entry offset meaning "hand over to the next hard disk".
pub const NEXT_DISK_OFFSET: u32 = 0;
/// Entry offset meaning "skip hard disk boot entirely".
pub const SKIP_BOOT_OFFSET: u32 = u32::MAX;
pub const MAX_LABEL_LEN: usize = 255;

pub const ASCII_DIGIT_ONE: u8 = b'1';
pub const SCAN_CODE_F1: u8 = 0x3B;

/// Key that interrupts the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimerKey {
    #[default]
    Esc,
    Space,
}

impl TimerKey {
    pub fn wire_value(self) -> u8 {
        match self {
            TimerKey::Esc => KEY_ESC,
            TimerKey::Space => KEY_SPACE,
        }
    }

    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            KEY_ESC => Some(TimerKey::Esc),
            KEY_SPACE => Some(TimerKey::Space),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            TimerKey::Esc => "ESC",
            TimerKey::Space => "SPACE",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootEntry {
    pub relative_sector_offset: u32,
    #[serde(default)]
    pub label: String,
}

impl BootEntry {
    pub fn new(relative_sector_offset: u32, label: impl Into<String>) -> Self {
        Self {
            relative_sector_offset,
            label: label.into(),
        }
    }

    pub fn next_disk() -> Self {
        Self::new(NEXT_DISK_OFFSET, "")
    }

    pub fn skip_boot() -> Self {
        Self::new(SKIP_BOOT_OFFSET, "")
    }

    pub fn is_next_disk(&self) -> bool {
        self.relative_sector_offset == NEXT_DISK_OFFSET
    }

    pub fn is_skip_boot(&self) -> bool {
        self.relative_sector_offset == SKIP_BOOT_OFFSET
    }

    /// Next-disk and skip entries never carry a label.
    pub fn is_synthetic(&self) -> bool {
        self.is_next_disk() || self.is_skip_boot()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressBar {
    pub enabled: bool,
    /// `None` draws a digit countdown, `Some(c)` repeats `c`.
    pub symbol: Option<u8>,
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self {
            enabled: true,
            symbol: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TimerMode {
    Disabled,
    /// Hook INT 1Ch.
    #[default]
    UserTimer,
    /// Hook INT 08h directly, for BIOSes that never call INT 1Ch.
    SystemTimer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedBoot {
    pub mode: TimerMode,
    /// Countdown length in 1/18 s ticks, a whole number of seconds.
    pub timeout_ticks: u32,
}

impl TimedBoot {
    pub fn is_enabled(&self) -> bool {
        self.mode != TimerMode::Disabled
    }

    pub fn timeout_seconds(&self) -> u32 {
        self.timeout_ticks / TICKS_PER_SECOND
    }
}

impl Default for TimedBoot {
    fn default() -> Self {
        Self {
            mode: TimerMode::UserTimer,
            timeout_ticks: TICKS_PER_MINUTE,
        }
    }
}

/// How menu entries are selected at boot time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyMode {
    /// Keys `1`..`9`.
    Digits,
    /// Keys F1..F9.
    FunctionKeys,
    CustomAscii(u8),
    CustomScanCode(u8),
}

/// Everything the loader needs to know, as edited by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub timer_interrupt_key: TimerKey,
    pub use_scan_code: bool,
    pub base_key_code: u8,
    pub bootable_partitions: Vec<BootEntry>,
    /// `None` boots whichever entry was chosen last time.
    pub default_partition: Option<usize>,
    pub progress_bar: ProgressBar,
    pub timed_boot: TimedBoot,
    pub hide_other_primary_partitions: bool,
    pub mark_active_partition: bool,
    pub boot_menu_text: String,
    pub custom_text_mode: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            timer_interrupt_key: TimerKey::Esc,
            use_scan_code: false,
            base_key_code: ASCII_DIGIT_ONE,
            bootable_partitions: Vec::new(),
            default_partition: None,
            progress_bar: ProgressBar::default(),
            timed_boot: TimedBoot::default(),
            hide_other_primary_partitions: true,
            mark_active_partition: true,
            boot_menu_text: String::new(),
            custom_text_mode: false,
        }
    }
}

impl Configuration {
    pub fn from_json_file(path: &Path) -> Result<Self, MbrError> {
        let content = fs::read_to_string(path)?;
        let config: Configuration = serde_json::from_str(&content)?;
        debug!(
            "Loaded configuration with {} bootable partitions from {}",
            config.bootable_partitions.len(),
            path.display()
        );
        Ok(config)
    }

    pub fn to_json_file(&self, path: &Path) -> Result<(), MbrError> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn key_mode(&self) -> KeyMode {
        match (self.use_scan_code, self.base_key_code) {
            (false, ASCII_DIGIT_ONE) => KeyMode::Digits,
            (true, SCAN_CODE_F1) => KeyMode::FunctionKeys,
            (false, code) => KeyMode::CustomAscii(code),
            (true, code) => KeyMode::CustomScanCode(code),
        }
    }

    pub fn set_key_mode(&mut self, mode: KeyMode) {
        let (use_scan_code, base_key_code) = match mode {
            KeyMode::Digits => (false, ASCII_DIGIT_ONE),
            KeyMode::FunctionKeys => (true, SCAN_CODE_F1),
            KeyMode::CustomAscii(code) => (false, code),
            KeyMode::CustomScanCode(code) => (true, code),
        };
        self.use_scan_code = use_scan_code;
        self.base_key_code = base_key_code;
    }

    /// Digits or F-keys, the only modes whose menu text can be generated.
    pub fn uses_canonical_keys(&self) -> bool {
        matches!(self.key_mode(), KeyMode::Digits | KeyMode::FunctionKeys)
    }

    /// Longest menu text (without terminator) that still fits next to the
    /// offset table.
    pub fn max_menu_text_len(&self) -> usize {
        (MENU_TEXT_REGION - 1).saturating_sub(4 * self.bootable_partitions.len())
    }

    /// Bytes left in the text region; negative when the text overflows.
    pub fn menu_text_slack(&self) -> i32 {
        MENU_TEXT_REGION as i32
            - 4 * self.bootable_partitions.len() as i32
            - (charset::encoded_len(&self.boot_menu_text) as i32 + 1)
    }

    pub fn add_entry(&mut self, entry: BootEntry) -> Result<(), MbrError> {
        if self.bootable_partitions.len() >= MAX_BOOTABLE_PARTITIONS {
            return Err(MbrError::InvalidInput(format!(
                "no more than {} bootable partitions are supported",
                MAX_BOOTABLE_PARTITIONS
            )));
        }
        validate_label(&entry.label)?;
        debug!(
            "Adding bootable partition at offset {} ({:?})",
            entry.relative_sector_offset, entry.label
        );
        self.bootable_partitions.push(entry);
        Ok(())
    }

    /// Removes entry `index`, keeping the default inside the shrunk list.
    pub fn remove_entry(&mut self, index: usize) -> Result<BootEntry, MbrError> {
        if index >= self.bootable_partitions.len() {
            return Err(MbrError::InvalidInput(format!(
                "there is no bootable partition number {}",
                index + 1
            )));
        }
        let removed = self.bootable_partitions.remove(index);
        if self.bootable_partitions.is_empty() {
            self.default_partition = None;
        } else if let Some(default) = self.default_partition {
            if default >= self.bootable_partitions.len() {
                self.default_partition = Some(default - 1);
                debug!("Default partition moved to {}", default - 1);
            }
        }
        Ok(removed)
    }

    pub fn set_default(&mut self, default: Option<usize>) -> Result<(), MbrError> {
        if let Some(index) = default {
            if index >= self.bootable_partitions.len() {
                return Err(MbrError::InvalidInput(format!(
                    "there is no bootable partition number {}",
                    index + 1
                )));
            }
        }
        self.default_partition = default;
        Ok(())
    }

    /// Sets the countdown. The loader stores whole seconds only.
    pub fn set_timeout_seconds(&mut self, seconds: u32) -> Result<(), MbrError> {
        let ticks = seconds.saturating_mul(TICKS_PER_SECOND);
        if ticks > MAX_TIMEOUT_TICKS {
            return Err(MbrError::InvalidInput(format!(
                "timeout must be between 0 and {} seconds",
                MAX_TIMEOUT_TICKS / TICKS_PER_SECOND
            )));
        }
        self.timed_boot.timeout_ticks = ticks;
        Ok(())
    }

    pub fn set_label(&mut self, index: usize, label: &str) -> Result<(), MbrError> {
        validate_label(label)?;
        let entry = self.bootable_partitions.get_mut(index).ok_or_else(|| {
            MbrError::InvalidInput(format!("there is no bootable partition number {}", index + 1))
        })?;
        if entry.is_synthetic() {
            return Err(MbrError::InvalidInput(
                "next-disk and skip-boot entries cannot be labelled".to_string(),
            ));
        }
        entry.label = label.to_string();
        Ok(())
    }

    /// Switches to a user supplied menu text that is stored verbatim.
    pub fn set_custom_menu_text(&mut self, text: &str) -> Result<(), MbrError> {
        if text.contains('\0') {
            return Err(MbrError::InvalidInput(
                "boot menu text must not contain NUL characters".to_string(),
            ));
        }
        check_code_page(text)?;
        let len = charset::encoded_len(text);
        if len > self.max_menu_text_len() {
            return Err(MbrError::InvalidInput(format!(
                "boot menu text is {} bytes long, at most {} bytes fit",
                len,
                self.max_menu_text_len()
            )));
        }
        self.custom_text_mode = true;
        self.boot_menu_text = text.to_string();
        Ok(())
    }

    /// Leaves custom mode and rebuilds the text from the entry list.
    pub fn use_generated_menu_text(&mut self, partitions: &[DiscoveredPartition]) {
        self.custom_text_mode = false;
        self.regenerate_menu_text(partitions);
    }

    /// Re-renders the menu text unless the user supplied their own.
    pub fn regenerate_menu_text(&mut self, partitions: &[DiscoveredPartition]) -> i32 {
        let menu = crate::menu::build_menu_text(self, partitions);
        if !self.custom_text_mode {
            self.boot_menu_text = menu.text;
        }
        menu.slack
    }

    /// Checks every structural invariant the encoder relies on.
    pub fn validate(&self) -> Result<(), MbrError> {
        let count = self.bootable_partitions.len();
        if count > MAX_BOOTABLE_PARTITIONS {
            return Err(MbrError::InvalidInput(format!(
                "{} bootable partitions configured, at most {} are supported",
                count, MAX_BOOTABLE_PARTITIONS
            )));
        }
        if let Some(index) = self.default_partition {
            if index >= count {
                return Err(MbrError::InvalidInput(format!(
                    "default partition {} is out of range 1-{}",
                    index + 1,
                    count
                )));
            }
        }
        for entry in &self.bootable_partitions {
            validate_label(&entry.label)?;
        }
        if self.timed_boot.timeout_ticks > MAX_TIMEOUT_TICKS {
            return Err(MbrError::InvalidInput(format!(
                "timeout of {} ticks exceeds the maximum of {}",
                self.timed_boot.timeout_ticks, MAX_TIMEOUT_TICKS
            )));
        }
        if self.timed_boot.timeout_ticks % TICKS_PER_SECOND != 0 {
            return Err(MbrError::InvalidInput(format!(
                "timeout of {} ticks is not a whole number of seconds",
                self.timed_boot.timeout_ticks
            )));
        }
        if self.boot_menu_text.contains('\0') {
            return Err(MbrError::InvalidInput(
                "boot menu text must not contain NUL characters".to_string(),
            ));
        }
        check_code_page(&self.boot_menu_text)?;
        let slack = self.menu_text_slack();
        if slack < 0 {
            return Err(MbrError::InvalidInput(format!(
                "boot menu text does not fit, free at least {} bytes",
                -slack
            )));
        }
        Ok(())
    }
}

fn check_code_page(text: &str) -> Result<(), MbrError> {
    match charset::first_unmappable(text) {
        Some(c) => Err(MbrError::InvalidInput(format!(
            "character {:?} cannot be shown by the BIOS (code page 437)",
            c
        ))),
        None => Ok(()),
    }
}

fn validate_label(label: &str) -> Result<(), MbrError> {
    let len = charset::encoded_len(label);
    if len > MAX_LABEL_LEN {
        return Err(MbrError::InvalidInput(format!(
            "label is {} bytes long, at most {} are allowed",
            len, MAX_LABEL_LEN
        )));
    }
    check_code_page(label)?;
    if label.contains('\0') || label.contains('\r') || label.contains('\n') {
        return Err(MbrError::InvalidInput(
            "label must not contain NUL or line break characters".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(count: usize) -> Configuration {
        let mut config = Configuration::default();
        for i in 0..count {
            config
                .add_entry(BootEntry::new(63 + i as u32 * 1000, format!("OS {}", i)))
                .unwrap();
        }
        config
    }

    #[test]
    fn test_defaults_match_loader_defaults() {
        let config = Configuration::default();
        assert_eq!(config.timer_interrupt_key, TimerKey::Esc);
        assert_eq!(config.key_mode(), KeyMode::Digits);
        assert_eq!(config.timed_boot.timeout_ticks, 1080);
        assert_eq!(config.timed_boot.mode, TimerMode::UserTimer);
        assert!(config.progress_bar.enabled);
        assert!(config.hide_other_primary_partitions);
        assert!(config.mark_active_partition);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tenth_entry_is_rejected() {
        let mut config = config_with(9);
        assert!(config.validate().is_ok());
        let err = config.add_entry(BootEntry::new(1, "")).unwrap_err();
        assert!(matches!(err, MbrError::InvalidInput(_)));
        assert_eq!(config.bootable_partitions.len(), 9);
    }

    #[test]
    fn test_remove_entry_pulls_default_back_in_range() {
        let mut config = config_with(3);
        config.set_default(Some(2)).unwrap();
        config.remove_entry(2).unwrap();
        assert_eq!(config.default_partition, Some(1));
        config.remove_entry(0).unwrap();
        assert_eq!(config.default_partition, Some(0));

        config.set_default(None).unwrap();
        config.remove_entry(0).unwrap();
        assert_eq!(config.default_partition, None);
    }

    #[test]
    fn test_removing_last_entry_clears_default() {
        let mut config = config_with(1);
        config.set_default(Some(0)).unwrap();
        config.remove_entry(0).unwrap();
        assert_eq!(config.default_partition, None);
        assert!(config.validate().is_ok());
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_default_index_needs_an_entry() {
        let mut config = Configuration::default();
        assert_eq!(config.default_partition, None);
        config.default_partition = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_timeout_is_whole_seconds() {
        let mut config = Configuration::default();
        config.set_timeout_seconds(10).unwrap();
        assert_eq!(config.timed_boot.timeout_ticks, 180);
        assert_eq!(config.timed_boot.timeout_seconds(), 10);
        assert!(config.set_timeout_seconds(36_001).is_err());
        config.set_timeout_seconds(36_000).unwrap();
        assert!(config.validate().is_ok());

        config.timed_boot.timeout_ticks = 100;
        assert!(matches!(config.validate(), Err(MbrError::InvalidInput(_))));
    }

    #[test]
    fn test_labels_must_be_printable_by_the_bios() {
        let mut config = config_with(1);
        config.set_label(0, "Café").unwrap();
        assert!(config.set_label(0, "Tux \u{1F427}").is_err());
        assert!(config.set_custom_menu_text("\n1 \u{4E2D}\r\n").is_err());
        config.boot_menu_text = "\n1 \u{4E2D}\r\n".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_custom_text_length_counts_disk_bytes() {
        let mut config = config_with(9);
        config.set_custom_menu_text(&"é".repeat(137)).unwrap();
        assert_eq!(config.menu_text_slack(), 0);
    }

    #[test]
    fn test_set_default_out_of_range() {
        let mut config = config_with(2);
        assert!(config.set_default(Some(2)).is_err());
        assert!(config.set_default(Some(1)).is_ok());
    }

    #[test]
    fn test_key_modes() {
        let mut config = Configuration::default();
        config.set_key_mode(KeyMode::FunctionKeys);
        assert!(config.use_scan_code);
        assert_eq!(config.base_key_code, 0x3B);
        assert!(config.uses_canonical_keys());

        config.set_key_mode(KeyMode::CustomAscii(b'a'));
        assert_eq!(config.key_mode(), KeyMode::CustomAscii(b'a'));
        assert!(!config.uses_canonical_keys());
    }

    #[test]
    fn test_label_rules() {
        let mut config = config_with(1);
        assert!(config.set_label(0, &"x".repeat(256)).is_err());
        assert!(config.set_label(0, "bad\0label").is_err());
        assert!(config.set_label(0, "Linux").is_ok());

        config.add_entry(BootEntry::next_disk()).unwrap();
        assert!(config.set_label(1, "Other").is_err());
    }

    #[test]
    fn test_custom_text_must_fit() {
        let mut config = config_with(9);
        assert_eq!(config.max_menu_text_len(), 137);
        assert!(config.set_custom_menu_text(&"a".repeat(138)).is_err());
        config.set_custom_menu_text(&"a".repeat(137)).unwrap();
        assert!(config.custom_text_mode);
        assert_eq!(config.menu_text_slack(), 0);
    }

    #[test]
    fn test_validate_rejects_overflowing_text() {
        let mut config = config_with(1);
        config.boot_menu_text = "x".repeat(170);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_json_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mbr.json");
        let mut config = config_with(2);
        config.timer_interrupt_key = TimerKey::Space;
        config.to_json_file(&path).unwrap();
        assert_eq!(Configuration::from_json_file(&path).unwrap(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Configuration =
            serde_json::from_str(r#"{"bootable_partitions":[{"relative_sector_offset":63}]}"#)
                .unwrap();
        assert_eq!(config.bootable_partitions[0].label, "");
        assert_eq!(config.timed_boot.timeout_ticks, 1080);
    }
}
