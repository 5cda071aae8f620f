//! Conversion between a [`Configuration`] and the 512-byte loader sector.
//!
//! Encoding copies the loader code from a [`Template`] and patches the
//! parameter fields listed in [`crate::layout::FIELDS`]. Several booleans are
//! not stored as values at all: the feature is switched off by overwriting
//! an instruction with `NOP`s, so decoding has to recognise those patterns.

use crate::charset;
use crate::config::{BootEntry, Configuration, ProgressBar, TimedBoot, TimerKey, TimerMode};
use crate::config::{ASCII_DIGIT_ONE, NEXT_DISK_OFFSET, SCAN_CODE_F1, SKIP_BOOT_OFFSET};
use crate::error::DecodeError;
use crate::layout::*;
use crate::sector::{SectorImage, DISK_SIGNATURE_OFFSET, SECTOR_SIZE};
use crate::template::Template;
use crate::MbrError;
use serde::Serialize;
use std::fmt;
use tracing::{debug, trace, warn};

/// Non-fatal findings made while decoding an installed loader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecodeWarning {
    /// The loader is installed but has no entries.
    EmptyPartitionList,
    /// Custom key codes are in use, so labels cannot be found in the text.
    LabelsLost { use_scan_code: bool },
    /// Hiding byte was neither of the known jumps; hiding assumed.
    UnrecognizedHidingByte(u8),
    /// Timer vectors did not match a known pair; timed boot disabled.
    UnrecognizedTimerVectors(u8, u8),
}

impl fmt::Display for DecodeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeWarning::EmptyPartitionList => {
                write!(f, "Boot loader is installed but has no bootable partitions")
            }
            DecodeWarning::LabelsLost { use_scan_code } => write!(
                f,
                "Custom {}code is used for the base key, labels of bootable partitions \
                 cannot be detected and the boot menu text is kept as is",
                if *use_scan_code { "scan-" } else { "ASCII " }
            ),
            DecodeWarning::UnrecognizedHidingByte(value) => write!(
                f,
                "Unexpected hiding jump 0x{:02X}, other primary partitions will be hidden",
                value
            ),
            DecodeWarning::UnrecognizedTimerVectors(first, second) => write!(
                f,
                "Unexpected timer vectors 0x{:02X}/0x{:02X}, timed boot is disabled",
                first, second
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeReport {
    pub configuration: Configuration,
    pub warnings: Vec<DecodeWarning>,
}

/// Builds a fresh loader sector from the template alone.
pub fn encode(config: &Configuration, template: &Template) -> Result<SectorImage, MbrError> {
    encode_onto(config, template, template.image())
}

/// Builds a loader sector on top of `existing`, keeping its disk signature
/// and partition table.
pub fn encode_onto(
    config: &Configuration,
    template: &Template,
    existing: &SectorImage,
) -> Result<SectorImage, MbrError> {
    check_encodable(config)?;

    let mut image = existing.clone();
    image.as_bytes_mut()[..DISK_SIGNATURE_OFFSET]
        .copy_from_slice(&template.image().as_bytes()[..DISK_SIGNATURE_OFFSET]);

    let count = config.bootable_partitions.len();
    put(&mut image, Field::TimerInterruptKey, &[config.timer_interrupt_key.wire_value()]);
    put(&mut image, Field::BootablePartitionCount, &[count as u8]);

    match config.default_partition {
        Some(index) => {
            put(&mut image, Field::DefaultPartitionIndex, &[index as u8]);
            put(&mut image, Field::UpdateDefaultOpcode, &[NOP; 3]);
        }
        None => put(&mut image, Field::DefaultPartitionIndex, &[0]),
    }

    if !config.use_scan_code {
        put(&mut image, Field::KeyCodeModeOpcode, &[NOP; 2]);
    }
    put(&mut image, Field::BaseKeyCode, &[config.base_key_code]);

    if !config.progress_bar.enabled {
        put(&mut image, Field::ProgressBarSwitchOpcode, &[NOP; 2]);
    }
    match config.progress_bar.symbol {
        None => put(&mut image, Field::ProgressBarSymbolOpcode, &DIGIT_PROGRESS_OPCODE),
        Some(symbol) => put(
            &mut image,
            Field::ProgressBarSymbolOpcode,
            &[SYMBOL_PROGRESS_OPCODE, symbol],
        ),
    }

    let hiding = if config.hide_other_primary_partitions {
        HIDE_JUMP
    } else {
        NO_HIDE_JUMP
    };
    put(&mut image, Field::HidingJumpOffset, &[hiding]);

    if !config.mark_active_partition {
        put(&mut image, Field::MarkActiveOpcode, &[NOP; 2]);
    }

    let gate = template.field(Field::TimedBootGate)[0];
    match config.timed_boot.mode {
        TimerMode::Disabled => {
            put(&mut image, Field::TimedBootGate, &[NOP]);
            put_timer_vectors(&mut image, USER_TIMER_VECTOR);
            put(&mut image, Field::ChainOldHandler, &[IRET]);
        }
        TimerMode::UserTimer => {
            put(&mut image, Field::TimedBootGate, &[gate]);
            put_timer_vectors(&mut image, USER_TIMER_VECTOR);
            put(&mut image, Field::ChainOldHandler, &[IRET]);
        }
        TimerMode::SystemTimer => {
            put(&mut image, Field::TimedBootGate, &[gate]);
            put_timer_vectors(&mut image, SYSTEM_TIMER_VECTOR);
        }
    }

    let stored_timeout = (config.timed_boot.timeout_ticks / 10) as u16;
    image.write_u16(Field::Timeout.offset(), stored_timeout);

    let text = charset::encode(&config.boot_menu_text).ok_or_else(|| {
        MbrError::PreconditionViolation(
            "boot menu text has characters outside code page 437".to_string(),
        )
    })?;
    let text_start = Field::MenuText.offset();
    let bytes = image.as_bytes_mut();
    bytes[text_start..text_start + text.len()].copy_from_slice(&text);
    bytes[text_start + text.len()] = 0;
    let table_start = text_start + text.len() + 1;
    for (i, entry) in config.bootable_partitions.iter().enumerate() {
        image.write_u32(table_start + 4 * i, entry.relative_sector_offset);
    }

    debug!(
        "Prepared boot loader with {} bootable partitions, {} bytes of menu text",
        count,
        text.len()
    );
    trace!("Prepared sector:\n{}", image.hex_dump());
    Ok(image)
}

fn check_encodable(config: &Configuration) -> Result<(), MbrError> {
    let count = config.bootable_partitions.len();
    if count > MAX_BOOTABLE_PARTITIONS {
        return Err(MbrError::PreconditionViolation(format!(
            "{} bootable partitions cannot be encoded, the maximum is {}",
            count, MAX_BOOTABLE_PARTITIONS
        )));
    }
    if config.boot_menu_text.contains('\0') {
        return Err(MbrError::PreconditionViolation(
            "boot menu text contains a NUL character".to_string(),
        ));
    }
    let needed = charset::encoded_len(&config.boot_menu_text) + 1 + 4 * count;
    if needed > MENU_TEXT_REGION {
        return Err(MbrError::PreconditionViolation(format!(
            "boot menu text and offsets need {} bytes, only {} are available",
            needed, MENU_TEXT_REGION
        )));
    }
    if let Some(index) = config.default_partition {
        if index >= count {
            return Err(MbrError::PreconditionViolation(format!(
                "default partition index {} is out of range",
                index
            )));
        }
    }
    if config.timed_boot.timeout_ticks > MAX_TIMEOUT_TICKS {
        return Err(MbrError::PreconditionViolation(format!(
            "timeout of {} ticks does not fit the loader",
            config.timed_boot.timeout_ticks
        )));
    }
    if config.timed_boot.timeout_ticks % TICKS_PER_SECOND != 0 {
        return Err(MbrError::PreconditionViolation(format!(
            "timeout of {} ticks is not a whole number of seconds",
            config.timed_boot.timeout_ticks
        )));
    }
    Ok(())
}

fn put(image: &mut SectorImage, field: Field, value: &[u8]) {
    image.as_bytes_mut()[field.range()].copy_from_slice(value);
}

fn put_timer_vectors(image: &mut SectorImage, vector: u8) {
    put(image, Field::TimerVectorPrimary, &[vector]);
    put(image, Field::TimerVectorSecondary, &[vector]);
}

fn is_nop(image: &SectorImage, field: Field) -> bool {
    image.as_bytes()[field.range()].iter().all(|&b| b == NOP)
}

/// Reads back the configuration of an installed loader.
pub fn decode(sector: &SectorImage, template: &Template) -> Result<DecodeReport, DecodeError> {
    decode_with_mask(sector, template, &SIGNIFICANCE_MASK)
}

pub fn decode_with_mask(
    sector: &SectorImage,
    template: &Template,
    mask: &[u8; SECTOR_SIZE],
) -> Result<DecodeReport, DecodeError> {
    trace!("Decoding sector:\n{}", sector.hex_dump());

    if !sector.has_boot_signature() {
        return Err(DecodeError::NotOurLoader(
            "magic number 0xAA55 is not found".to_string(),
        ));
    }
    validate_mask(mask)?;

    let bytes = sector.as_bytes();
    let reference = template.image().as_bytes();
    if let Some(offset) =
        (0..SECTOR_SIZE).find(|&i| mask[i] == MASK_SIGNIFICANT && bytes[i] != reference[i])
    {
        debug!(
            "Byte 0x{:03X} is 0x{:02X}, expected 0x{:02X}",
            offset, bytes[offset], reference[offset]
        );
        return Err(DecodeError::NotOurLoader(format!(
            "byte at 0x{:03X} differs from the boot loader code",
            offset
        )));
    }

    let mut config = Configuration::default();
    let mut warnings = Vec::new();
    let byte = |field: Field| bytes[field.offset()];

    let key = byte(Field::TimerInterruptKey);
    config.timer_interrupt_key = TimerKey::from_wire(key).ok_or_else(|| {
        DecodeError::Corrupt(format!("unknown timer interrupt key 0x{:02X}", key))
    })?;
    debug!("Timer interrupt key: 0x{:02X}", key);

    let count = byte(Field::BootablePartitionCount) as usize;
    if count > MAX_BOOTABLE_PARTITIONS {
        return Err(DecodeError::Corrupt(format!(
            "number of bootable partitions is {}, at most {} are supported",
            count, MAX_BOOTABLE_PARTITIONS
        )));
    }
    if count == 0 {
        warn!("Boot loader has no bootable partitions configured");
        warnings.push(DecodeWarning::EmptyPartitionList);
    }
    debug!("Number of bootable partitions: {}", count);

    config.default_partition = if is_nop(sector, Field::UpdateDefaultOpcode) {
        let index = byte(Field::DefaultPartitionIndex) as usize;
        if index >= count {
            return Err(DecodeError::Corrupt(format!(
                "default partition {} is out of range",
                index
            )));
        }
        Some(index)
    } else {
        None
    };
    debug!("Default partition: {:?}", config.default_partition);

    config.use_scan_code = !is_nop(sector, Field::KeyCodeModeOpcode);
    config.base_key_code = byte(Field::BaseKeyCode);
    debug!(
        "Key code: {} 0x{:02X}",
        if config.use_scan_code { "scan" } else { "ASCII" },
        config.base_key_code
    );

    let symbol_opcode = &bytes[Field::ProgressBarSymbolOpcode.range()];
    let symbol = if symbol_opcode == DIGIT_PROGRESS_OPCODE {
        None
    } else {
        Some(symbol_opcode[1])
    };
    config.progress_bar = ProgressBar {
        enabled: !is_nop(sector, Field::ProgressBarSwitchOpcode),
        symbol,
    };
    debug!("Progress bar: {:?}", config.progress_bar);

    config.hide_other_primary_partitions = match byte(Field::HidingJumpOffset) {
        HIDE_JUMP => true,
        NO_HIDE_JUMP => false,
        other => {
            warn!("Unexpected hiding jump 0x{:02X}, assuming partitions are hidden", other);
            warnings.push(DecodeWarning::UnrecognizedHidingByte(other));
            true
        }
    };
    config.mark_active_partition = !is_nop(sector, Field::MarkActiveOpcode);

    let mode = if byte(Field::TimedBootGate) == NOP {
        TimerMode::Disabled
    } else {
        match (byte(Field::TimerVectorPrimary), byte(Field::TimerVectorSecondary)) {
            (USER_TIMER_VECTOR, USER_TIMER_VECTOR) => TimerMode::UserTimer,
            (SYSTEM_TIMER_VECTOR, SYSTEM_TIMER_VECTOR) => TimerMode::SystemTimer,
            (first, second) => {
                warn!(
                    "Unexpected timer vectors 0x{:02X}/0x{:02X}, timed boot disabled",
                    first, second
                );
                warnings.push(DecodeWarning::UnrecognizedTimerVectors(first, second));
                TimerMode::Disabled
            }
        }
    };
    let mut timed_boot = TimedBoot {
        mode,
        ..TimedBoot::default()
    };
    if timed_boot.is_enabled() {
        let stored = sector.read_u16(Field::Timeout.offset());
        if stored > MAX_STORED_TIMEOUT {
            return Err(DecodeError::Corrupt(format!(
                "timeout value {} exceeds {}",
                stored, MAX_STORED_TIMEOUT
            )));
        }
        timed_boot.timeout_ticks = round_up_to_second(stored as u32 * 10);
    }
    config.timed_boot = timed_boot;
    debug!("Timed boot: {:?}", config.timed_boot);

    let region = &bytes[Field::MenuText.range()];
    let text_len = region
        .iter()
        .position(|&b| b == 0)
        .filter(|&len| len < MENU_TEXT_REGION - 4 * count)
        .ok_or_else(|| DecodeError::Corrupt("boot menu text is too long".to_string()))?;
    config.boot_menu_text = charset::decode(&region[..text_len]);
    debug!("Boot menu text: {:?}", config.boot_menu_text);

    let table_start = Field::MenuText.offset() + text_len + 1;
    let prefix = match (config.use_scan_code, config.base_key_code) {
        (false, ASCII_DIGIT_ONE) => Some(""),
        (true, SCAN_CODE_F1) => Some("F"),
        _ => None,
    };
    if prefix.is_none() {
        warn!("Custom base key code, labels of bootable partitions cannot be detected");
        warnings.push(DecodeWarning::LabelsLost {
            use_scan_code: config.use_scan_code,
        });
        config.custom_text_mode = true;
    }

    for i in 0..count {
        let offset = sector.read_u32(table_start + 4 * i);
        debug!("Bootable partition {}: offset {}", i, offset);
        let label = match prefix {
            Some(prefix) if offset != NEXT_DISK_OFFSET && offset != SKIP_BOOT_OFFSET => {
                find_label(&config.boot_menu_text, &format!("\n{}{}", prefix, i + 1))
            }
            _ => String::new(),
        };
        config.bootable_partitions.push(BootEntry::new(offset, label));
    }

    Ok(DecodeReport {
        configuration: config,
        warnings,
    })
}

/// Converts ticks to a whole number of seconds, rounding up.
fn round_up_to_second(ticks: u32) -> u32 {
    ticks.div_ceil(TICKS_PER_SECOND) * TICKS_PER_SECOND
}

/// Pulls the label of an entry out of a generated menu line such as
/// `"\n2.*Linux\r\n"`.
fn find_label(text: &str, marker: &str) -> String {
    let Some(found) = text.find(marker) else {
        return String::new();
    };
    let mut rest = &text[found + marker.len()..];
    if let Some(stripped) = rest.strip_prefix('.') {
        rest = stripped;
    }
    let mut chars = rest.chars();
    if chars.next().is_none() {
        return String::new();
    }
    let rest = chars.as_str();
    let label = rest.split('\r').next().unwrap_or_default();
    if label == "Unknown" {
        String::new()
    } else {
        label.to_string()
    }
}
