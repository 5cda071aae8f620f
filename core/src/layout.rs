//! Byte layout of the boot loader sector.
//!
//! Every configurable parameter lives at a fixed offset inside the loader
//! image. Encoding and decoding both go through [`Field`] so the two paths can
//! never disagree about where a value is stored.

use crate::error::DecodeError;
use crate::sector::{DISK_SIGNATURE_OFFSET, SECTOR_SIZE};
use std::ops::Range;

pub const NOP: u8 = 0x90;
pub const IRET: u8 = 0xCF;
pub const KEY_ESC: u8 = 0x1B;
pub const KEY_SPACE: u8 = 0x20;
/// INT 1Ch, the user timer hook.
pub const USER_TIMER_VECTOR: u8 = 0x70;
/// INT 08h, the system timer.
pub const SYSTEM_TIMER_VECTOR: u8 = 0x20;
pub const HIDE_JUMP: u8 = 0x02;
pub const NO_HIDE_JUMP: u8 = 0x05;
/// `mov al, dh` - progress bar counts down with digits.
pub const DIGIT_PROGRESS_OPCODE: [u8; 2] = [0x88, 0xF0];
/// `mov al, imm8` - progress bar draws the immediate symbol.
pub const SYMBOL_PROGRESS_OPCODE: u8 = 0xB0;
pub const LAST_BOOTED_SENTINEL: u8 = 0xFF;

pub const MAX_BOOTABLE_PARTITIONS: usize = 9;
/// Largest value accepted in the on-disk timeout word (ticks / 10).
pub const MAX_STORED_TIMEOUT: u16 = 64800;
pub const TICKS_PER_SECOND: u32 = 18;
pub const TICKS_PER_MINUTE: u32 = TICKS_PER_SECOND * 60;
pub const MAX_TIMEOUT_TICKS: u32 = MAX_STORED_TIMEOUT as u32 * 10;

pub const MENU_TEXT_OFFSET: usize = 0x10A;
/// Bytes shared by the menu text, its terminator and the offset table.
pub const MENU_TEXT_REGION: usize = DISK_SIGNATURE_OFFSET - MENU_TEXT_OFFSET;

/// Named parameter slots inside the loader image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    TimerVectorPrimary,
    TimerInterruptKey,
    KeyCodeModeOpcode,
    BaseKeyCode,
    BootablePartitionCount,
    Timeout,
    ProgressBarSymbolOpcode,
    ProgressBarSwitchOpcode,
    DefaultPartitionIndex,
    UpdateDefaultOpcode,
    TimerVectorSecondary,
    MarkActiveOpcode,
    HidingJumpOffset,
    TimedBootGate,
    ChainOldHandler,
    MenuText,
}

/// Offset and width of one [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub offset: usize,
    pub width: usize,
}

impl FieldSpec {
    pub const fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.width
    }
}

pub const FIELDS: [FieldSpec; 16] = [
    FieldSpec { field: Field::TimerVectorPrimary, offset: 0x30, width: 1 },
    FieldSpec { field: Field::TimerInterruptKey, offset: 0x44, width: 1 },
    FieldSpec { field: Field::KeyCodeModeOpcode, offset: 0x4C, width: 2 },
    FieldSpec { field: Field::BaseKeyCode, offset: 0x4F, width: 1 },
    FieldSpec { field: Field::BootablePartitionCount, offset: 0x51, width: 1 },
    FieldSpec { field: Field::Timeout, offset: 0x55, width: 2 },
    FieldSpec { field: Field::ProgressBarSymbolOpcode, offset: 0x5F, width: 2 },
    FieldSpec { field: Field::ProgressBarSwitchOpcode, offset: 0x61, width: 2 },
    FieldSpec { field: Field::DefaultPartitionIndex, offset: 0x6B, width: 1 },
    FieldSpec { field: Field::UpdateDefaultOpcode, offset: 0x6C, width: 3 },
    FieldSpec { field: Field::TimerVectorSecondary, offset: 0x73, width: 1 },
    FieldSpec { field: Field::MarkActiveOpcode, offset: 0x97, width: 2 },
    FieldSpec { field: Field::HidingJumpOffset, offset: 0xBF, width: 1 },
    FieldSpec { field: Field::TimedBootGate, offset: 0xF6, width: 1 },
    FieldSpec { field: Field::ChainOldHandler, offset: 0xF7, width: 1 },
    FieldSpec { field: Field::MenuText, offset: MENU_TEXT_OFFSET, width: MENU_TEXT_REGION },
];

impl Field {
    pub fn spec(self) -> FieldSpec {
        FIELDS[self as usize]
    }

    pub fn offset(self) -> usize {
        self.spec().offset
    }

    pub fn range(self) -> Range<usize> {
        self.spec().range()
    }
}

/// Which bytes of the loader carry configuration (`0xFF`) and which must
/// match the template exactly (`0x00`). Everything from the menu text to the
/// end of the partition table is ignored.
pub const SIGNIFICANCE_MASK: [u8; SECTOR_SIZE] = [
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0xFF,
    0x00, 0xFF, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF,
    0xFF, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0x00,
    0x00, 0x00, 0x00, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF,
    0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x00, 0x00,
];

pub const MASK_SIGNIFICANT: u8 = 0x00;
pub const MASK_IGNORED: u8 = 0xFF;

/// Rejects a mask holding anything other than the two marker values.
pub fn validate_mask(mask: &[u8; SECTOR_SIZE]) -> Result<(), DecodeError> {
    match mask
        .iter()
        .position(|&b| b != MASK_SIGNIFICANT && b != MASK_IGNORED)
    {
        Some(offset) => Err(DecodeError::InvalidMask {
            offset,
            value: mask[offset],
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sector::BOOT_SIGNATURE_OFFSET;

    #[test]
    fn test_field_table_is_indexed_by_variant() {
        for spec in FIELDS.iter() {
            assert_eq!(spec.field.spec(), *spec);
        }
    }

    #[test]
    fn test_mask_covers_exactly_the_parameter_fields() {
        let mut expected = [MASK_SIGNIFICANT; SECTOR_SIZE];
        for spec in FIELDS.iter().filter(|s| s.field != Field::MenuText) {
            for offset in spec.range() {
                expected[offset] = MASK_IGNORED;
            }
        }
        // Menu text, disk signature and partition table all vary per disk.
        for offset in MENU_TEXT_OFFSET..BOOT_SIGNATURE_OFFSET {
            expected[offset] = MASK_IGNORED;
        }
        assert_eq!(SIGNIFICANCE_MASK.to_vec(), expected.to_vec());
    }

    #[test]
    fn test_boot_signature_is_significant() {
        assert_eq!(SIGNIFICANCE_MASK[0x1FE], MASK_SIGNIFICANT);
        assert_eq!(SIGNIFICANCE_MASK[0x1FF], MASK_SIGNIFICANT);
    }

    #[test]
    fn test_validate_mask_rejects_other_values() {
        assert!(validate_mask(&SIGNIFICANCE_MASK).is_ok());

        let mut broken = SIGNIFICANCE_MASK;
        broken[0x40] = 0x7F;
        assert_eq!(
            validate_mask(&broken),
            Err(DecodeError::InvalidMask { offset: 0x40, value: 0x7F })
        );
    }

    #[test]
    fn test_menu_text_region_size() {
        assert_eq!(MENU_TEXT_REGION, 174);
        assert_eq!(MAX_TIMEOUT_TICKS, 648_000);
    }
}
