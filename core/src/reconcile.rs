//! Merging a backed up MBR with the one currently on disk.
//!
//! Restoring an old sector blindly can destroy partitions created since the
//! backup was taken. Each difference that matters is put to the user through
//! a [`RestorePrompt`], and the backup is patched according to the answers.

use crate::sector::{SectorImage, PARTITION_ENTRY_SIZE};
use crate::MbrError;
use serde::Serialize;
use tracing::{debug, warn};

/// Partition types whose 0x10 bit only toggles visibility.
const HIDEABLE_TYPES: [u8; 7] = [0x01, 0x04, 0x06, 0x07, 0x0B, 0x0C, 0x0E];
const HIDDEN_BIT_MASK: u8 = 0xEF;

const KEEP_CURRENT_TABLE: &str =
    "Keep current partition table, restore only boot loader from backup";
const RESTORE_WHOLE_MBR: &str = "Overwrite current partition table, restore whole MBR from backup";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RestoreQuestion {
    MissingSignature,
    DiskSignatureDiffers,
    PartitionsAppeared,
    PartitionsDisappeared,
    GeometryDiffers,
    ActiveFlagsDiffer,
    VisibilityDiffers,
    PartitionTypesDiffer,
    ConfirmRestore,
}

impl RestoreQuestion {
    pub fn message(&self) -> &'static str {
        match self {
            RestoreQuestion::MissingSignature => {
                "Magic number 0xAA55 is not found, hard disk may not be bootable."
            }
            RestoreQuestion::DiskSignatureDiffers => {
                "Windows hard-disk signature is different in current MBR and backup.\n\
                 It is better to keep what you have in MBR if you use Windows operating system."
            }
            RestoreQuestion::PartitionsAppeared => {
                "New partition(s) appeared in current MBR comparing to backup.\n\
                 It is highly recommended to keep current partition table from your MBR\n\
                 since restoring from backup may corrupt hard disk partitioning."
            }
            RestoreQuestion::PartitionsDisappeared => {
                "Old partition(s) disappeared from current MBR comparing to backup.\n\
                 It is highly recommended to keep current partition table from your MBR\n\
                 since restoring from backup may corrupt hard disk partitioning."
            }
            RestoreQuestion::GeometryDiffers => {
                "Partitions in current MBR have different geometry comparing to backup.\n\
                 It is highly recommended to keep current partition table from your MBR\n\
                 since restoring from backup may corrupt hard disk partitioning."
            }
            RestoreQuestion::ActiveFlagsDiffer => {
                "Different partitions are marked as active in your current MBR and the backup.\n\
                 It is safe to restore old values from backup."
            }
            RestoreQuestion::VisibilityDiffers => {
                "Several partitions have changed visibility (hidden became visible and/or\n\
                 vice versa). It is safe to restore old values from backup."
            }
            RestoreQuestion::PartitionTypesDiffer => {
                "Partitions in current MBR have different identifiers comparing to backup.\n\
                 It is highly recommended to keep current partition table from your MBR\n\
                 since restoring from backup may corrupt hard disk partitioning."
            }
            RestoreQuestion::ConfirmRestore => "Are you sure?",
        }
    }

    pub fn first_option(&self) -> &'static str {
        match self {
            RestoreQuestion::MissingSignature => {
                "Add 0xAA55 signature to the end of the backup sector"
            }
            RestoreQuestion::DiskSignatureDiffers => "Keep hard-disk signature from current MBR",
            RestoreQuestion::ActiveFlagsDiffer => "Keep active partition as in current MBR",
            RestoreQuestion::VisibilityDiffers => "Keep visibility as in current MBR",
            RestoreQuestion::ConfirmRestore => "Yes",
            _ => KEEP_CURRENT_TABLE,
        }
    }

    pub fn second_option(&self) -> &'static str {
        match self {
            RestoreQuestion::MissingSignature => "Leave backup sector with no signature",
            RestoreQuestion::DiskSignatureDiffers => {
                "Overwrite hard-disk signature with the version from backup"
            }
            RestoreQuestion::ActiveFlagsDiffer => "Update active partition as in the backup",
            RestoreQuestion::VisibilityDiffers => "Update visibility as in the backup",
            RestoreQuestion::ConfirmRestore => "No",
            _ => RESTORE_WHOLE_MBR,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Choice {
    First,
    Second,
    Cancel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RestoreWarning {
    NoPartitions,
    NoActivePartition,
}

impl RestoreWarning {
    pub fn message(&self) -> &'static str {
        match self {
            RestoreWarning::NoPartitions => "No partitions have been found",
            RestoreWarning::NoActivePartition => {
                "No active (bootable) partitions have been found, the hard disk may not be bootable."
            }
        }
    }
}

/// Source of answers while reconciling a backup.
pub trait RestorePrompt {
    fn choose(&mut self, question: &RestoreQuestion) -> Choice;

    fn warn(&mut self, warning: RestoreWarning) {
        warn!("{}", warning.message());
    }
}

impl<F> RestorePrompt for F
where
    F: FnMut(&RestoreQuestion) -> Choice,
{
    fn choose(&mut self, question: &RestoreQuestion) -> Choice {
        self(question)
    }
}

/// Produces the sector to write back from `candidate`, asking about every
/// difference from `current` that could damage the disk.
pub fn reconcile_backup<P: RestorePrompt + ?Sized>(
    current: &SectorImage,
    candidate: &SectorImage,
    prompt: &mut P,
) -> Result<SectorImage, MbrError> {
    let mut result = candidate.clone();

    if !result.has_boot_signature() && ask(prompt, RestoreQuestion::MissingSignature)? {
        result.set_boot_signature();
    }

    if result.disk_signature() != current.disk_signature()
        && ask(prompt, RestoreQuestion::DiskSignatureDiffers)?
    {
        result.set_disk_signature(current.disk_signature());
    }

    let entries = result.partition_entries();
    if entries.iter().all(|e| e.is_empty()) {
        prompt.warn(RestoreWarning::NoPartitions);
    } else if !entries.iter().any(|e| e.is_active() && !e.is_empty()) {
        prompt.warn(RestoreWarning::NoActivePartition);
    }

    if result.partition_table() != current.partition_table() {
        reconcile_partition_table(current, &mut result, prompt)?;
    }

    match prompt.choose(&RestoreQuestion::ConfirmRestore) {
        Choice::First => Ok(result),
        _ => Err(MbrError::UserCancelled),
    }
}

fn reconcile_partition_table<P: RestorePrompt + ?Sized>(
    current: &SectorImage,
    result: &mut SectorImage,
    prompt: &mut P,
) -> Result<(), MbrError> {
    if (0..4).any(|slot| type_of(result, slot) == 0 && type_of(current, slot) != 0)
        && ask(prompt, RestoreQuestion::PartitionsAppeared)?
    {
        result.set_partition_table(current.partition_table());
    }

    if (0..4).any(|slot| type_of(current, slot) == 0 && type_of(result, slot) != 0)
        && ask(prompt, RestoreQuestion::PartitionsDisappeared)?
    {
        result.set_partition_table(current.partition_table());
    }

    let geometry_changed = (0..4).any(|slot| {
        let ours = result.entry_bytes(slot);
        let theirs = current.entry_bytes(slot);
        ours[4] != 0
            && theirs[4] != 0
            && (ours[1..4] != theirs[1..4] || ours[5..PARTITION_ENTRY_SIZE] != theirs[5..])
    });
    if geometry_changed {
        if ask(prompt, RestoreQuestion::GeometryDiffers)? {
            result.set_partition_table(current.partition_table());
        }
        return Ok(());
    }

    if (0..4).any(|slot| result.entry_bytes(slot)[0] & 0x80 != current.entry_bytes(slot)[0] & 0x80)
        && ask(prompt, RestoreQuestion::ActiveFlagsDiffer)?
    {
        for slot in 0..4 {
            result.entry_bytes_mut(slot)[0] = current.entry_bytes(slot)[0];
        }
    }

    let changed: Vec<usize> = (0..4)
        .filter(|&slot| type_of(result, slot) != type_of(current, slot))
        .collect();
    if changed.is_empty() {
        return Ok(());
    }

    let visibility_only = changed
        .iter()
        .any(|&slot| only_visibility_differs(type_of(result, slot), type_of(current, slot)));
    if visibility_only {
        if ask(prompt, RestoreQuestion::VisibilityDiffers)? {
            for slot in 0..4 {
                result.entry_bytes_mut(slot)[4] = type_of(current, slot);
            }
        }
    } else if ask(prompt, RestoreQuestion::PartitionTypesDiffer)? {
        result.set_partition_table(current.partition_table());
    }
    Ok(())
}

fn type_of(sector: &SectorImage, slot: usize) -> u8 {
    sector.entry_bytes(slot)[4]
}

fn only_visibility_differs(a: u8, b: u8) -> bool {
    let (a, b) = (a & HIDDEN_BIT_MASK, b & HIDDEN_BIT_MASK);
    a == b && HIDEABLE_TYPES.contains(&a)
}

/// `Ok(true)` keeps the current value, `Ok(false)` keeps the backup's.
fn ask<P: RestorePrompt + ?Sized>(prompt: &mut P, question: RestoreQuestion) -> Result<bool, MbrError> {
    let choice = prompt.choose(&question);
    debug!("{:?}: {:?}", question, choice);
    match choice {
        Choice::First => Ok(true),
        Choice::Second => Ok(false),
        Choice::Cancel => Err(MbrError::UserCancelled),
    }
}
