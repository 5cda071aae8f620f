//! Inspection of the first track, where backups and chainloaded code live.

use crate::device::SectorDevice;
use crate::MbrError;
use std::fmt;
use tracing::debug;

/// Sectors 0..FIRST_TRACK_SECTORS make up the first track.
pub const FIRST_TRACK_SECTORS: u64 = 63;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectorKind {
    /// Entirely zero.
    Blank,
    /// Ends with 0x55AA.
    Signed,
}

/// Sector numbers on the first track matching `kind`.
pub fn first_track_sectors<D: SectorDevice + ?Sized>(
    disk: &mut D,
    kind: SectorKind,
) -> Result<Vec<u64>, MbrError> {
    let mut matching = Vec::new();
    for number in 0..FIRST_TRACK_SECTORS {
        let sector = disk.read_sector(number)?;
        let matches = match kind {
            SectorKind::Blank => sector.is_blank(),
            SectorKind::Signed => sector.has_boot_signature(),
        };
        if matches {
            matching.push(number);
        }
    }
    debug!("{} {:?} sectors on the first track", matching.len(), kind);
    Ok(matching)
}

/// Lists first-track sectors matching `kind` as "1, 2, 5-9".
pub fn summarize_first_track<D: SectorDevice + ?Sized>(
    disk: &mut D,
    kind: SectorKind,
) -> Result<String, MbrError> {
    Ok(format_ranges(&first_track_sectors(disk, kind)?))
}

/// Collapses ascending sector numbers into ranges. Runs of two are spelled out.
pub fn format_ranges(numbers: &[u64]) -> String {
    SectorRanges(numbers).to_string()
}

/// Displays ascending sector numbers as "1, 2, 5-9".
pub struct SectorRanges<'a>(pub &'a [u64]);

impl fmt::Display for SectorRanges<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let numbers = self.0;
        let mut i = 0;
        while i < numbers.len() {
            let start = numbers[i];
            let mut end = start;
            while i + 1 < numbers.len() && numbers[i + 1] == end + 1 {
                end += 1;
                i += 1;
            }
            if start != numbers[0] {
                write!(f, ", ")?;
            }
            match end - start {
                0 => write!(f, "{}", start)?,
                1 => write!(f, "{}, {}", start, end)?,
                _ => write!(f, "{}-{}", start, end)?,
            }
            i += 1;
        }
        Ok(())
    }
}
