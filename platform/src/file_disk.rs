use log::debug;
use mbrkit_core::sector::{SectorImage, SECTOR_SIZE};
use mbrkit_core::{MbrError, SectorDevice};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

/// Sector access to a raw disk device or a disk image file.
///
/// On Linux this is `/dev/sdX`, on Windows `\\.\PhysicalDriveN`; any regular
/// file works the same way.
#[derive(Debug)]
pub struct FileDisk {
    file: File,
    path: PathBuf,
    mode: AccessMode,
}

impl FileDisk {
    pub fn open(path: impl AsRef<Path>, mode: AccessMode) -> Result<Self, MbrError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(mode == AccessMode::ReadWrite)
            .open(path)
            .map_err(|e| with_path(e, path))?;
        debug!("Opened {} ({:?})", path.display(), mode);
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode,
        })
    }

    /// Creates a zero-filled image of `sector_count` sectors.
    pub fn create_image(path: impl AsRef<Path>, sector_count: u64) -> Result<Self, MbrError> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .map_err(|e| with_path(e, path))?;
        file.set_len(sector_count * SECTOR_SIZE as u64)?;
        Ok(Self {
            file,
            path: path.to_path_buf(),
            mode: AccessMode::ReadWrite,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> AccessMode {
        self.mode
    }

    fn seek_to(&mut self, sector: u64) -> Result<(), MbrError> {
        let offset = sector
            .checked_mul(SECTOR_SIZE as u64)
            .ok_or_else(|| MbrError::InvalidInput(format!("sector {} is out of range", sector)))?;
        self.file.seek(SeekFrom::Start(offset))?;
        Ok(())
    }
}

impl SectorDevice for FileDisk {
    fn read_sector(&mut self, sector: u64) -> Result<SectorImage, MbrError> {
        self.seek_to(sector)?;
        let mut buffer = [0u8; SECTOR_SIZE];
        self.file.read_exact(&mut buffer).map_err(|e| {
            io::Error::new(
                e.kind(),
                format!("cannot read sector {} of {}: {}", sector, self.path.display(), e),
            )
        })?;
        Ok(SectorImage::from(buffer))
    }

    fn write_sector(&mut self, sector: u64, image: &SectorImage) -> Result<(), MbrError> {
        if self.mode == AccessMode::ReadOnly {
            return Err(MbrError::IoError(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is opened read-only", self.path.display()),
            )));
        }
        self.seek_to(sector)?;
        self.file.write_all(image.as_bytes())?;
        self.file.flush()?;
        self.file.sync_data()?;
        debug!("Wrote sector {} of {}", sector, self.path.display());
        Ok(())
    }
}

/// Reads a single-sector backup file, which must be exactly 512 bytes.
pub fn read_sector_file(path: impl AsRef<Path>) -> Result<SectorImage, MbrError> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| with_path(e, path))?;
    SectorImage::from_bytes(&bytes)
}

pub fn write_sector_file(path: impl AsRef<Path>, image: &SectorImage) -> Result<(), MbrError> {
    let path = path.as_ref();
    let mut file = File::create(path).map_err(|e| with_path(e, path))?;
    file.write_all(image.as_bytes())?;
    file.flush()?;
    debug!("Saved sector to {}", path.display());
    Ok(())
}

fn with_path(e: io::Error, path: &Path) -> MbrError {
    if e.kind() == io::ErrorKind::NotFound {
        MbrError::DeviceNotFound(path.display().to_string())
    } else {
        MbrError::IoError(io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_past_end_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut disk = FileDisk::create_image(dir.path().join("disk.img"), 2).unwrap();
        assert!(disk.read_sector(1).is_ok());
        assert!(matches!(disk.read_sector(2), Err(MbrError::IoError(_))));
    }

    #[test]
    fn test_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileDisk::open(dir.path().join("nope"), AccessMode::ReadOnly).unwrap_err();
        assert!(matches!(err, MbrError::DeviceNotFound(_)));
    }
}
