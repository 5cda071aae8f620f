use crate::layout::{Field, MENU_TEXT_OFFSET};
use crate::sector::{SectorImage, SECTOR_SIZE};
use crate::MbrError;
use std::fs;
use std::path::Path;
use tracing::debug;

/// The pristine boot loader image that configurations are patched into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    image: SectorImage,
}

impl Template {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, MbrError> {
        if bytes.len() != SECTOR_SIZE {
            return Err(MbrError::InvalidInput(format!(
                "boot loader template must be exactly {} bytes, got {}",
                SECTOR_SIZE,
                bytes.len()
            )));
        }
        let image = SectorImage::from_bytes(bytes)?;
        if !image.has_boot_signature() {
            return Err(MbrError::InvalidInput(
                "boot loader template has no 0x55AA signature".to_string(),
            ));
        }
        Ok(Self { image })
    }

    pub fn load(path: &Path) -> Result<Self, MbrError> {
        debug!("Loading boot loader template from {}", path.display());
        let bytes = fs::read(path)?;
        Self::from_bytes(&bytes)
    }

    pub fn image(&self) -> &SectorImage {
        &self.image
    }

    pub fn byte(&self, offset: usize) -> u8 {
        self.image.as_bytes()[offset]
    }

    /// Template bytes occupying `field`.
    pub fn field(&self, field: Field) -> &[u8] {
        &self.image.as_bytes()[field.range()]
    }

    /// Loader code, i.e. everything before the menu text.
    pub fn code(&self) -> &[u8] {
        &self.image.as_bytes()[..MENU_TEXT_OFFSET]
    }
}
