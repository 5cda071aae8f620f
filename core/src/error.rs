use thiserror::Error;

#[derive(Debug, Error)]
pub enum MbrError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Precondition violation: {0}")]
    PreconditionViolation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Magic number 0xAA55 is not found in sector {sector}")]
    MissingSignature { sector: u64 },

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Operation cancelled by user")]
    UserCancelled,

    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(String),
}

/// Reasons an existing sector could not be read back as a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The sector holds some other boot code, or nothing at all.
    #[error("Boot loader is not installed: {0}")]
    NotOurLoader(String),

    /// Our loader is present but one of its parameters is out of range.
    #[error("Boot loader parameters are corrupt: {0}")]
    Corrupt(String),

    #[error("Significance mask is corrupt at offset 0x{offset:03X} (value 0x{value:02X})")]
    InvalidMask { offset: usize, value: u8 },
}

impl DecodeError {
    /// A broken mask means the program itself is damaged, not the disk.
    pub fn is_fatal(&self) -> bool {
        matches!(self, DecodeError::InvalidMask { .. })
    }
}
