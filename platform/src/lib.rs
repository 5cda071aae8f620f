pub mod file_disk;

#[cfg(target_os = "linux")]
pub mod linux;

#[cfg(not(target_os = "linux"))]
pub mod fallback;

pub use file_disk::{read_sector_file, write_sector_file, AccessMode, FileDisk};

#[cfg(target_os = "linux")]
pub use linux::{has_raw_disk_access, LinuxDeviceManager as PlatformDeviceManager};

#[cfg(not(target_os = "linux"))]
pub use fallback::{has_raw_disk_access, FallbackDeviceManager as PlatformDeviceManager};
