pub mod device;

pub use device::{has_raw_disk_access, LinuxDeviceManager};
