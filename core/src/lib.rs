pub mod charset;
pub mod codec;
pub mod config;
pub mod describe;
pub mod device;
pub mod error;
pub mod install;
pub mod layout;
pub mod menu;
pub mod partition_types;
pub mod reconcile;
pub mod scanner;
pub mod sector;
pub mod template;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod track;

pub use codec::{decode, encode, encode_onto, DecodeReport, DecodeWarning};
pub use config::{BootEntry, Configuration, KeyMode, ProgressBar, TimedBoot, TimerKey, TimerMode};
pub use device::{Device, DeviceManager, DeviceType, SectorDevice};
pub use error::{DecodeError, MbrError};
pub use install::{decode_existing, InstallManager, InstallPlan};
pub use menu::{build_menu_text, MenuText};
pub use reconcile::{reconcile_backup, Choice, RestorePrompt, RestoreQuestion, RestoreWarning};
pub use scanner::{scan, DiscoveredPartition, ScanReport, ScanWarning};
pub use sector::SectorImage;
pub use template::Template;
