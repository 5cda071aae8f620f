use log::{debug, warn};
use mbrkit_core::{Device, DeviceManager, DeviceType, MbrError};
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

pub struct LinuxDeviceManager;

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

/// One row of `lsblk -J`. Older util-linux prints numbers and flags as
/// strings, so those columns stay loosely typed.
#[derive(Debug, Deserialize)]
pub(crate) struct LsblkDevice {
    name: String,
    #[serde(default)]
    size: Value,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    rm: Value,
}

fn value_as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn value_as_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_u64().map(|n| n == 1),
        Value::String(s) => Some(s.trim() == "1"),
        _ => None,
    }
}

pub(crate) fn parse_lsblk_json(json: &str) -> Result<Vec<LsblkDevice>, MbrError> {
    let output: LsblkOutput = serde_json::from_str(json)?;
    Ok(output
        .blockdevices
        .into_iter()
        .filter(|d| d.kind.as_deref().map_or(true, |k| k == "disk"))
        .collect())
}

impl LinuxDeviceManager {
    fn is_removable(device_name: &str) -> bool {
        let removable_path = format!("/sys/block/{}/removable", device_name);
        fs::read_to_string(removable_path)
            .map(|content| content.trim() == "1")
            .unwrap_or(false)
    }

    fn get_device_type(device_name: &str, is_removable: bool) -> DeviceType {
        if device_name.starts_with("loop") {
            return DeviceType::Virtual;
        }
        if is_removable {
            if device_name.starts_with("mmcblk") {
                return DeviceType::SDCard;
            }
            return DeviceType::USB;
        }

        let rotational_path = format!("/sys/block/{}/queue/rotational", device_name);
        let is_rotational = fs::read_to_string(rotational_path)
            .map(|content| content.trim() == "1")
            .unwrap_or(true);

        if is_rotational {
            DeviceType::HardDisk
        } else {
            DeviceType::SSD
        }
    }

    fn get_mount_points(device_path: &str) -> Vec<PathBuf> {
        let mut mount_points = Vec::new();

        if let Ok(mounts) = fs::read_to_string("/proc/mounts") {
            for line in mounts.lines() {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 2 && parts[0].starts_with(device_path) {
                    mount_points.push(PathBuf::from(parts[1]));
                }
            }
        }

        mount_points
    }

    /// The disk the running system boots from.
    fn is_system_disk(device_path: &str, mount_points: &[PathBuf]) -> bool {
        for mount in mount_points {
            let path_str = mount.to_string_lossy();
            if path_str == "/" || path_str == "/boot" || path_str == "/boot/efi" {
                return true;
            }
        }

        if let Ok(cmdline) = fs::read_to_string("/proc/cmdline") {
            if cmdline.contains(device_path) {
                return true;
            }
        }

        false
    }

    fn get_device_model(device_name: &str) -> String {
        let model_path = format!("/sys/block/{}/device/model", device_name);
        if let Ok(model) = fs::read_to_string(model_path) {
            return model.trim().to_string();
        }

        let vendor_path = format!("/sys/block/{}/device/vendor", device_name);
        if let Ok(vendor) = fs::read_to_string(vendor_path) {
            return vendor.trim().to_string();
        }

        device_name.to_uppercase()
    }

    fn build_device(name: &str, size: u64, model: Option<String>, removable: Option<bool>) -> Device {
        let device_path = format!("/dev/{}", name);
        let mount_points = Self::get_mount_points(&device_path);
        let is_system = Self::is_system_disk(&device_path, &mount_points);
        let is_removable = removable.unwrap_or_else(|| Self::is_removable(name));
        let model = model
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| Self::get_device_model(name));

        Device {
            id: device_path,
            name: format!("{} ({})", model, name),
            size,
            device_type: Self::get_device_type(name, is_removable),
            mount_points,
            is_removable,
            is_system,
        }
    }

    fn enumerate_with_lsblk(&self) -> Result<Vec<Device>, MbrError> {
        let lsblk = which::which("lsblk")
            .map_err(|e| MbrError::Other(format!("lsblk is not available: {}", e)))?;
        let output = Command::new(lsblk)
            .args(["-J", "-b", "-d", "-o", "NAME,SIZE,TYPE,MODEL,RM"])
            .output()
            .map_err(|e| MbrError::Other(format!("Failed to run lsblk: {}", e)))?;

        if !output.status.success() {
            return Err(MbrError::Other("lsblk command failed".to_string()));
        }

        let rows = parse_lsblk_json(&String::from_utf8_lossy(&output.stdout))?;
        let mut devices: Vec<Device> = rows
            .into_iter()
            .map(|row| {
                Self::build_device(
                    &row.name,
                    value_as_u64(&row.size).unwrap_or(0),
                    row.model,
                    value_as_flag(&row.rm),
                )
            })
            .collect();

        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }

    fn enumerate_from_sysfs(&self) -> Result<Vec<Device>, MbrError> {
        let sys_block = Path::new("/sys/block");
        if !sys_block.exists() {
            return Err(MbrError::Other("Cannot access /sys/block".to_string()));
        }

        let mut devices = Vec::new();
        for entry in fs::read_dir(sys_block)? {
            let device_name = entry?.file_name().to_string_lossy().to_string();
            if device_name.starts_with("loop") || device_name.starts_with("ram") {
                continue;
            }

            // /sys/block/<dev>/size is always in 512-byte units.
            let size = fs::read_to_string(format!("/sys/block/{}/size", device_name))
                .ok()
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(0)
                * 512;
            if size == 0 {
                continue;
            }

            devices.push(Self::build_device(&device_name, size, None, None));
        }

        devices.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(devices)
    }
}

impl DeviceManager for LinuxDeviceManager {
    fn enumerate_devices(&self) -> Result<Vec<Device>, MbrError> {
        match self.enumerate_with_lsblk() {
            Ok(devices) if !devices.is_empty() => return Ok(devices),
            Ok(_) => debug!("lsblk reported no disks, falling back to /sys/block"),
            Err(e) => warn!("{}, falling back to /sys/block", e),
        }
        self.enumerate_from_sysfs()
    }
}

/// Whether the current user may open raw disks for writing.
pub fn has_raw_disk_access() -> bool {
    if nix::unistd::geteuid().is_root() {
        return true;
    }

    let disk_gid = match nix::unistd::Group::from_name("disk") {
        Ok(Some(group)) => group.gid,
        _ => return false,
    };
    nix::unistd::getgroups()
        .map(|groups| groups.contains(&disk_gid))
        .unwrap_or(false)
}
