//! Block device discovery via lsblk.
//!
//! Only devices without a mounted filesystem (their own or a child
//! partition's) are offered as imaging targets.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use serde::Deserialize;

/// One device from the lsblk JSON report. Partitions appear as children.
#[derive(Debug, Clone, Deserialize)]
pub struct BlockDevice {
    pub name: String,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub mountpoint: Option<String>,
    #[serde(default)]
    pub children: Vec<BlockDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkReport {
    blockdevices: Vec<BlockDevice>,
}

impl BlockDevice {
    /// True when the device or any of its partitions is mounted.
    pub fn has_mounts(&self) -> bool {
        self.mountpoint.is_some() || self.children.iter().any(BlockDevice::has_mounts)
    }

    /// Raw device node for writing.
    pub fn device_path(&self) -> PathBuf {
        PathBuf::from(format!("/dev/{}", self.name))
    }

    /// Menu label: device name plus human-readable capacity.
    pub fn display_name(&self) -> String {
        match self.size {
            Some(size) => format!("{} ({})", self.name, human_size(size)),
            None => self.name.clone(),
        }
    }
}

/// List all block devices reported by `lsblk -J -O -b`.
pub async fn list_devices() -> Result<Vec<BlockDevice>> {
    let output = tokio::process::Command::new("lsblk")
        .args(["-J", "-O", "-b"])
        .output()
        .await
        .context("run lsblk")?;

    if !output.status.success() {
        return Err(anyhow!(
            "lsblk failed with exit code {:?}",
            output.status.code()
        ));
    }

    parse_lsblk(&output.stdout)
}

/// Devices eligible as imaging targets.
pub async fn selectable_devices() -> Result<Vec<BlockDevice>> {
    Ok(list_devices()
        .await?
        .into_iter()
        .filter(|d| !d.has_mounts())
        .collect())
}

fn parse_lsblk(raw: &[u8]) -> Result<Vec<BlockDevice>> {
    let report: LsblkReport = serde_json::from_slice(raw).context("parse lsblk JSON")?;
    Ok(report.blockdevices)
}

/// Format a byte count the way humans read storage sizes.
pub fn human_size(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit + 1 < UNITS.len() {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LSBLK_FIXTURE: &[u8] = br#"{
        "blockdevices": [
            {
                "name": "sda",
                "size": 512110190592,
                "mountpoint": null,
                "children": [
                    {"name": "sda1", "size": 536870912, "mountpoint": "/boot"},
                    {"name": "sda2", "size": 511571477504, "mountpoint": "/"}
                ]
            },
            {
                "name": "sdb",
                "size": 31914983424,
                "mountpoint": null
            }
        ]
    }"#;

    #[test]
    fn mounted_children_disqualify_the_parent() {
        let devices = parse_lsblk(LSBLK_FIXTURE).unwrap();
        assert!(devices[0].has_mounts());
        assert!(!devices[1].has_mounts());
    }

    #[test]
    fn display_name_includes_capacity() {
        let devices = parse_lsblk(LSBLK_FIXTURE).unwrap();
        assert_eq!(devices[1].display_name(), "sdb (29.7 GB)");
        assert_eq!(devices[1].device_path(), PathBuf::from("/dev/sdb"));
    }

    #[test]
    fn human_size_steps_through_units() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(512), "512 B");
        assert_eq!(human_size(2048), "2.0 KB");
        assert_eq!(human_size(1_048_576), "1.0 MB");
        assert_eq!(human_size(31_914_983_424), "29.7 GB");
    }
}
