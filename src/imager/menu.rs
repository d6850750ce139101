//! Terminal menus for OS and device selection.
//!
//! Group entries are suffixed so the operator can tell submenus from
//! installable images before descending. Aborting any prompt surfaces as an
//! error, before anything has been written.

use anyhow::{Result, anyhow};
use inquire::{Confirm, Select};

use super::catalog::OsEntry;
use super::disks::BlockDevice;

const PAGE_SIZE: usize = 20;

/// Walk the catalog tree until a concrete OS entry is chosen.
pub fn select_os(entries: &[OsEntry]) -> Result<OsEntry> {
    let mut current: Vec<OsEntry> = entries.to_vec();
    loop {
        let labels: Vec<String> = current.iter().map(entry_label).collect();
        let choice = Select::new("Select OS to install", labels.clone())
            .with_page_size(PAGE_SIZE)
            .prompt()
            .map_err(|e| anyhow!("OS selection aborted: {e}"))?;
        let idx = labels
            .iter()
            .position(|l| *l == choice)
            .ok_or_else(|| anyhow!("OS selection aborted"))?;

        let entry = current[idx].clone();
        if entry.is_group() {
            current = entry.subitems;
            continue;
        }
        return Ok(entry);
    }
}

fn entry_label(entry: &OsEntry) -> String {
    let mut label = match &entry.description {
        Some(description) => format!("{} - {}", entry.name, description),
        None => entry.name.clone(),
    };
    if entry.is_group() {
        label.push_str(" >>");
    }
    label
}

/// Pick the target device from the eligible list.
pub fn select_device(devices: &[BlockDevice]) -> Result<BlockDevice> {
    let labels: Vec<String> = devices.iter().map(BlockDevice::display_name).collect();
    let choice = Select::new("Select device to install OS on", labels.clone())
        .with_page_size(PAGE_SIZE)
        .prompt()
        .map_err(|e| anyhow!("Device selection aborted: {e}"))?;
    let idx = labels
        .iter()
        .position(|l| *l == choice)
        .ok_or_else(|| anyhow!("Device selection aborted"))?;
    Ok(devices[idx].clone())
}

/// Final confirmation naming both choices before any write happens.
pub fn confirm_install(os_name: &str, device_name: &str) -> Result<bool> {
    Confirm::new(&format!("Install {os_name} on /dev/{device_name}?"))
        .with_default(false)
        .with_help_message("Everything on the device will be overwritten")
        .prompt()
        .map_err(|e| anyhow!("Prompt cancelled: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, description: Option<&str>, subitems: Vec<OsEntry>) -> OsEntry {
        OsEntry {
            name: name.to_string(),
            description: description.map(str::to_string),
            url: None,
            extract_size: None,
            extract_sha256: None,
            image_download_sha256: None,
            subitems,
            subitems_url: None,
        }
    }

    #[test]
    fn group_entries_are_marked() {
        let group = entry("Other OS", None, vec![entry("Sub", None, Vec::new())]);
        assert_eq!(entry_label(&group), "Other OS >>");
    }

    #[test]
    fn descriptions_join_the_label() {
        let os = entry("Raspberry Pi OS", Some("A port of Debian"), Vec::new());
        assert_eq!(entry_label(&os), "Raspberry Pi OS - A port of Debian");
    }
}
