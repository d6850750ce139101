//! Installation state detection.
//!
//! Determines whether an imagine-pi binary is already present in the system
//! binary directory. A prior install is overwritten, never repaired, so the
//! state only changes what the installer reports.

use std::path::Path;

use super::{BIN_DIR, BINARY_NAME};

/// Installation state enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallationState {
    /// No binary at the install path
    NotInstalled,
    /// A binary is present and will be replaced
    Installed,
}

/// Check the current installation state of the system binary directory.
pub fn check_installation_state() -> InstallationState {
    state_in(Path::new(BIN_DIR))
}

fn state_in(bin_dir: &Path) -> InstallationState {
    if bin_dir.join(BINARY_NAME).exists() {
        InstallationState::Installed
    } else {
        InstallationState::NotInstalled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_follows_destination_file() {
        let tmp = tempfile::tempdir().unwrap();
        assert_eq!(state_in(tmp.path()), InstallationState::NotInstalled);
        std::fs::write(tmp.path().join(BINARY_NAME), b"#!").unwrap();
        assert_eq!(state_in(tmp.path()), InstallationState::Installed);
    }
}
