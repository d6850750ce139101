//! Copying the imager binary into the system binary directory.
//!
//! A plain copy followed by a permission change, overwriting any previous
//! install. No backup, no rollback: a failed step leaves whatever the
//! filesystem holds and is reported with the real error.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use super::BINARY_NAME;
use super::error::InstallerError;

/// Copy `source` into `bin_dir` as the imagine-pi executable and set the
/// permission bits to 0o755. Returns the destination path.
pub fn install_binary(source: &Path, bin_dir: &Path) -> Result<PathBuf, InstallerError> {
    if !source.is_file() {
        return Err(InstallerError::SourceMissing(source.to_path_buf()));
    }

    fs::create_dir_all(bin_dir).map_err(|e| InstallerError::Step {
        step: "create bin directory",
        source: e,
    })?;

    let dest = bin_dir.join(BINARY_NAME);
    fs::copy(source, &dest).map_err(|e| InstallerError::Step {
        step: "copy binary",
        source: e,
    })?;

    let mut perms = fs::metadata(&dest)
        .map_err(|e| InstallerError::Step {
            step: "read destination metadata",
            source: e,
        })?
        .permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&dest, perms).map_err(|e| InstallerError::Step {
        step: "set permissions",
        source: e,
    })?;

    Ok(dest)
}
