//! Privilege checking for system installation.
//!
//! Writing into /usr/local/bin and opening raw block devices both require
//! root, so the same gate serves the installer and the imager.

use super::error::InstallerError;

/// Check that the current process runs with an effective uid of 0.
pub fn check_root() -> Result<(), InstallerError> {
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        return Err(InstallerError::PermissionDenied);
    }
    Ok(())
}

/// Re-invocation hint for a failed privilege check, with the original
/// command line quoted safely for reuse.
pub fn sudo_hint() -> String {
    let invocation = std::env::args()
        .map(|arg| shell_quote(&arg))
        .collect::<Vec<_>>()
        .join(" ");
    format!("try: sudo {invocation}")
}

/// Quote a single argument for POSIX sh.
fn shell_quote(arg: &str) -> String {
    if !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:".contains(c))
    {
        return arg.to_string();
    }
    format!("'{}'", arg.replace('\'', r"'\''"))
}
