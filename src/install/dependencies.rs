//! Prerequisite checks for the tools the installed imager shells out to.
//!
//! The installer never invokes these itself; their presence is validated for
//! the benefit of the installed program, and a missing tool aborts before
//! any filesystem mutation.

use which::which;

use super::error::InstallerError;

/// External executables the imager requires at runtime.
pub const REQUIRED_TOOLS: &[&str] = &["lsblk"];

/// Verify every required tool resolves on the search path.
pub fn check_dependencies() -> Result<(), InstallerError> {
    check_tools(REQUIRED_TOOLS)
}

fn check_tools(tools: &[&str]) -> Result<(), InstallerError> {
    for tool in tools {
        if which(tool).is_err() {
            return Err(InstallerError::MissingDependency((*tool).to_string()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn present_tool_passes() {
        check_tools(&["sh"]).unwrap();
    }

    #[test]
    fn missing_tool_is_named_in_the_error() {
        let err = check_tools(&["sh", "no-such-tool-0b1ad"]).unwrap_err();
        assert!(err.to_string().contains("no-such-tool-0b1ad"));
    }
}
