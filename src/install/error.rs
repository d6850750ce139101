//! Error taxonomy for the system installer.
//!
//! Three terminal failure classes: insufficient privilege, a missing
//! prerequisite executable, and a failed install step. None are retried.
//! The first two are detected before any filesystem mutation.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("imagine-pi must be run as root")]
    PermissionDenied,

    #[error("required tool `{0}` was not found on the search path")]
    MissingDependency(String),

    #[error("source binary not found: {0}")]
    SourceMissing(PathBuf),

    #[error("{step} failed: {source}")]
    Step {
        step: &'static str,
        #[source]
        source: std::io::Error,
    },
}

impl InstallerError {
    /// Process exit status for this failure. Install-step errors surface the
    /// OS error code of the failed copy or permission change so scripts see
    /// the real status rather than a synthetic one.
    pub fn exit_code(&self) -> i32 {
        match self {
            InstallerError::Step { source, .. } => source.raw_os_error().unwrap_or(1),
            _ => 1,
        }
    }
}
