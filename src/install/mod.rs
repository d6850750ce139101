//! System installation of the imagine-pi binary.
//!
//! The flow is a linear gate sequence: privilege check, prerequisite check,
//! then the copy/chmod install action. The gates abort before any
//! filesystem mutation; the install action overwrites blindly and reports
//! the real error of whichever step failed.

mod binary;
mod dependencies;
mod detection;
mod error;
mod privilege;

pub use binary::install_binary;
pub use dependencies::REQUIRED_TOOLS;
pub use error::InstallerError;
pub use privilege::check_root;

use std::io::Write;
use std::path::{Path, PathBuf};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use detection::InstallationState;

/// System binary directory the imager is installed into.
pub const BIN_DIR: &str = "/usr/local/bin";

/// Name of the installed executable.
pub const BINARY_NAME: &str = "imagine-pi";

/// Options for a single install run.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Source binary; the running executable when unset.
    pub binary: Option<PathBuf>,
    /// Show what would be done without doing it.
    pub dry_run: bool,
}

/// Run the non-interactive installer.
pub fn run_install(opts: &InstallOptions) -> Result<(), InstallerError> {
    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "🔧 Imagine PI Installation");
    let _ = stdout.reset();
    let _ = writeln!(stdout, "Platform: {}\n", std::env::consts::OS);

    if let Err(err) = privilege::check_root() {
        let mut stderr = StandardStream::stderr(ColorChoice::Always);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
        let _ = writeln!(stderr, "❌ {err}");
        let _ = stderr.reset();
        let _ = writeln!(stderr, "   {}", privilege::sudo_hint());
        return Err(err);
    }

    if let Err(err) = dependencies::check_dependencies() {
        let mut stderr = StandardStream::stderr(ColorChoice::Always);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
        let _ = writeln!(stderr, "❌ {err}");
        let _ = stderr.reset();
        let _ = writeln!(
            stderr,
            "   The installed imager needs it to enumerate block devices."
        );
        return Err(err);
    }

    let source = match &opts.binary {
        Some(path) => path.clone(),
        None => std::env::current_exe().map_err(|e| InstallerError::Step {
            step: "resolve current executable",
            source: e,
        })?,
    };
    let _ = writeln!(stdout, "📍 Source binary: {}", source.display());

    if detection::check_installation_state() == InstallationState::Installed {
        log::info!("Existing install found in {BIN_DIR}, overwriting");
        let _ = writeln!(stdout, "   Replacing existing {BIN_DIR}/{BINARY_NAME}");
    }

    if opts.dry_run {
        let _ = writeln!(
            stdout,
            "\nDry-run: would install {} to {BIN_DIR}/{BINARY_NAME}",
            source.display()
        );
        return Ok(());
    }

    match binary::install_binary(&source, Path::new(BIN_DIR)) {
        Ok(dest) => {
            let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
            let _ = writeln!(stdout, "\n✅ Installed {}", dest.display());
            let _ = stdout.reset();
            let _ = writeln!(stdout, "   Run `{BINARY_NAME}` as root to image a device.");
            Ok(())
        }
        Err(err) => {
            let mut stderr = StandardStream::stderr(ColorChoice::Always);
            let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
            let _ = writeln!(stderr, "\n❌ Installation failed: {err}");
            let _ = stderr.reset();
            if let InstallerError::Step { source, .. } = &err
                && let Some(code) = source.raw_os_error()
            {
                let _ = writeln!(stderr, "   exit code: {code}");
            }
            Err(err)
        }
    }
}
