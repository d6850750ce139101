use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "console raspberry pi imager")]
pub struct Args {
    /// Path to configuration file
    #[arg(long, short = 'c', global = true)]
    pub config: Option<String>,

    /// Sub‑commands (write, install)
    #[command(subcommand)]
    pub sub: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Interactive imaging session (default if no sub‑command)
    Write,
    /// Install the imager into the system binary directory (requires root)
    Install {
        /// Source binary to install (defaults to the running executable)
        #[arg(long)]
        binary: Option<PathBuf>,

        /// Show what would be done without doing it
        #[arg(long)]
        dry_run: bool,
    },
}
