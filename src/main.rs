mod cli;
mod config;
mod imager;
mod install;

use clap::Parser;
use log::error;

fn main() {
    // Initialize logger with timestamp/level/location format
    env_logger::Builder::from_default_env()
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "[{} {} {}:{}] {}",
                buf.timestamp_millis(),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .filter_level(log::LevelFilter::Info)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    let code = rt.block_on(real_main());
    std::process::exit(code);
}

async fn real_main() -> i32 {
    let args = cli::Args::parse();

    match args.sub.unwrap_or(cli::Cmd::Write) {
        cli::Cmd::Write => {
            let cfg = match config::config_path(args.config.as_deref())
                .and_then(|path| config::load_or_create(&path))
            {
                Ok(cfg) => cfg,
                Err(e) => {
                    error!("{e:#}");
                    return 1;
                }
            };
            match imager::run(&cfg).await {
                Ok(()) => 0,
                Err(e) => {
                    error!("{e:#}");
                    1
                }
            }
        }
        cli::Cmd::Install { binary, dry_run } => {
            let opts = install::InstallOptions { binary, dry_run };
            match install::run_install(&opts) {
                Ok(()) => 0,
                Err(e) => {
                    error!("{e:#}");
                    e.exit_code()
                }
            }
        }
    }
}
