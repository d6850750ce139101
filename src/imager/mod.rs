//! Interactive imaging flow.
//!
//! Linear pipeline: catalog → menus → cache check → download → extract →
//! write. The cache is consulted before every network or decode step, so
//! re-imaging the same OS goes straight to the device write.

mod cache;
mod catalog;
mod disks;
mod extract;
mod menu;
mod transfer;

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use indicatif::ProgressBar;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::config::ImagerConfig;
use crate::install;

use cache::CacheLayout;
use catalog::OsEntry;
use disks::BlockDevice;

/// Run one interactive imaging session.
pub async fn run(config: &ImagerConfig) -> Result<()> {
    if let Err(err) = install::check_root() {
        let mut stderr = StandardStream::stderr(ColorChoice::Always);
        let _ = stderr.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
        let _ = writeln!(stderr, "❌ {err}");
        let _ = stderr.reset();
        return Err(err.into());
    }

    let layout = CacheLayout::new(&config.cache_dir);
    layout.ensure()?;

    show_banner();

    log::info!("Fetching OS catalog from {}", config.os_list_url);
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Fetching OS catalog...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    let entries = catalog::fetch_catalog(&config.os_list_url).await?;
    spinner.finish_and_clear();

    let selected_os = menu::select_os(&entries)?;

    let devices = disks::selectable_devices().await?;
    if devices.is_empty() {
        let mut stdout = StandardStream::stdout(ColorChoice::Always);
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(
            stdout,
            "No storage devices without mounts available to image"
        );
        let _ = stdout.reset();
        return Ok(());
    }
    let device = menu::select_device(&devices)?;

    if !menu::confirm_install(&selected_os.name, &device.name)? {
        println!("Imaging aborted");
        return Ok(());
    }

    println!(
        "\nInstalling\n - {}\non device\n - {}\n",
        selected_os.name, device.name
    );
    run_imaging(&layout, &selected_os, &device).await
}

async fn run_imaging(layout: &CacheLayout, os: &OsEntry, device: &BlockDevice) -> Result<()> {
    let url = os.image_url()?.to_string();
    let plan = plan_paths(layout, &url)?;

    println!(" - retrieving image");

    let image_ready = match &os.extract_sha256 {
        Some(expected) => {
            println!("    - checking cache");
            digest_matches(plan.image_path.clone(), expected.clone()).await?
        }
        None => false,
    };

    if image_ready {
        say_ok(" ✔ image available [cache]");
    } else {
        let archive_cached = match &os.image_download_sha256 {
            Some(expected) => {
                println!("    - checking download cache");
                digest_matches(plan.archive_path.clone(), expected.clone()).await?
            }
            None => false,
        };

        if archive_cached {
            say_ok("    ✔ image archive available [cache]");
        } else {
            println!("      downloading image archive");
            let pb = ProgressBar::new(0);
            pb.set_style(transfer::bytes_style()?);
            transfer::download_to_file(&url, &plan.archive_path, &pb).await?;
            pb.finish_and_clear();

            if let Some(expected) = &os.image_download_sha256
                && !digest_matches(plan.archive_path.clone(), expected.clone()).await?
            {
                return Err(anyhow!("downloaded archive failed sha256 validation"));
            }
            say_ok("    ✔ image archive available [download]");
        }

        println!("    - extracting image from archive");
        let pb = ProgressBar::new(os.extract_size.unwrap_or(0));
        pb.set_style(transfer::bytes_style()?);
        {
            let archive = plan.archive_path.clone();
            let image = plan.image_path.clone();
            let pb = pb.clone();
            tokio::task::spawn_blocking(move || extract::extract_image(&archive, &image, &pb))
                .await
                .context("extraction task failed")??;
        }
        pb.finish_and_clear();

        if let Some(expected) = &os.extract_sha256
            && !digest_matches(plan.image_path.clone(), expected.clone()).await?
        {
            return Err(anyhow!("extracted image failed sha256 validation"));
        }
        say_ok("    ✔ image available [archive]");
    }

    println!(" - writing {} to {}", os.name, device.name);
    let pb = ProgressBar::new(0);
    pb.set_style(transfer::bytes_style()?);
    {
        let image = plan.image_path.clone();
        let target = device.device_path();
        let pb = pb.clone();
        tokio::task::spawn_blocking(move || transfer::write_image_to_device(&image, &target, &pb))
            .await
            .context("device write task failed")??;
    }
    pb.finish_and_clear();

    say_ok(&format!(
        " ✔ image {} installed on {}",
        os.name, device.name
    ));
    say_ok("success!");
    Ok(())
}

async fn digest_matches(path: PathBuf, expected: String) -> Result<bool> {
    tokio::task::spawn_blocking(move || cache::matches_digest(&path, &expected))
        .await
        .context("digest task failed")
}

fn show_banner() {
    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = writeln!(
        stdout,
        "\n──────────────────────────────────────────────────"
    );
    let _ = stdout.reset();
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "  Imagine PI - raspberry pi imager for console");
    let _ = stdout.reset();
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = writeln!(
        stdout,
        "──────────────────────────────────────────────────\n"
    );
    let _ = stdout.reset();
}

fn say_ok(line: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Always);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = writeln!(stdout, "{line}");
    let _ = stdout.reset();
}

struct ImagePlan {
    archive_path: PathBuf,
    image_path: PathBuf,
}

fn plan_paths(layout: &CacheLayout, url: &str) -> Result<ImagePlan> {
    let archive_name = url
        .rsplit('/')
        .next()
        .filter(|n| !n.is_empty())
        .ok_or_else(|| anyhow!("image url has no file name: {url}"))?;
    Ok(ImagePlan {
        archive_path: layout.download_dir.join(archive_name),
        image_path: layout.image_dir.join(image_name_for(archive_name)),
    })
}

/// `raspios.img.xz` → `raspios.img`; `raspios.zip` → `raspios.img`.
fn image_name_for(archive_name: &str) -> String {
    let stem = archive_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(archive_name);
    let stem = stem.strip_suffix(".img").unwrap_or(stem);
    format!("{stem}.img")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_names_map_to_img_names() {
        assert_eq!(image_name_for("raspios.img.xz"), "raspios.img");
        assert_eq!(image_name_for("raspios.img.gz"), "raspios.img");
        assert_eq!(image_name_for("raspios.zip"), "raspios.img");
        assert_eq!(image_name_for("raspios.img"), "raspios.img");
        assert_eq!(image_name_for("bare"), "bare.img");
    }

    #[test]
    fn plan_uses_cache_layout_dirs() {
        let layout = CacheLayout::new(std::path::Path::new("/var/tmp/imagine-pi"));
        let plan = plan_paths(&layout, "https://downloads.example/os/rpi.img.xz").unwrap();
        assert_eq!(
            plan.archive_path,
            PathBuf::from("/var/tmp/imagine-pi/download/rpi.img.xz")
        );
        assert_eq!(
            plan.image_path,
            PathBuf::from("/var/tmp/imagine-pi/images/rpi.img")
        );
    }

    #[test]
    fn urls_without_a_file_name_are_rejected() {
        let layout = CacheLayout::new(std::path::Path::new("/tmp"));
        assert!(plan_paths(&layout, "https://downloads.example/os/").is_err());
    }
}
