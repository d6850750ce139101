//! Image extraction from downloaded archives.
//!
//! The catalog serves images as .zip, .xz, or .gz archives; each is decoded
//! to a raw .img in the image cache. Callers run this off the async runtime.

use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use flate2::read::GzDecoder;
use indicatif::ProgressBar;
use xz2::read::XzDecoder;

use super::transfer::COPY_BUF_SIZE;

/// Decode `archive` into a raw image at `image_path`, reporting decompressed
/// bytes on `pb`.
pub fn extract_image(archive: &Path, image_path: &Path, pb: &ProgressBar) -> Result<()> {
    let ext = archive
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default();

    match ext {
        "zip" => extract_zip(archive, image_path, pb),
        // Some catalog entries serve the raw image uncompressed.
        "img" => {
            let mut file =
                fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
            copy_with_progress(&mut file, image_path, pb)
        }
        "xz" => {
            let file =
                fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
            copy_with_progress(&mut XzDecoder::new(file), image_path, pb)
        }
        "gz" => {
            let file =
                fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
            copy_with_progress(&mut GzDecoder::new(file), image_path, pb)
        }
        other => Err(anyhow!(
            "unsupported archive type `.{other}` for {}",
            archive.display()
        )),
    }
}

fn extract_zip(archive: &Path, image_path: &Path, pb: &ProgressBar) -> Result<()> {
    let file = fs::File::open(archive).with_context(|| format!("open {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).context("read zip archive")?;

    let member_name = zip
        .file_names()
        .find(|name| name.ends_with(".img"))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("no .img member in {}", archive.display()))?;

    let mut member = zip
        .by_name(&member_name)
        .with_context(|| format!("open zip member {member_name}"))?;
    copy_with_progress(&mut member, image_path, pb)
}

fn copy_with_progress(reader: &mut dyn Read, dest: &Path, pb: &ProgressBar) -> Result<()> {
    let mut out = fs::File::create(dest).with_context(|| format!("create {}", dest.display()))?;
    let mut buf = vec![0u8; COPY_BUF_SIZE];
    loop {
        let n = reader.read(&mut buf).context("read archive data")?;
        if n == 0 {
            break;
        }
        out.write_all(&buf[..n]).context("write image data")?;
        pb.inc(n as u64);
    }
    out.flush()?;
    Ok(())
}
