//! Streaming byte transfer: HTTP downloads and raw device writes.

use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::io::AsyncWriteExt;
use tokio::time::timeout;

/// Buffer size for blocking image copies, matching the cache hasher.
pub const COPY_BUF_SIZE: usize = 40_960;

const DOWNLOAD_CONNECT_TIMEOUT: Duration = Duration::from_secs(30); // Initial connection
const DOWNLOAD_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(300); // 5 min no data

/// Style for byte-oriented progress bars.
pub fn bytes_style() -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template("   [{bar:50.green/blue}] {bytes}/{total_bytes} {bytes_per_sec} eta {eta}  {msg}")
        .context("Invalid progress bar template")?
        .progress_chars("█▓░"))
}

/// Download `url` into `dest`, streaming chunks with inactivity detection.
pub async fn download_to_file(url: &str, dest: &Path, pb: &ProgressBar) -> Result<()> {
    let client = reqwest::Client::builder()
        .connect_timeout(DOWNLOAD_CONNECT_TIMEOUT)
        .user_agent(concat!("imagine-pi/", env!("CARGO_PKG_VERSION")))
        .build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("request {url}"))?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "download failed: HTTP {} for {url}",
            response.status()
        ));
    }
    if let Some(len) = response.content_length() {
        pb.set_length(len);
    }

    let mut file = tokio::fs::File::create(dest)
        .await
        .with_context(|| format!("create {}", dest.display()))?;
    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;

    loop {
        // Wrap stream.next() with a timeout so a stalled mirror surfaces as
        // an error instead of hanging the run.
        let chunk = match timeout(DOWNLOAD_INACTIVITY_TIMEOUT, stream.next()).await {
            Ok(Some(Ok(chunk))) => chunk,
            Ok(Some(Err(e))) => return Err(e.into()),
            Ok(None) => break, // Stream ended normally
            Err(_) => {
                return Err(anyhow!(
                    "download timeout: no data received for {} seconds after {} bytes of {url}",
                    DOWNLOAD_INACTIVITY_TIMEOUT.as_secs(),
                    downloaded
                ));
            }
        };

        file.write_all(&chunk).await?;
        downloaded += chunk.len() as u64;
        pb.set_position(downloaded);
    }

    file.flush().await?;
    Ok(())
}

/// Stream a raw image onto a block device, then flush and sync. Blocking;
/// callers wrap this in `spawn_blocking`.
pub fn write_image_to_device(image: &Path, device: &Path, pb: &ProgressBar) -> Result<()> {
    let mut src =
        std::fs::File::open(image).with_context(|| format!("open {}", image.display()))?;
    pb.set_length(src.metadata().context("read image metadata")?.len());

    let mut dst = std::fs::OpenOptions::new()
        .write(true)
        .open(device)
        .with_context(|| format!("open {} for writing", device.display()))?;

    let mut buf = vec![0u8; COPY_BUF_SIZE];
    let mut written: u64 = 0;
    loop {
        let n = src.read(&mut buf).context("read image")?;
        if n == 0 {
            break;
        }
        dst.write_all(&buf[..n])
            .with_context(|| format!("write to {}", device.display()))?;
        written += n as u64;
        pb.set_position(written);
    }

    dst.flush().context("flush device")?;
    dst.sync_all()
        .with_context(|| format!("sync {}", device.display()))?;
    // Flush kernel buffers before declaring the device safe to remove.
    unsafe { libc::sync() };
    Ok(())
}
