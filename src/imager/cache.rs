//! Download and image cache with sha256 sidecar manifests.
//!
//! Each cached file gets a hidden sidecar recording its digest and mtime,
//! sealed with a second digest. A sidecar whose seal fails or whose recorded
//! mtime no longer matches the file is treated as absent and the file is
//! re-hashed.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const HASH_BUF_SIZE: usize = 40_960;

/// Cache directory layout under the configured cache root.
#[derive(Debug, Clone)]
pub struct CacheLayout {
    pub download_dir: PathBuf,
    pub image_dir: PathBuf,
}

impl CacheLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            download_dir: root.join("download"),
            image_dir: root.join("images"),
        }
    }

    /// Create the cache directories if missing.
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.download_dir)
            .with_context(|| format!("create {}", self.download_dir.display()))?;
        fs::create_dir_all(&self.image_dir)
            .with_context(|| format!("create {}", self.image_dir.display()))?;
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Sidecar {
    sha256: String,
    mtime: u64,
    seal: String,
}

impl Sidecar {
    fn sealed(sha256: String, mtime: u64) -> Self {
        let seal = seal_digest(&sha256, mtime);
        Self {
            sha256,
            mtime,
            seal,
        }
    }

    fn is_valid(&self) -> bool {
        self.seal == seal_digest(&self.sha256, self.mtime)
    }
}

fn seal_digest(sha256: &str, mtime: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(sha256.as_bytes());
    hasher.update(mtime.to_le_bytes());
    hex::encode(hasher.finalize())
}

fn sidecar_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    target.with_file_name(format!(".{name}.sha256"))
}

fn file_mtime_unix(path: &Path) -> Result<u64> {
    let mtime = fs::metadata(path)?.modified()?;
    Ok(mtime.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs())
}

/// sha256 of a file, streamed in fixed-size buffers.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file = fs::File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = vec![0u8; HASH_BUF_SIZE];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Digest of a cached file, trusting the sidecar only while it verifies.
/// Recomputes the digest and rewrites the sidecar otherwise.
pub fn cached_digest(path: &Path) -> Result<String> {
    let mtime = file_mtime_unix(path)?;
    let sidecar = sidecar_path(path);

    if let Ok(raw) = fs::read(&sidecar)
        && let Ok(stored) = serde_json::from_slice::<Sidecar>(&raw)
        && stored.is_valid()
        && stored.mtime == mtime
    {
        return Ok(stored.sha256);
    }

    let digest = file_sha256(path)?;
    let fresh = Sidecar::sealed(digest.clone(), mtime);
    fs::write(&sidecar, serde_json::to_vec_pretty(&fresh)?)
        .with_context(|| format!("write {}", sidecar.display()))?;
    Ok(digest)
}

/// True when `path` exists and hashes to `expected`.
pub fn matches_digest(path: &Path, expected: &str) -> bool {
    if !path.is_file() {
        return false;
    }
    match cached_digest(path) {
        Ok(digest) => digest.eq_ignore_ascii_case(expected),
        Err(err) => {
            log::warn!("cache check failed for {}: {err:#}", path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_digest_matches_known_vector() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("data");
        fs::write(&path, b"hello").unwrap();
        assert_eq!(
            file_sha256(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn cached_digest_writes_and_reuses_sidecar() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("image.img");
        fs::write(&path, b"hello").unwrap();

        let first = cached_digest(&path).unwrap();
        assert!(tmp.path().join(".image.img.sha256").exists());
        let second = cached_digest(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn tampered_sidecar_is_recomputed() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("image.img");
        fs::write(&path, b"hello").unwrap();
        let _ = cached_digest(&path).unwrap();

        let sidecar = tmp.path().join(".image.img.sha256");
        let raw = fs::read_to_string(&sidecar).unwrap();
        let forged = raw.replace(
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824",
            "0000000000000000000000000000000000000000000000000000000000000000",
        );
        fs::write(&sidecar, forged).unwrap();

        // Seal no longer matches the forged digest, so the file is re-hashed.
        assert_eq!(
            cached_digest(&path).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn matches_digest_handles_absent_files() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("missing.img");
        assert!(!matches_digest(&path, "2cf24d"));

        fs::write(&path, b"hello").unwrap();
        assert!(matches_digest(
            &path,
            "2CF24DBA5FB0A30E26E83B2AC5B9E29E1B161E5C1FA7425E73043362938B9824"
        ));
        assert!(!matches_digest(&path, &"0".repeat(64)));
    }
}
