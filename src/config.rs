//! Imager configuration.
//!
//! A default TOML config is generated on first run so the catalog URL and
//! cache location can be overridden without rebuilding.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Official Raspberry Pi OS catalog used when no override is configured.
pub const DEFAULT_OS_LIST_URL: &str =
    "https://downloads.raspberrypi.org/os_list_imagingutility.json";

/// Cache root for downloaded archives and extracted images.
pub const DEFAULT_CACHE_DIR: &str = "/var/tmp/imagine-pi";

/// Top-level imager configuration (mirrors the built-in defaults).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagerConfig {
    #[serde(default = "default_os_list_url")]
    pub os_list_url: String,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

fn default_os_list_url() -> String {
    DEFAULT_OS_LIST_URL.to_string()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from(DEFAULT_CACHE_DIR)
}

impl Default for ImagerConfig {
    fn default() -> Self {
        Self {
            os_list_url: default_os_list_url(),
            cache_dir: default_cache_dir(),
        }
    }
}

/// Resolve the config path: an explicit override or the user config directory.
pub fn config_path(override_path: Option<&str>) -> Result<PathBuf> {
    if let Some(path) = override_path {
        return Ok(PathBuf::from(path));
    }
    let config_dir = dirs::config_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
        .join("imagine-pi");
    Ok(config_dir.join("config.toml"))
}

/// Load the config, generating a default file when none exists.
pub fn load_or_create(path: &Path) -> Result<ImagerConfig> {
    if !path.exists() {
        log::info!(
            "Config not found at {}, creating default configuration",
            path.display()
        );
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        let default_toml = toml::to_string_pretty(&ImagerConfig::default())
            .context("Failed to serialize default config")?;
        fs::write(path, default_toml).context("Failed to write config file")?;
    }

    let cfg_str = fs::read_to_string(path).context("Failed to read config file")?;
    let cfg: ImagerConfig = toml::from_str(&cfg_str).context("Failed to parse config")?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_or_create_writes_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("conf").join("config.toml");

        let cfg = load_or_create(&path).unwrap();

        assert!(path.exists());
        assert_eq!(cfg.os_list_url, DEFAULT_OS_LIST_URL);
        assert_eq!(cfg.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
    }

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "os_list_url = \"http://localhost/os.json\"\n").unwrap();

        let cfg = load_or_create(&path).unwrap();

        assert_eq!(cfg.os_list_url, "http://localhost/os.json");
        assert_eq!(cfg.cache_dir, PathBuf::from(DEFAULT_CACHE_DIR));
    }
}
