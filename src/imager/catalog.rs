//! OS catalog retrieval from the official downloads service.

use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_recursion::async_recursion;
use serde::Deserialize;

const CATALOG_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

/// One operating system entry from the imaging catalog.
///
/// Group entries carry `subitems`/`subitems_url` instead of a downloadable
/// image; everything else on the wire is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct OsEntry {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Byte size of the extracted image.
    #[serde(default)]
    pub extract_size: Option<u64>,
    /// sha256 of the extracted image.
    #[serde(default)]
    pub extract_sha256: Option<String>,
    /// sha256 of the archive as downloaded.
    #[serde(default)]
    pub image_download_sha256: Option<String>,
    #[serde(default)]
    pub subitems: Vec<OsEntry>,
    #[serde(default)]
    pub subitems_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OsList {
    os_list: Vec<OsEntry>,
}

impl OsEntry {
    /// True for entries that open a submenu instead of naming an image.
    pub fn is_group(&self) -> bool {
        !self.subitems.is_empty()
    }

    /// Archive URL for a selectable entry.
    pub fn image_url(&self) -> Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| anyhow!("OS entry `{}` has no image url", self.name))
    }
}

/// Fetch the catalog and resolve nested subitem lists up front so menu
/// navigation never touches the network.
pub async fn fetch_catalog(url: &str) -> Result<Vec<OsEntry>> {
    let client = reqwest::Client::builder()
        .connect_timeout(CATALOG_CONNECT_TIMEOUT)
        .user_agent(concat!("imagine-pi/", env!("CARGO_PKG_VERSION")))
        .build()?;
    fetch_list(&client, url).await
}

#[async_recursion]
async fn fetch_list(client: &reqwest::Client, url: &str) -> Result<Vec<OsEntry>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("fetch OS list from {url}"))?;
    if !response.status().is_success() {
        return Err(anyhow!(
            "OS list request failed: HTTP {} for {url}",
            response.status()
        ));
    }

    let list: OsList = response.json().await.context("parse OS list JSON")?;
    let mut entries = list.os_list;
    for entry in &mut entries {
        if let Some(subitems_url) = entry.subitems_url.take() {
            entry.subitems = fetch_list(client, &subitems_url).await?;
        }
    }
    Ok(entries)
}
