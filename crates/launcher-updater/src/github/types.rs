//! GitHub API types.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::release::{Asset, ReleaseMetadata};

/// Raw release data from the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubRelease {
    /// The release tag name (e.g., "v2.0.0").
    pub tag_name: String,

    /// The release title.
    #[serde(default)]
    pub name: Option<String>,

    /// Release notes in markdown format.
    #[serde(default)]
    pub body: Option<String>,

    /// Release assets.
    #[serde(default)]
    pub assets: Vec<GitHubAsset>,

    /// Publication timestamp.
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Release asset data from the GitHub API.
#[derive(Debug, Clone, Deserialize)]
pub struct GitHubAsset {
    /// Asset filename (e.g., "ddalab-launcher-linux-amd64.tar.gz").
    pub name: String,

    /// Direct download URL.
    pub browser_download_url: String,

    /// File size in bytes.
    #[serde(default)]
    pub size: u64,
}

impl From<GitHubAsset> for Asset {
    fn from(asset: GitHubAsset) -> Self {
        Self {
            name: asset.name,
            download_url: asset.browser_download_url,
            size: asset.size,
        }
    }
}

impl From<GitHubRelease> for ReleaseMetadata {
    fn from(release: GitHubRelease) -> Self {
        Self {
            tag: release.tag_name,
            notes: release.body.unwrap_or_default(),
            assets: release.assets.into_iter().map(Asset::from).collect(),
            published_at: release.published_at,
        }
    }
}
