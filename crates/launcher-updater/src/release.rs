//! Release metadata and the update decision handed to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Latest-release metadata as published by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseMetadata {
    /// Raw version tag, possibly prefixed (e.g. "v2.0.0").
    pub tag: String,

    /// Release notes text.
    pub notes: String,

    /// Downloadable artifacts.
    pub assets: Vec<Asset>,

    /// When the release was published.
    pub published_at: Option<DateTime<Utc>>,
}

/// A downloadable artifact attached to a release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// The asset file name.
    pub name: String,

    /// Direct download URL.
    pub download_url: String,

    /// File size in bytes.
    pub size: u64,
}

impl Asset {
    /// Get a human-readable file size.
    #[must_use]
    pub fn human_size(&self) -> String {
        format_size(self.size)
    }
}

/// Result of an update check.
///
/// An empty `download_url` means no artifact exists for this platform; the
/// caller should treat that as "cannot auto-update here".
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateDecision {
    /// Version string of the running build.
    pub current_version: String,

    /// Raw tag of the latest release.
    pub latest_version: String,

    /// Release notes of the latest release.
    pub release_notes: String,

    /// Download URL of the artifact for this platform, or empty.
    pub download_url: String,

    /// Artifact size in bytes, zero when no artifact was found.
    pub size: u64,

    /// When the latest release was published.
    pub published_at: Option<DateTime<Utc>>,

    /// Whether the latest release is strictly newer than the running build.
    pub has_update: bool,
}

impl UpdateDecision {
    /// Returns true if an artifact exists for this platform.
    #[must_use]
    pub fn has_installable_asset(&self) -> bool {
        !self.download_url.is_empty()
    }

    /// Returns true if an update exists and can be installed here.
    #[must_use]
    pub fn can_install(&self) -> bool {
        self.has_update && self.has_installable_asset()
    }

    /// Get a human-readable artifact size.
    #[must_use]
    pub fn human_size(&self) -> String {
        format_size(self.size)
    }
}

/// Formats a byte count using binary units ("512 B", "1.5 KB", "2.0 MB").
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const UNIT: u64 = 1024;
    const PREFIXES: [char; 6] = ['K', 'M', 'G', 'T', 'P', 'E'];

    if bytes < UNIT {
        return format!("{bytes} B");
    }

    let mut div = UNIT;
    let mut exp = 0;
    let mut n = bytes / UNIT;
    while n >= UNIT {
        div *= UNIT;
        exp += 1;
        n /= UNIT;
    }

    format!("{:.1} {}B", bytes as f64 / div as f64, PREFIXES[exp])
}
