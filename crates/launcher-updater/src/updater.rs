//! The update façade used by the rest of the launcher.

use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::UpdaterConfig;
use crate::context::UpdateContext;
use crate::error::{Result, UpdateError};
use crate::github::GitHubClient;
use crate::install::{InstallOutcome, InstallStrategy, default_strategy};
use crate::platform::Platform;
use crate::release::UpdateDecision;
use crate::steps::download::{DownloadProgress, Downloader};
use crate::steps::extract::ArchiveExtractor;
use crate::version::Version;

/// Checks for and installs launcher updates.
///
/// The running version is fixed at construction. The install strategy is
/// chosen once, from the build target, unless one is supplied.
pub struct Updater {
    current_version: String,
    config: UpdaterConfig,
    platform: Platform,
    strategy: Box<dyn InstallStrategy>,
}

impl Updater {
    /// Creates an updater for `current_version` with the default configuration
    /// (token taken from the environment).
    #[must_use]
    pub fn new(current_version: impl Into<String>) -> Self {
        Self::with_config(current_version, UpdaterConfig::from_env())
    }

    /// Creates an updater with an explicit configuration.
    #[must_use]
    pub fn with_config(current_version: impl Into<String>, config: UpdaterConfig) -> Self {
        Self {
            current_version: current_version.into(),
            config,
            platform: Platform::current(),
            strategy: default_strategy(),
        }
    }

    /// Overrides the target platform used for asset selection and extraction.
    #[must_use]
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = platform;
        self
    }

    /// Overrides the install strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: impl InstallStrategy + 'static) -> Self {
        self.strategy = Box::new(strategy);
        self
    }

    /// The running version string.
    #[must_use]
    pub fn current_version(&self) -> &str {
        &self.current_version
    }

    /// The target platform.
    #[must_use]
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &UpdaterConfig {
        &self.config
    }

    /// Fetches the latest release and decides whether it is an update.
    ///
    /// A release without an artifact for this platform is not an error:
    /// the decision comes back with an empty download URL.
    pub async fn check_for_updates(&self, ctx: &UpdateContext) -> Result<UpdateDecision> {
        tracing::info!(
            "Checking for updates (current version: {})",
            self.current_version
        );

        let current = Version::from_str(&self.current_version)?;
        let client = GitHubClient::new(&self.config)?;
        let release = client.fetch_latest(ctx).await?;
        let latest = Version::from_str(&release.tag)?;

        let (download_url, size) = match self.platform.find_asset(&release.assets) {
            Ok(asset) => (asset.download_url.clone(), asset.size),
            Err(UpdateError::NoAssetFound { platform }) => {
                tracing::info!("No release asset for platform {}", platform);
                (String::new(), 0)
            }
            Err(e) => return Err(e),
        };

        let has_update = latest.is_newer_than(&current);
        if has_update {
            tracing::info!(
                "Update available: {} -> {}",
                self.current_version,
                release.tag
            );
        } else {
            tracing::info!(
                "No update available (current: {}, latest: {})",
                self.current_version,
                release.tag
            );
        }

        Ok(UpdateDecision {
            current_version: self.current_version.clone(),
            latest_version: release.tag,
            release_notes: release.notes,
            download_url,
            size,
            published_at: release.published_at,
            has_update,
        })
    }

    /// Downloads the artifact at `download_url` and installs it over the
    /// running executable.
    pub async fn perform_update(
        &self,
        ctx: &UpdateContext,
        download_url: &str,
    ) -> Result<InstallOutcome> {
        self.perform_update_with_progress(ctx, download_url, |_| {})
            .await
    }

    /// Like [`perform_update`](Self::perform_update), reporting download progress.
    pub async fn perform_update_with_progress<F>(
        &self,
        ctx: &UpdateContext,
        download_url: &str,
        on_progress: F,
    ) -> Result<InstallOutcome>
    where
        F: FnMut(DownloadProgress),
    {
        if download_url.is_empty() {
            return Err(UpdateError::NoAssetFound {
                platform: self.platform.token(),
            });
        }

        let target = self.target_executable()?;
        tracing::info!("Updating {} from {}", target.display(), download_url);

        let data = Downloader::new(&self.config)?
            .download_with_progress(ctx, download_url, on_progress)
            .await?;

        let extractor = ArchiveExtractor::new(self.platform, self.config.binary_names.clone());
        let binary = extractor.extract(Cursor::new(data), download_url)?;

        // Last chance to back out before the executable is touched.
        ctx.ensure_active()?;

        let outcome = self.strategy.install(&target, &binary)?;
        tracing::info!("Update installed: {:?}", outcome);
        Ok(outcome)
    }

    /// The executable updates are installed over.
    fn target_executable(&self) -> Result<PathBuf> {
        match &self.config.target_executable {
            Some(path) => Ok(path.clone()),
            None => std::env::current_exe().map_err(|e| {
                UpdateError::Installation(format!("Failed to locate running executable: {e}"))
            }),
        }
    }
}

impl fmt::Debug for Updater {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Updater")
            .field("current_version", &self.current_version)
            .field("registry_url", &self.config.registry_url)
            .field("platform", &self.platform)
            .field("strategy", &self.strategy)
            .finish()
    }
}
