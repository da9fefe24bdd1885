//! Self-update system for the DDALAB launcher.
//!
//! This crate replaces the running launcher executable with a newer release
//! fetched from a GitHub-style release registry.
//!
//! # Overview
//!
//! - Version tags are parsed and ordered semantically; development builds
//!   (`dev`) are older than every release
//! - Release artifacts are matched to the running OS and architecture by
//!   their `<os>-<arch>` token
//! - The executable is extracted from `.tar.gz` or `.zip` artifacts, or taken
//!   as-is when the artifact is a raw binary
//! - Installation is an atomic rename-swap on macOS and Linux, and a deferred
//!   batch script on Windows, with rollback when the swap fails
//!
//! # Architecture
//!
//! [`Updater`] is the entry point:
//!
//! - [`Updater::check_for_updates`] fetches release metadata and returns an
//!   [`UpdateDecision`]
//! - [`Updater::perform_update`] downloads, extracts and installs
//!
//! Both take an [`UpdateContext`], which carries cancellation and an optional
//! deadline. The caller decides whether to update, and tells the user to
//! restart afterwards; nothing here restarts the process.
//!
//! # Example
//!
//! ```no_run
//! use launcher_updater::{UpdateContext, Updater};
//!
//! async fn update() -> launcher_updater::Result<()> {
//!     let updater = Updater::new("1.5.0");
//!     let ctx = UpdateContext::new();
//!
//!     let decision = updater.check_for_updates(&ctx).await?;
//!     if decision.can_install() {
//!         let outcome = updater.perform_update(&ctx, &decision.download_url).await?;
//!         println!("{}", outcome.restart_instructions());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
pub mod config;
pub mod context;
pub mod error;
pub mod platform;
pub mod release;
pub mod version;

// Individual steps
pub mod install;
pub mod steps;

// Registry API
pub mod github;

mod updater;

pub use config::{BinaryNames, UpdateCheckSchedule, UpdaterConfig};
pub use context::UpdateContext;
pub use error::{ErrorKind, Result, UpdateError};
pub use install::{
    DeferredScriptInstaller, InstallOutcome, InstallStrategy, RenameSwapInstaller,
    default_strategy,
};
pub use platform::{Arch, Os, Platform};
pub use release::{Asset, ReleaseMetadata, UpdateDecision, format_size};
pub use steps::download::DownloadProgress;
pub use steps::extract::{ArchiveExtractor, ArchiveType, ExtractedBinary, MIN_BINARY_SIZE};
pub use updater::Updater;
pub use version::Version;

/// Version string reported by development builds.
pub const DEV_VERSION: &str = "dev";

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_dev_version_parses() {
        assert_eq!(Version::from_str(DEV_VERSION).unwrap(), Version::new(0, 0, 0));
    }

    #[test]
    fn test_default_strategy_matches_target() {
        let strategy = format!("{:?}", default_strategy());
        if cfg!(windows) {
            assert!(strategy.contains("DeferredScriptInstaller"));
        } else {
            assert!(strategy.contains("RenameSwapInstaller"));
        }
    }
}
