//! Atomic rename-swap installer.

use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::Path;

use super::{BACKUP_SUFFIX, InstallOutcome, InstallStrategy, install_error, sibling_path};
use crate::error::{Result, UpdateError};
use crate::steps::extract::ExtractedBinary;

/// Prefix of the staging file created next to the executable.
const TEMP_PREFIX: &str = "launcher-update-";

/// Filesystem renames used by the swap.
///
/// Tests substitute an implementation that fails on demand.
pub trait SwapFs: Send + Sync + fmt::Debug {
    /// Renames `from` to `to`.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// [`SwapFs`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdSwapFs;

impl SwapFs for StdSwapFs {
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }
}

/// Replaces the executable by renaming a staged copy over it.
///
/// Steps:
/// 1. Resolve symlinks so the real file is replaced
/// 2. Write the new binary to a temp file in the same directory and mark it executable
/// 3. Move current → `<exe>.backup`
/// 4. Move temp → current, restoring the backup if this fails
/// 5. Remove the backup
#[derive(Debug, Clone, Default)]
pub struct RenameSwapInstaller<F = StdSwapFs> {
    fs: F,
}

impl RenameSwapInstaller {
    /// Creates an installer using the real filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self { fs: StdSwapFs }
    }
}

impl<F: SwapFs> RenameSwapInstaller<F> {
    /// Creates an installer performing renames through `fs`.
    #[must_use]
    pub fn with_fs(fs: F) -> Self {
        Self { fs }
    }
}

impl<F: SwapFs> InstallStrategy for RenameSwapInstaller<F> {
    fn install(&self, target: &Path, binary: &ExtractedBinary) -> Result<InstallOutcome> {
        let target = fs::canonicalize(target)
            .map_err(|e| install_error("Failed to resolve executable", target, e))?;
        let dir = target.parent().ok_or_else(|| {
            UpdateError::Installation(format!("{} has no parent directory", target.display()))
        })?;

        // Same directory, so the final rename never crosses filesystems.
        let mut staged = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| install_error("Failed to create temp file in", dir, e))?;
        staged
            .write_all(binary.data())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|e| install_error("Failed to write", staged.path(), e))?;
        set_executable(staged.path())?;

        // Removed on drop, whichever way this function returns.
        let staged = staged.into_temp_path();

        let backup = sibling_path(&target, BACKUP_SUFFIX);
        tracing::debug!("Moving {} to {}", target.display(), backup.display());
        self.fs
            .rename(&target, &backup)
            .map_err(|e| install_error("Failed to back up", &target, e))?;

        if let Err(err) = self.fs.rename(&staged, &target) {
            tracing::warn!("Installing new binary failed, rolling back: {}", err);
            return Err(self.rollback(&backup, &target, &err));
        }

        if let Err(e) = fs::remove_file(&backup) {
            tracing::warn!("Failed to remove backup {}: {}", backup.display(), e);
        }

        tracing::info!("Replaced {}", target.display());
        Ok(InstallOutcome::Replaced { path: target })
    }
}

impl<F: SwapFs> RenameSwapInstaller<F> {
    /// Puts the backup back and returns the error to surface.
    fn rollback(&self, backup: &Path, target: &Path, cause: &io::Error) -> UpdateError {
        match self.fs.rename(backup, target) {
            Ok(()) => {
                tracing::info!("Rollback complete");
                install_error("Failed to move new binary into", target, cause)
            }
            Err(rollback_err) => {
                tracing::error!(
                    "Install failed and rollback failed: {}; previous binary left at {}",
                    rollback_err,
                    backup.display()
                );
                UpdateError::RollbackFailed {
                    install_error: cause.to_string(),
                    rollback_error: rollback_err.to_string(),
                    backup: backup.to_path_buf(),
                }
            }
        }
    }
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .map_err(|e| install_error("Failed to set permissions on", path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<()> {
    Ok(())
}
