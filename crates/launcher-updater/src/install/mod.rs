//! Replacing the running executable.
//!
//! Two strategies exist because platforms disagree on what may be done to
//! an executable that is currently running:
//!
//! - [`RenameSwapInstaller`] (macOS, Linux): the new binary is staged next to
//!   the old one and renamed over it. The kernel keeps the old inode alive
//!   for the running process.
//! - [`DeferredScriptInstaller`] (Windows): an in-use executable cannot be
//!   replaced, so the swap is handed to a batch script that runs after the
//!   launcher exits.
//!
//! Either way, a failure before the point of no return leaves the original
//! executable untouched.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Result, UpdateError};
use crate::steps::extract::ExtractedBinary;

pub mod posix;
pub mod windows;

pub use posix::{RenameSwapInstaller, StdSwapFs, SwapFs};
pub use windows::{DeferredScriptInstaller, DetachedCommand, ProcessSpawner};

/// Suffix of the transient copy of the previous executable.
pub const BACKUP_SUFFIX: &str = ".backup";

/// Suffix of the staged executable on Windows.
pub const STAGED_SUFFIX: &str = ".new";

/// Suffix of the deferred replacement script on Windows.
pub const SCRIPT_SUFFIX: &str = ".update.bat";

/// What an install accomplished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The executable at `path` has already been replaced.
    Replaced {
        /// The replaced executable.
        path: PathBuf,
    },
    /// Replacement happens once the current process exits.
    Scheduled {
        /// The script that performs the replacement.
        script: PathBuf,
        /// The staged new executable.
        staged: PathBuf,
    },
}

impl InstallOutcome {
    /// Restart instructions suitable for showing to the user.
    #[must_use]
    pub fn restart_instructions(&self) -> &'static str {
        match self {
            Self::Replaced { .. } => {
                "The update has been applied to the binary. \
                 Please restart the launcher to use the new version."
            }
            Self::Scheduled { .. } => {
                "The launcher will be replaced automatically when you exit. \
                 Please close this window and start the launcher again."
            }
        }
    }
}

/// A way of putting a new executable in place of an existing one.
pub trait InstallStrategy: Send + Sync + fmt::Debug {
    /// Installs `binary` over the executable at `target`.
    fn install(&self, target: &Path, binary: &ExtractedBinary) -> Result<InstallOutcome>;
}

/// The strategy for the platform this crate was built for.
#[must_use]
pub fn default_strategy() -> Box<dyn InstallStrategy> {
    if cfg!(windows) {
        Box::new(DeferredScriptInstaller::new())
    } else {
        Box::new(RenameSwapInstaller::new())
    }
}

/// `path` with `suffix` appended to its file name (`launcher` -> `launcher.backup`).
#[must_use]
pub fn sibling_path(path: &Path, suffix: &str) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(suffix);
    PathBuf::from(name)
}

/// Builds an install error with context.
fn install_error(context: &str, path: &Path, err: impl fmt::Display) -> UpdateError {
    UpdateError::Installation(format!("{context} {}: {err}", path.display()))
}
