//! Error types for the self-update system.

use std::path::PathBuf;

use thiserror::Error;

/// Coarse error family, used by callers to decide how to present a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed version string or malformed registry response.
    Parse,
    /// Registry or download host unreachable, bad status, cancellation or timeout.
    Network,
    /// No artifact published for the running platform.
    NoAsset,
    /// Archive unreadable, no matching entry, or payload too small.
    Extraction,
    /// Filesystem failure while replacing the executable.
    Install,
}

/// Errors that can occur during the update process.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum UpdateError {
    /// Failed to parse version string.
    #[error("invalid version format: {0}")]
    InvalidVersion(String),

    /// Failed to parse the registry's JSON response.
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Network request failed.
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus {
        /// Numeric status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// GitHub API rate limit exceeded.
    #[error("GitHub API rate limit exceeded, retry after {retry_after} seconds")]
    RateLimited {
        /// Seconds until rate limit resets.
        retry_after: u64,
    },

    /// A timeout or context deadline elapsed.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The operation was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// No suitable release asset found for the current platform.
    #[error("no release asset found for platform {platform}")]
    NoAssetFound {
        /// Platform token that was searched for (e.g. "linux-amd64").
        platform: String,
    },

    /// Archive could not be read.
    #[error("archive extraction error: {0}")]
    ArchiveExtraction(String),

    /// The archive held no entry matching the expected binary names.
    #[error("no binary found for platform {platform} in archive. Expected patterns: {patterns:?}")]
    BinaryNotFound {
        /// Platform token (e.g. "linux-amd64").
        platform: String,
        /// Every name pattern that was tried.
        patterns: Vec<String>,
    },

    /// The extracted payload is smaller than the minimum accepted size.
    #[error("extracted binary {name} is too small ({size} bytes, minimum {minimum})")]
    BinaryTooSmall {
        /// Entry name inside the archive.
        name: String,
        /// Actual payload size.
        size: u64,
        /// Minimum size in bytes.
        minimum: u64,
    },

    /// Failed to install the update.
    #[error("installation error: {0}")]
    Installation(String),

    /// Installation failed and the previous executable could not be restored.
    #[error(
        "installation failed ({install_error}) and rollback failed ({rollback_error}); \
         previous executable left at {}",
        .backup.display()
    )]
    RollbackFailed {
        /// Error that triggered the rollback.
        install_error: String,
        /// Error raised while restoring the backup.
        rollback_error: String,
        /// Where the previous executable was left.
        backup: PathBuf,
    },
}

impl UpdateError {
    /// Returns the error family this error belongs to.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidVersion(_) | Self::JsonParse(_) => ErrorKind::Parse,
            Self::Network(_)
            | Self::HttpStatus { .. }
            | Self::RateLimited { .. }
            | Self::Timeout(_)
            | Self::Cancelled => ErrorKind::Network,
            Self::NoAssetFound { .. } => ErrorKind::NoAsset,
            Self::ArchiveExtraction(_)
            | Self::BinaryNotFound { .. }
            | Self::BinaryTooSmall { .. } => ErrorKind::Extraction,
            Self::Installation(_) | Self::RollbackFailed { .. } => ErrorKind::Install,
        }
    }

    /// Returns true when the caller cancelled the operation.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns a user-friendly error message suitable for display in the UI.
    #[must_use]
    pub fn user_message(&self) -> &str {
        match self {
            Self::Network(_) | Self::HttpStatus { .. } => {
                "Could not reach the update server. Please check your internet connection."
            }
            Self::Timeout(_) => "The update server took too long to respond.",
            Self::Cancelled => "The update was cancelled.",
            Self::RateLimited { .. } => "GitHub API rate limit reached. Please try again later.",
            Self::NoAssetFound { .. } => "No update available for your platform.",
            Self::ArchiveExtraction(_)
            | Self::BinaryNotFound { .. }
            | Self::BinaryTooSmall { .. } => "Could not extract the update package.",
            Self::Installation(_) => {
                "Could not install the update. The current version is still in place."
            }
            Self::RollbackFailed { .. } => {
                "The update failed and the previous version could not be restored. \
                 Please reinstall the launcher."
            }
            Self::InvalidVersion(_) | Self::JsonParse(_) => "An unexpected error occurred.",
        }
    }

    /// Returns whether this error is potentially recoverable with a retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for UpdateError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for UpdateError {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonParse(err.to_string())
    }
}

impl From<zip::result::ZipError> for UpdateError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::ArchiveExtraction(err.to_string())
    }
}

/// Result type alias for update operations.
pub type Result<T> = std::result::Result<T, UpdateError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds() {
        assert_eq!(
            UpdateError::InvalidVersion("x".to_string()).kind(),
            ErrorKind::Parse
        );
        assert_eq!(UpdateError::Cancelled.kind(), ErrorKind::Network);
        assert_eq!(
            UpdateError::HttpStatus {
                status: 404,
                url: "http://x".to_string()
            }
            .kind(),
            ErrorKind::Network
        );
        assert_eq!(
            UpdateError::BinaryTooSmall {
                name: "a".to_string(),
                size: 10,
                minimum: 1024
            }
            .kind(),
            ErrorKind::Extraction
        );
        assert_eq!(
            UpdateError::RollbackFailed {
                install_error: "a".to_string(),
                rollback_error: "b".to_string(),
                backup: PathBuf::from("/tmp/x.backup"),
            }
            .kind(),
            ErrorKind::Install
        );
    }

    #[test]
    fn test_cancelled_is_distinguishable() {
        assert!(UpdateError::Cancelled.is_cancelled());
        assert!(!UpdateError::Network("reset".to_string()).is_cancelled());
        assert!(!UpdateError::Timeout("deadline".to_string()).is_cancelled());
    }

    #[test]
    fn test_user_messages() {
        let err = UpdateError::Network("connection refused".to_string());
        assert!(err.user_message().contains("internet connection"));

        let err = UpdateError::NoAssetFound {
            platform: "linux-386".to_string(),
        };
        assert!(err.user_message().contains("platform"));

        let err = UpdateError::Installation("rename failed".to_string());
        assert!(err.user_message().contains("still in place"));
    }

    #[test]
    fn test_retryable() {
        assert!(UpdateError::Network("timeout".to_string()).is_retryable());
        assert!(UpdateError::RateLimited { retry_after: 60 }.is_retryable());
        assert!(
            UpdateError::HttpStatus {
                status: 502,
                url: String::new()
            }
            .is_retryable()
        );
        assert!(
            !UpdateError::HttpStatus {
                status: 404,
                url: String::new()
            }
            .is_retryable()
        );
        assert!(!UpdateError::Cancelled.is_retryable());
    }

    #[test]
    fn test_binary_not_found_lists_patterns() {
        let err = UpdateError::BinaryNotFound {
            platform: "linux-amd64".to_string(),
            patterns: vec!["launcher-linux-amd64".to_string()],
        };
        let message = err.to_string();
        assert!(message.contains("linux-amd64"));
        assert!(message.contains("launcher-linux-amd64"));
    }
}
