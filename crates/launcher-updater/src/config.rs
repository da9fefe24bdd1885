//! Configuration types for the update system.

use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default registry endpoint. `/releases/latest` is appended to it.
pub const DEFAULT_REGISTRY_URL: &str = "https://api.github.com/repos/sdraeger/DDALAB-launcher";

/// Environment variable holding an optional registry token.
pub const TOKEN_ENV_VAR: &str = "GITHUB_TOKEN";

/// Timeout for the release metadata request.
pub const CHECK_TIMEOUT: Duration = Duration::from_secs(30);

/// Timeout ceiling for artifact downloads.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// User agent string for registry and download requests.
const USER_AGENT_VALUE: &str = concat!("ddalab-launcher/", env!("CARGO_PKG_VERSION"));

/// Names the launcher binary may be published under inside an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryNames {
    /// Full product name, e.g. "ddalab-launcher".
    pub product: String,
    /// Short component name, e.g. "launcher".
    pub component: String,
}

impl Default for BinaryNames {
    fn default() -> Self {
        Self {
            product: "ddalab-launcher".to_string(),
            component: "launcher".to_string(),
        }
    }
}

/// Settings for talking to the release registry and installing updates.
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    /// Registry base URL.
    pub registry_url: String,
    /// Optional token sent as `Authorization: token <value>` for rate-limit relief.
    pub token: Option<String>,
    /// Timeout applied to the metadata request.
    pub check_timeout: Duration,
    /// Timeout applied to the artifact download.
    pub download_timeout: Duration,
    /// User agent sent with every request.
    pub user_agent: String,
    /// Binary names searched for inside archives.
    pub binary_names: BinaryNames,
    /// Executable to replace. Defaults to the running executable.
    pub target_executable: Option<PathBuf>,
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            registry_url: DEFAULT_REGISTRY_URL.to_string(),
            token: None,
            check_timeout: CHECK_TIMEOUT,
            download_timeout: DOWNLOAD_TIMEOUT,
            user_agent: USER_AGENT_VALUE.to_string(),
            binary_names: BinaryNames::default(),
            target_executable: None,
        }
    }
}

impl UpdaterConfig {
    /// Default configuration with the token read from `GITHUB_TOKEN`.
    #[must_use]
    pub fn from_env() -> Self {
        let token = std::env::var(TOKEN_ENV_VAR)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self {
            token,
            ..Self::default()
        }
    }

    /// Sets the registry base URL.
    #[must_use]
    pub fn with_registry_url(mut self, url: impl Into<String>) -> Self {
        self.registry_url = url.into();
        self
    }

    /// Sets the registry token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Sets the executable that updates are installed over.
    #[must_use]
    pub fn with_target_executable(mut self, path: impl Into<PathBuf>) -> Self {
        self.target_executable = Some(path.into());
        self
    }

    /// URL of the latest-release endpoint.
    #[must_use]
    pub fn latest_release_url(&self) -> String {
        format!("{}/releases/latest", self.registry_url.trim_end_matches('/'))
    }
}

/// Persisted schedule for automatic update checks.
///
/// Storing it is the caller's job; field names match the launcher's
/// configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheckSchedule {
    /// Whether automatic checks are enabled.
    #[serde(rename = "auto_update_check", default = "default_enabled")]
    pub enabled: bool,

    /// Minimum hours between automatic checks.
    #[serde(rename = "update_check_interval_hours", default = "default_interval")]
    pub interval_hours: u32,

    /// Last time a check ran.
    #[serde(
        rename = "last_update_check",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_check: Option<DateTime<Utc>>,
}

fn default_enabled() -> bool {
    true
}

fn default_interval() -> u32 {
    24
}

impl Default for UpdateCheckSchedule {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            interval_hours: default_interval(),
            last_check: None,
        }
    }
}

impl UpdateCheckSchedule {
    /// Check if an automatic update check is due at `now`.
    #[must_use]
    pub fn should_check_at(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }

        match self.last_check {
            None => true,
            Some(last) => {
                let interval = chrono::Duration::hours(i64::from(self.interval_hours));
                now.signed_duration_since(last) >= interval
            }
        }
    }

    /// Check if an automatic update check is due now.
    #[must_use]
    pub fn should_check(&self) -> bool {
        self.should_check_at(Utc::now())
    }

    /// Record that a check ran at `now`.
    pub fn record_check(&mut self, now: DateTime<Utc>) {
        self.last_check = Some(now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_release_url() {
        let config = UpdaterConfig::default().with_registry_url("http://127.0.0.1:1234/");
        assert_eq!(
            config.latest_release_url(),
            "http://127.0.0.1:1234/releases/latest"
        );
        assert!(
            UpdaterConfig::default()
                .latest_release_url()
                .ends_with("DDALAB-launcher/releases/latest")
        );
    }

    #[test]
    fn test_default_timeouts() {
        let config = UpdaterConfig::default();
        assert_eq!(config.check_timeout, Duration::from_secs(30));
        assert_eq!(config.download_timeout, Duration::from_secs(300));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_schedule_defaults() {
        let schedule = UpdateCheckSchedule::default();
        assert!(schedule.enabled);
        assert_eq!(schedule.interval_hours, 24);
        assert!(schedule.should_check_at(Utc::now()));
    }

    #[test]
    fn test_schedule_interval() {
        let now = Utc::now();
        let mut schedule = UpdateCheckSchedule::default();
        schedule.record_check(now - chrono::Duration::hours(2));
        assert!(!schedule.should_check_at(now));

        schedule.record_check(now - chrono::Duration::hours(24));
        assert!(schedule.should_check_at(now));
    }

    #[test]
    fn test_schedule_disabled() {
        let schedule = UpdateCheckSchedule {
            enabled: false,
            ..UpdateCheckSchedule::default()
        };
        assert!(!schedule.should_check_at(Utc::now()));
    }

    #[test]
    fn test_schedule_serde_keys() {
        let json = r#"{"auto_update_check": false, "update_check_interval_hours": 6}"#;
        let schedule: UpdateCheckSchedule = serde_json::from_str(json).unwrap();
        assert!(!schedule.enabled);
        assert_eq!(schedule.interval_hours, 6);
        assert!(schedule.last_check.is_none());

        let empty: UpdateCheckSchedule = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, UpdateCheckSchedule::default());
    }
}
