//! Version parsing and ordering for update comparisons.
//!
//! Handles release tags such as "v2.0.0" or "1.4.0-rc.1" and the development
//! build markers that are compiled into untagged builds.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use semver::Prerelease;

use crate::error::{Result, UpdateError};

/// Version strings that mark a development build. They parse to 0.0.0 so
/// that any published release is considered newer.
pub const DEV_SENTINELS: &[&str] = &["dev", "unreleased"];

/// A parsed release version.
///
/// Build metadata is discarded; pre-release identifiers only take part in
/// ordering when the numeric triples are equal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Version {
    /// Major version number.
    pub major: u64,
    /// Minor version number.
    pub minor: u64,
    /// Patch version number.
    pub patch: u64,
    /// Pre-release identifier, empty for a stable release.
    pub pre: Prerelease,
}

impl Version {
    /// Create a new stable version.
    #[must_use]
    pub const fn new(major: u64, minor: u64, patch: u64) -> Self {
        Self {
            major,
            minor,
            patch,
            pre: Prerelease::EMPTY,
        }
    }

    /// Check if this version is a pre-release.
    #[must_use]
    pub fn is_pre_release(&self) -> bool {
        !self.pre.is_empty()
    }

    /// Returns true when `self` is strictly newer than `other`.
    #[must_use]
    pub fn is_newer_than(&self, other: &Self) -> bool {
        self > other
    }
}

/// Returns true if `s` is one of the development build markers.
#[must_use]
pub fn is_dev_sentinel(s: &str) -> bool {
    DEV_SENTINELS
        .iter()
        .any(|sentinel| s.eq_ignore_ascii_case(sentinel))
}

impl FromStr for Version {
    type Err = UpdateError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if is_dev_sentinel(trimmed) {
            return Ok(Self::new(0, 0, 0));
        }

        // A single non-numeric marker may precede the triple ("v1.2.3").
        let body = match trimmed.chars().next() {
            Some(c) if !c.is_ascii_digit() => &trimmed[c.len_utf8()..],
            _ => trimmed,
        };

        let parsed = semver::Version::parse(body)
            .map_err(|e| UpdateError::InvalidVersion(format!("{s:?}: {e}")))?;

        Ok(Self {
            major: parsed.major,
            minor: parsed.minor,
            patch: parsed.patch,
            pre: parsed.pre,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if !self.pre.is_empty() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        // An empty pre-release sorts above any pre-release of the same triple.
        (self.major, self.minor, self.patch, &self.pre).cmp(&(
            other.major,
            other.minor,
            other.patch,
            &other.pre,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_parse_stable_version() {
        let v = Version::from_str("1.2.3").unwrap();
        assert_eq!(v, Version::new(1, 2, 3));
        assert!(!v.is_pre_release());
    }

    #[test]
    fn test_parse_version_with_v_prefix() {
        assert_eq!(Version::from_str("v1.2.3").unwrap(), Version::new(1, 2, 3));
        assert_eq!(Version::from_str("V1.2.3").unwrap(), Version::new(1, 2, 3));
    }

    #[test]
    fn test_parse_dev_sentinels() {
        assert_eq!(Version::from_str("dev").unwrap(), Version::new(0, 0, 0));
        assert_eq!(
            Version::from_str("unreleased").unwrap(),
            Version::new(0, 0, 0)
        );
    }

    #[test]
    fn test_dev_is_older_than_any_release() {
        let dev = Version::from_str("dev").unwrap();
        assert!(Version::from_str("0.0.1").unwrap().is_newer_than(&dev));
        assert!(Version::from_str("v0.1.0").unwrap().is_newer_than(&dev));
    }

    #[test]
    fn test_build_metadata_is_ignored() {
        let a = Version::from_str("1.0.0+build.5").unwrap();
        let b = Version::from_str("1.0.0").unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_prerelease_ordering() {
        let rc = Version::from_str("1.0.0-rc.1").unwrap();
        let stable = Version::from_str("1.0.0").unwrap();
        assert!(rc.is_pre_release());
        assert!(rc < stable);
        assert!(Version::from_str("1.0.1-alpha").unwrap() > stable);
    }

    #[test]
    fn test_version_ordering() {
        let v1 = Version::from_str("1.0.0").unwrap();
        let v2 = Version::from_str("1.0.1").unwrap();
        let v3 = Version::from_str("1.1.0").unwrap();
        let v4 = Version::from_str("2.0.0").unwrap();

        assert!(v1 < v2);
        assert!(v2 < v3);
        assert!(v3 < v4);
        assert!(!v1.is_newer_than(&v1));
    }

    #[test]
    fn test_version_display() {
        let v = Version::from_str("v1.2.3-beta.4").unwrap();
        assert_eq!(v.to_string(), "1.2.3-beta.4");
    }

    #[test]
    fn test_invalid_version() {
        assert!(Version::from_str("invalid").is_err());
        assert!(Version::from_str("1.2").is_err());
        assert!(Version::from_str("1.2.3.4").is_err());
        assert!(Version::from_str("vv1.2.3").is_err());
        assert!(Version::from_str("").is_err());
    }

    proptest! {
        #[test]
        fn ordering_matches_numeric_tuples(
            a in (0u64..500, 0u64..500, 0u64..500),
            b in (0u64..500, 0u64..500, 0u64..500),
            prefix_a in any::<bool>(),
            prefix_b in any::<bool>(),
        ) {
            let render = |(x, y, z): (u64, u64, u64), prefixed: bool| {
                format!("{}{x}.{y}.{z}", if prefixed { "v" } else { "" })
            };
            let va = Version::from_str(&render(a, prefix_a)).unwrap();
            let vb = Version::from_str(&render(b, prefix_b)).unwrap();
            prop_assert_eq!(va.cmp(&vb), a.cmp(&b));
        }
    }
}
