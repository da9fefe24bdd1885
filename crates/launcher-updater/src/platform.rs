//! Platform detection and asset matching.
//!
//! Release artifacts are named after the `<os>-<arch>` token of the target
//! they were built for (e.g. `ddalab-launcher-linux-amd64.tar.gz`). This
//! module maps the running process onto that token and picks the matching
//! artifact from a release.

use std::fmt;

use crate::error::{Result, UpdateError};
use crate::release::Asset;

/// Operating systems the launcher is published for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    /// macOS.
    Darwin,
    /// Linux.
    Linux,
    /// Microsoft Windows.
    Windows,
    /// Any other OS, by its Rust `target_os` name.
    Other(&'static str),
}

impl Os {
    /// Detect the current operating system.
    #[must_use]
    pub fn current() -> Self {
        Self::from_target(std::env::consts::OS)
    }

    /// Map a Rust `target_os` name.
    #[must_use]
    pub fn from_target(os: &'static str) -> Self {
        match os {
            "macos" => Self::Darwin,
            "linux" => Self::Linux,
            "windows" => Self::Windows,
            other => Self::Other(other),
        }
    }

    /// Token used in artifact names.
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Windows => "windows",
            Self::Other(name) => *name,
        }
    }

    /// Archive suffix artifacts for this OS are published with.
    #[must_use]
    pub const fn archive_suffix(&self) -> &'static str {
        match self {
            Self::Windows => ".zip",
            _ => ".tar.gz",
        }
    }

    /// Whether artifacts for this OS are published at all.
    #[must_use]
    pub const fn is_published(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Get a human-readable name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Darwin => "macOS",
            Self::Linux => "Linux",
            Self::Windows => "Windows",
            Self::Other(name) => *name,
        }
    }
}

/// CPU architectures, named the way release artifacts name them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// x86_64.
    Amd64,
    /// AArch64.
    Arm64,
    /// 32-bit x86.
    X86,
    /// Any other architecture, by its Rust `target_arch` name.
    Other(&'static str),
}

impl Arch {
    /// Detect the current architecture.
    #[must_use]
    pub fn current() -> Self {
        Self::from_target(std::env::consts::ARCH)
    }

    /// Map a Rust `target_arch` name.
    #[must_use]
    pub fn from_target(arch: &'static str) -> Self {
        match arch {
            "x86_64" => Self::Amd64,
            "aarch64" => Self::Arm64,
            "x86" => Self::X86,
            other => Self::Other(other),
        }
    }

    /// Token used in artifact names. Unknown architectures use "amd64".
    #[must_use]
    pub const fn token(&self) -> &'static str {
        match self {
            Self::Amd64 | Self::Other(_) => "amd64",
            Self::Arm64 => "arm64",
            Self::X86 => "386",
        }
    }

    /// Whether a 64-bit artifact of the same OS family may stand in for
    /// an exact match.
    const fn accepts_family_fallback(&self) -> bool {
        !matches!(self, Self::X86)
    }

    /// Get a human-readable name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Amd64 => "x64",
            Self::Arm64 => "ARM64",
            Self::X86 => "x86",
            Self::Other(name) => *name,
        }
    }
}

/// Architecture tokens an OS family publishes artifacts for.
const FAMILY_ARCHES: [&str; 2] = ["amd64", "arm64"];

/// Target platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    /// The operating system.
    pub os: Os,
    /// The CPU architecture.
    pub arch: Arch,
}

impl Platform {
    /// Creates a platform for an explicit OS and architecture.
    #[must_use]
    pub const fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }

    /// Detect the current platform.
    #[must_use]
    pub fn current() -> Self {
        Self {
            os: Os::current(),
            arch: Arch::current(),
        }
    }

    /// The `<os>-<arch>` token artifacts are named with.
    #[must_use]
    pub fn token(&self) -> String {
        format!("{}-{}", self.os.token(), self.arch.token())
    }

    /// Whether this platform expects Windows executables (`.exe`).
    #[must_use]
    pub fn is_windows(&self) -> bool {
        self.os == Os::Windows
    }

    /// Get a display string for this platform (e.g. "macOS ARM64").
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.os.display_name(), self.arch.display_name())
    }

    /// Find the matching asset for this platform.
    ///
    /// An exact `<os>-<arch>` match with the right archive suffix wins. If
    /// there is none, any artifact of the same OS family is accepted, still
    /// constrained by suffix. A 32-bit x86 host never falls back to a 64-bit
    /// artifact.
    pub fn find_asset<'a>(&self, assets: &'a [Asset]) -> Result<&'a Asset> {
        let not_found = || UpdateError::NoAssetFound {
            platform: self.token(),
        };

        if !self.os.is_published() {
            return Err(not_found());
        }

        let suffix = self.os.archive_suffix();
        let candidates = || {
            assets
                .iter()
                .map(|asset| (asset, asset.name.to_ascii_lowercase()))
                .filter(move |(_, name)| name.ends_with(suffix))
        };

        let exact = self.token();
        if let Some((asset, _)) = candidates().find(|(_, name)| name.contains(&exact)) {
            tracing::debug!("Selected asset {} for {}", asset.name, exact);
            return Ok(asset);
        }

        if self.arch.accepts_family_fallback() {
            let family: Vec<String> = FAMILY_ARCHES
                .iter()
                .map(|arch| format!("{}-{}", self.os.token(), arch))
                .collect();
            if let Some((asset, _)) =
                candidates().find(|(_, name)| family.iter().any(|token| name.contains(token)))
            {
                tracing::debug!("Selected fallback asset {} for {}", asset.name, exact);
                return Ok(asset);
            }
        }

        Err(not_found())
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::current()
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os.token(), self.arch.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_asset(name: &str) -> Asset {
        Asset {
            name: name.to_string(),
            download_url: format!("https://example.com/download/{name}"),
            size: 1_000_000,
        }
    }

    fn sample_assets() -> Vec<Asset> {
        vec![
            make_asset("app-windows-amd64.zip"),
            make_asset("app-linux-amd64.tar.gz"),
            make_asset("app-darwin-arm64.tar.gz"),
        ]
    }

    #[test]
    fn test_windows_amd64_gets_zip() {
        let platform = Platform::new(Os::Windows, Arch::Amd64);
        let assets = sample_assets();
        let asset = platform.find_asset(&assets).unwrap();
        assert_eq!(asset.name, "app-windows-amd64.zip");
    }

    #[test]
    fn test_linux_amd64_gets_tar_gz() {
        let platform = Platform::new(Os::Linux, Arch::Amd64);
        let assets = sample_assets();
        let asset = platform.find_asset(&assets).unwrap();
        assert_eq!(asset.download_url, "https://example.com/download/app-linux-amd64.tar.gz");
    }

    #[test]
    fn test_linux_386_gets_nothing() {
        let platform = Platform::new(Os::Linux, Arch::X86);
        let assets = sample_assets();
        let result = platform.find_asset(&assets);
        assert!(matches!(
            result,
            Err(UpdateError::NoAssetFound { ref platform }) if platform == "linux-386"
        ));
    }

    #[test]
    fn test_wrong_suffix_rejected() {
        let platform = Platform::new(Os::Linux, Arch::Amd64);
        let assets = vec![make_asset("app-linux-amd64.zip")];
        assert!(platform.find_asset(&assets).is_err());

        let platform = Platform::new(Os::Windows, Arch::Amd64);
        let assets = vec![make_asset("app-windows-amd64.tar.gz")];
        assert!(platform.find_asset(&assets).is_err());
    }

    #[test]
    fn test_family_fallback() {
        // Only an Intel build exists; an ARM Mac still gets it.
        let platform = Platform::new(Os::Darwin, Arch::Arm64);
        let assets = vec![
            make_asset("app-linux-arm64.tar.gz"),
            make_asset("app-darwin-amd64.tar.gz"),
        ];
        let asset = platform.find_asset(&assets).unwrap();
        assert_eq!(asset.name, "app-darwin-amd64.tar.gz");
    }

    #[test]
    fn test_exact_match_preferred_over_family() {
        let platform = Platform::new(Os::Linux, Arch::Arm64);
        let assets = vec![
            make_asset("app-linux-amd64.tar.gz"),
            make_asset("app-linux-arm64.tar.gz"),
        ];
        let asset = platform.find_asset(&assets).unwrap();
        assert_eq!(asset.name, "app-linux-arm64.tar.gz");
    }

    #[test]
    fn test_unknown_arch_uses_amd64() {
        let platform = Platform::new(Os::Linux, Arch::Other("riscv64"));
        assert_eq!(platform.token(), "linux-amd64");
        let assets = sample_assets();
        let asset = platform.find_asset(&assets).unwrap();
        assert_eq!(asset.name, "app-linux-amd64.tar.gz");
    }

    #[test]
    fn test_unknown_os_gets_nothing() {
        let platform = Platform::new(Os::Other("freebsd"), Arch::Amd64);
        let assets = vec![make_asset("app-freebsd-amd64.tar.gz")];
        assert!(platform.find_asset(&assets).is_err());
    }

    #[test]
    fn test_case_insensitive_names() {
        let platform = Platform::new(Os::Linux, Arch::Amd64);
        let assets = vec![make_asset("App-Linux-AMD64.TAR.GZ")];
        assert!(platform.find_asset(&assets).is_ok());
    }

    #[test]
    fn test_display_name() {
        assert_eq!(
            Platform::new(Os::Darwin, Arch::Arm64).display_name(),
            "macOS ARM64"
        );
        assert_eq!(
            Platform::new(Os::Linux, Arch::Amd64).display_name(),
            "Linux x64"
        );
        assert_eq!(
            Platform::new(Os::Windows, Arch::X86).display_name(),
            "Windows x86"
        );
    }

    #[test]
    fn test_from_target() {
        assert_eq!(Os::from_target("macos"), Os::Darwin);
        assert_eq!(Arch::from_target("aarch64"), Arch::Arm64);
        assert_eq!(Arch::from_target("x86"), Arch::X86);
        assert_eq!(Os::from_target("freebsd"), Os::Other("freebsd"));
    }
}
