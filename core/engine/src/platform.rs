//! Platform detection for release archives.
//!
//! Release archives are published per OS/architecture pair and carry a tag
//! such as `linux_amd64` in their file name. This module maps the running
//! system onto one of those tags.
//!
//! ## Supported Platforms
//!
//! - Linux: `386`, `amd64`, `arm`, `arm64`
//! - macOS: `amd64`, `arm64`
//! - Windows: `386`, `amd64`

use std::fmt;

use crate::errors::{Result, TfvmError};

/// Oldest release published for Apple Silicon.
const DARWIN_ARM64_MIN_RELEASE: semver::Version = semver::Version::new(1, 0, 2);

/// A supported OS/architecture combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Linux on 32-bit x86
    Linux386,
    /// Linux on `x86_64`
    LinuxAmd64,
    /// Linux on 32-bit ARM
    LinuxArm,
    /// Linux on `aarch64`
    LinuxArm64,
    /// macOS on Intel
    DarwinAmd64,
    /// macOS on Apple Silicon
    DarwinArm64,
    /// Windows on 32-bit x86
    Windows386,
    /// Windows on `x86_64`
    WindowsAmd64,
}

impl Platform {
    /// Detects the current platform from the compile-time target.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` if the OS/architecture pair has no
    /// published release archives.
    pub fn detect() -> Result<Self> {
        Self::from_parts(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Maps Rust's OS and architecture names onto a platform.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlatform` for any pair not listed in the module docs.
    pub fn from_parts(os: &str, arch: &str) -> Result<Self> {
        match (os, arch) {
            ("linux", "x86") => Ok(Self::Linux386),
            ("linux", "x86_64") => Ok(Self::LinuxAmd64),
            ("linux", "arm") => Ok(Self::LinuxArm),
            ("linux", "aarch64") => Ok(Self::LinuxArm64),
            ("macos", "x86_64") => Ok(Self::DarwinAmd64),
            ("macos", "aarch64") => Ok(Self::DarwinArm64),
            ("windows", "x86") => Ok(Self::Windows386),
            ("windows", "x86_64") => Ok(Self::WindowsAmd64),
            _ => Err(TfvmError::unsupported_platform(os, arch)),
        }
    }

    /// Returns the tag used in release archive names.
    #[must_use = "returns the platform string without side effects"]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Linux386 => "linux_386",
            Self::LinuxAmd64 => "linux_amd64",
            Self::LinuxArm => "linux_arm",
            Self::LinuxArm64 => "linux_arm64",
            Self::DarwinAmd64 => "darwin_amd64",
            Self::DarwinArm64 => "darwin_arm64",
            Self::Windows386 => "windows_386",
            Self::WindowsAmd64 => "windows_amd64",
        }
    }

    /// Returns the executable file extension for this platform.
    ///
    /// Returns `.exe` on Windows, empty string on Unix platforms.
    #[must_use = "returns the extension string without side effects"]
    pub fn executable_extension(self) -> &'static str {
        if self.is_windows() { ".exe" } else { "" }
    }

    /// Returns whether this platform is Windows.
    #[must_use = "returns platform check result without side effects"]
    pub fn is_windows(self) -> bool {
        matches!(self, Self::Windows386 | Self::WindowsAmd64)
    }

    /// Returns whether a release of this version was ever built for the platform.
    ///
    /// Only Apple Silicon is restricted: nothing older than 1.0.2 exists there,
    /// and versions that are not valid semver are rejected on that platform.
    #[must_use]
    pub fn supports_release(self, version: &str) -> bool {
        match self {
            Self::DarwinArm64 => semver::Version::parse(version)
                .is_ok_and(|v| v >= DARWIN_ARM64_MIN_RELEASE),
            _ => true,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_maps_supported_pairs() {
        assert_eq!(
            Platform::from_parts("linux", "x86_64").unwrap(),
            Platform::LinuxAmd64
        );
        assert_eq!(
            Platform::from_parts("linux", "arm").unwrap(),
            Platform::LinuxArm
        );
        assert_eq!(
            Platform::from_parts("macos", "aarch64").unwrap(),
            Platform::DarwinArm64
        );
        assert_eq!(
            Platform::from_parts("windows", "x86").unwrap(),
            Platform::Windows386
        );
    }

    #[test]
    fn from_parts_rejects_unknown_pairs() {
        let err = Platform::from_parts("freebsd", "x86_64").unwrap_err();
        assert!(matches!(err, TfvmError::UnsupportedPlatform { .. }));

        let err = Platform::from_parts("macos", "x86").unwrap_err();
        assert!(matches!(err, TfvmError::UnsupportedPlatform { .. }));
    }

    #[test]
    fn tags_match_release_naming() {
        assert_eq!(Platform::Linux386.as_str(), "linux_386");
        assert_eq!(Platform::LinuxArm64.as_str(), "linux_arm64");
        assert_eq!(Platform::DarwinAmd64.as_str(), "darwin_amd64");
        assert_eq!(Platform::WindowsAmd64.as_str(), "windows_amd64");
        assert_eq!(format!("{}", Platform::LinuxAmd64), "linux_amd64");
    }

    #[test]
    fn executable_extension_only_on_windows() {
        assert_eq!(Platform::LinuxAmd64.executable_extension(), "");
        assert_eq!(Platform::DarwinArm64.executable_extension(), "");
        assert_eq!(Platform::Windows386.executable_extension(), ".exe");
        assert_eq!(Platform::WindowsAmd64.executable_extension(), ".exe");
    }

    #[test]
    fn apple_silicon_rejects_releases_before_1_0_2() {
        assert!(!Platform::DarwinArm64.supports_release("0.15.5"));
        assert!(!Platform::DarwinArm64.supports_release("1.0.1"));
        assert!(Platform::DarwinArm64.supports_release("1.0.2"));
        assert!(Platform::DarwinArm64.supports_release("1.1.0"));
        assert!(!Platform::DarwinArm64.supports_release("not-a-version"));
    }

    #[test]
    fn other_platforms_accept_every_release() {
        assert!(Platform::LinuxAmd64.supports_release("0.11.0"));
        assert!(Platform::WindowsAmd64.supports_release("whatever"));
    }

    #[test]
    fn detect_matches_compile_target() {
        let detected = Platform::detect();
        #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
        assert!(matches!(detected, Ok(Platform::LinuxAmd64)));

        #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
        assert!(matches!(detected, Ok(Platform::DarwinArm64)));

        let _ = detected;
    }
}
