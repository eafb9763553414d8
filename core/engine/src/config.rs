//! Engine configuration.
//!
//! A [`Config`] is built once (from the environment by the binary, or by hand
//! in tests) and handed to every component. Nothing in the engine reads
//! process-wide state after construction.
//!
//! ## Environment Variables
//!
//! - `TFVM_HOME`: root directory (default `~/.tfvm`)
//! - `TFVM_RELEASES_URL`: releases host (default `https://releases.hashicorp.com/terraform`)
//! - `TFVM_LINK_MODE`: `hard` (default) or `symlink`

use std::path::PathBuf;

use crate::errors::{Result, TfvmError};
use crate::paths::StorePaths;
use crate::platform::Platform;

/// Name of the managed tool.
pub const TOOL_NAME: &str = "terraform";

/// Environment variable overriding the releases host.
pub const RELEASES_URL_ENV: &str = "TFVM_RELEASES_URL";

/// Environment variable selecting how the active link is created.
pub const LINK_MODE_ENV: &str = "TFVM_LINK_MODE";

/// Default releases host.
pub const DEFAULT_RELEASES_URL: &str = "https://releases.hashicorp.com/terraform";

/// Project-local file naming the version `use` picks when given none.
pub const MARKER_FILE: &str = ".tfversion";

/// How the active link refers to its store file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkMode {
    /// A hard link; survives the store file being renamed.
    #[default]
    Hard,
    /// A symbolic link to the store file's absolute path.
    Symbolic,
}

impl LinkMode {
    /// Parses `hard` or `symlink` (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` for any other value.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hard" => Ok(Self::Hard),
            "symlink" | "symbolic" => Ok(Self::Symbolic),
            other => Err(TfvmError::parse_error(format!(
                "invalid {LINK_MODE_ENV} value '{other}', expected 'hard' or 'symlink'"
            ))),
        }
    }
}

/// Everything the engine needs to know about its environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// Store layout.
    pub paths: StorePaths,
    /// Platform used to pick release archives.
    pub platform: Platform,
    /// Releases host, without a trailing slash.
    pub releases_url: String,
    /// How `use` creates the active link.
    pub link_mode: LinkMode,
    /// Marker file consulted by `use` without a version.
    pub marker_file: PathBuf,
}

impl Config {
    /// Creates a config with default host and link mode.
    ///
    /// The marker file is looked up relative to the process working directory.
    #[must_use]
    pub fn new(paths: StorePaths, platform: Platform) -> Self {
        Self {
            paths,
            platform,
            releases_url: DEFAULT_RELEASES_URL.to_string(),
            link_mode: LinkMode::default(),
            marker_file: PathBuf::from(MARKER_FILE),
        }
    }

    /// Builds the config from the running system and environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform is unsupported, the home directory
    /// cannot be determined, or `TFVM_LINK_MODE` holds an unknown value.
    pub fn from_env() -> Result<Self> {
        let platform = Platform::detect()?;
        let paths = StorePaths::from_env(TOOL_NAME, platform.executable_extension())?;

        let mut config = Self::new(paths, platform);
        if let Some(url) = non_blank_env(RELEASES_URL_ENV) {
            config = config.with_releases_url(&url);
        }
        if let Some(mode) = non_blank_env(LINK_MODE_ENV) {
            config.link_mode = LinkMode::parse(&mode)?;
        }
        if let Ok(cwd) = std::env::current_dir() {
            config.marker_file = cwd.join(MARKER_FILE);
        }
        Ok(config)
    }

    /// Overrides the releases host; surrounding whitespace and trailing slashes are dropped.
    #[must_use]
    pub fn with_releases_url(mut self, url: &str) -> Self {
        self.releases_url = url.trim().trim_end_matches('/').to_string();
        self
    }

    /// Overrides the link mode.
    #[must_use]
    pub fn with_link_mode(mut self, link_mode: LinkMode) -> Self {
        self.link_mode = link_mode;
        self
    }

    /// Overrides the marker file location.
    #[must_use]
    pub fn with_marker_file(mut self, marker_file: PathBuf) -> Self {
        self.marker_file = marker_file;
        self
    }

    /// URL of the releases index page.
    #[must_use]
    pub fn index_url(&self) -> String {
        format!("{}/", self.releases_url)
    }

    /// URL of the release archive for a version on the configured platform.
    #[must_use]
    pub fn archive_url(&self, version: &str) -> String {
        archive_url(&self.releases_url, self.paths.tool(), version, self.platform)
    }
}

/// Builds `<base>/<version>/<tool>_<version>_<platform>.zip`.
#[must_use]
pub fn archive_url(base: &str, tool: &str, version: &str, platform: Platform) -> String {
    format!("{base}/{version}/{tool}_{version}_{platform}.zip")
}

fn non_blank_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
