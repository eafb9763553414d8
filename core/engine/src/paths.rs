//! Path management for the version store.
//!
//! The default root directory is `~/.tfvm/`, which can be overridden by
//! setting the `TFVM_HOME` environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.tfvm/                    # Root directory (or TFVM_HOME)
//!   versions/                 # Version store, one file per release
//!     terraform1.5.7
//!     terraform1.6.0
//!   bin/                      # Holds the single active link
//!     terraform
//!   terraform.zip             # Scratch path for an in-flight download
//!   staging/                  # Extraction area for an in-flight install
//!   .lock                     # Advisory lock guarding the store
//! ```

use std::path::{Path, PathBuf};

use crate::errors::{Result, TfvmError};

/// Environment variable to override the default root directory.
pub const TFVM_HOME_ENV: &str = "TFVM_HOME";

/// Name of the lock file at the root.
const LOCK_FILE: &str = ".lock";

/// Name of the staging directory at the root.
const STAGING_DIR: &str = "staging";

/// Locations of every file the engine reads or writes.
///
/// File names inside the store depend on the tool name and executable
/// suffix, so those are held here too.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Root directory for all tfvm data (`~/.tfvm` or `TFVM_HOME`).
    pub root: PathBuf,
    /// Directory holding installed versions.
    pub versions: PathBuf,
    /// Directory holding the active link.
    pub bin: PathBuf,
    tool: String,
    extension: String,
}

impl StorePaths {
    /// Resolves the root from the environment.
    ///
    /// The root directory is determined by:
    /// 1. The `TFVM_HOME` environment variable if set and not blank
    /// 2. `~/.tfvm` in the user's home directory
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if the home directory cannot be determined.
    pub fn from_env(tool: &str, extension: &str) -> Result<Self> {
        let root = match std::env::var(TFVM_HOME_ENV) {
            Ok(home) if !home.trim().is_empty() => PathBuf::from(home.trim()),
            _ => dirs::home_dir()
                .ok_or_else(|| {
                    TfvmError::io_error(
                        "Cannot determine home directory. Set TFVM_HOME environment variable.",
                        std::io::Error::from(std::io::ErrorKind::NotFound),
                    )
                })?
                .join(".tfvm"),
        };

        Ok(Self::with_root(root, tool, extension))
    }

    /// Creates paths below an explicit root directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: PathBuf, tool: &str, extension: &str) -> Self {
        Self {
            versions: root.join("versions"),
            bin: root.join("bin"),
            root,
            tool: tool.to_string(),
            extension: extension.to_string(),
        }
    }

    /// Tool name used as the store file prefix.
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Executable suffix appended to every binary name.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Unversioned binary name, as shipped inside release archives.
    #[must_use]
    pub fn binary_name(&self) -> String {
        format!("{}{}", self.tool, self.extension)
    }

    /// Store file name for a version, e.g. `terraform1.5.7`.
    #[must_use]
    pub fn store_file_name(&self, version: &str) -> String {
        format!("{}{version}{}", self.tool, self.extension)
    }

    /// Path of the store file for a version.
    #[must_use = "returns the path without side effects"]
    pub fn store_file(&self, version: &str) -> PathBuf {
        self.versions.join(self.store_file_name(version))
    }

    /// Path of the single active link.
    #[must_use = "returns the path without side effects"]
    pub fn active_link(&self) -> PathBuf {
        self.bin.join(self.binary_name())
    }

    /// Temporary name used while swapping the active link.
    #[must_use = "returns the path without side effects"]
    pub fn swap_link(&self) -> PathBuf {
        self.bin.join(format!(".{}.swap", self.binary_name()))
    }

    /// Scratch path for a downloaded archive.
    #[must_use = "returns the path without side effects"]
    pub fn archive_path(&self) -> PathBuf {
        self.root.join(format!("{}.zip", self.tool))
    }

    /// Directory an archive is unpacked into before it reaches the store.
    #[must_use = "returns the path without side effects"]
    pub fn staging_dir(&self) -> PathBuf {
        self.root.join(STAGING_DIR)
    }

    /// Path of the advisory lock file.
    #[must_use = "returns the path without side effects"]
    pub fn lock_path(&self) -> PathBuf {
        self.root.join(LOCK_FILE)
    }

    /// Returns whether the active link exists, including a dangling symlink.
    #[must_use]
    pub fn has_active_link(&self) -> bool {
        self.active_link().symlink_metadata().is_ok()
    }

    /// Ensures the root, store and bin directories exist.
    ///
    /// # Errors
    ///
    /// Returns an `IoError` if any directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.root, &self.versions, &self.bin] {
            create_dir_all(dir)?;
        }
        Ok(())
    }
}

/// `create_dir_all` with the path in the error message.
pub(crate) fn create_dir_all(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(|e| {
        TfvmError::io_error(format!("Failed to create directory: {}", dir.display()), e)
    })
}
