//! Install, activation and removal of versions.
//!
//! The manager owns the only mutable state: the version store and the active
//! link. At most one version is active. Switching is done by building the new
//! link under a temporary name and renaming it over the active one, so the
//! active link is never missing mid-switch. Installs unpack into a staging
//! directory and move a single file into the store at the end, so a failed
//! install leaves nothing behind in `versions/`.
//!
//! Mutating operations hold [`StoreLock`] for their whole duration.

use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::archive::extract_zip;
use crate::catalog::VersionCatalog;
use crate::config::{Config, LinkMode};
use crate::errors::{Result, TfvmError};
use crate::lock::StoreLock;
use crate::marker::read_marker;
use crate::resolver::{LATEST, resolve};
use crate::source::ReleaseSource;

/// Result of a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallOutcome {
    /// The concrete version that was installed.
    pub version: String,
    /// Whether it became the active version because none was active.
    pub activated: bool,
}

/// Result of a successful `use`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseOutcome {
    pub version: String,
    /// `false` when the version was already active and nothing was touched.
    pub changed: bool,
}

/// One row of [`Manager::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListedVersion {
    pub version: String,
    pub active: bool,
}

/// Drives the version store through a [`ReleaseSource`].
pub struct Manager<S> {
    config: Config,
    source: S,
    current: Option<String>,
}

impl<S: ReleaseSource> Manager<S> {
    /// Creates a manager.
    ///
    /// `current` is the version the active link currently runs, as probed by
    /// the caller, or `None` if nothing is active.
    pub fn new(config: Config, source: S, current: Option<String>) -> Self {
        Self {
            config,
            source,
            current,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The active version as tracked by this manager.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    #[must_use]
    pub fn catalog(&self) -> VersionCatalog<'_> {
        VersionCatalog::new(&self.config, &self.source)
    }

    /// Downloads and stores the release matching `spec`.
    ///
    /// `spec` is resolved against the remote catalog. The new version is
    /// activated if no version is active yet.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyInstalled` without touching the store if the resolved
    /// version is present. Resolution, network, extraction and I/O failures
    /// are returned as-is after the scratch archive and staging directory are
    /// cleaned up.
    pub async fn install(&mut self, spec: &str) -> Result<InstallOutcome> {
        let paths = &self.config.paths;
        paths.ensure_directories()?;
        let _lock = StoreLock::acquire(&paths.lock_path())?;

        let available = self.catalog().list_available().await?;
        let version = resolve(spec, &available)?;
        debug!(spec, %version, "resolved against remote catalog");

        if self.config.paths.store_file(&version).symlink_metadata().is_ok() {
            return Err(TfvmError::already_installed(version));
        }

        let url = self.config.archive_url(&version);
        let result = self.materialize(&version, &url).await;
        self.discard_scratch();
        result?;
        info!(%version, "installed");

        let activated = self.current.is_none() && !self.config.paths.has_active_link();
        if activated {
            self.activate(&version)?;
        }

        Ok(InstallOutcome { version, activated })
    }

    /// Makes the version matching `spec` active.
    ///
    /// Without a specifier the project marker file names the version.
    /// `spec` is resolved against the installed catalog. Asking for the
    /// version that is already active changes nothing on disk.
    ///
    /// # Errors
    ///
    /// Returns `NoVersionSpecified` if neither a specifier nor a marker is
    /// available, resolution errors if the version is not installed, and
    /// `IoError` if the link cannot be created.
    pub fn use_version(&mut self, spec: Option<&str>) -> Result<UseOutcome> {
        let spec = match spec.map(str::trim).filter(|s| !s.is_empty()) {
            Some(spec) => spec.to_string(),
            None => {
                let spec = read_marker(&self.config.marker_file)?;
                debug!(marker = %self.config.marker_file.display(), %spec, "read version marker");
                spec
            }
        };

        let paths = &self.config.paths;
        paths.ensure_directories()?;
        let _lock = StoreLock::acquire(&paths.lock_path())?;

        let installed = self.catalog().list_installed()?;
        let version = resolve(&spec, &installed)?;

        if self.current.as_deref() == Some(version.as_str()) {
            debug!(%version, "already active");
            return Ok(UseOutcome {
                version,
                changed: false,
            });
        }

        self.activate(&version)?;
        Ok(UseOutcome {
            version,
            changed: true,
        })
    }

    /// Deletes the version matching `spec` from the store.
    ///
    /// Removing the active version also removes the active link. A version
    /// counts as active if it is the probed one or if the active link points
    /// at its store file.
    ///
    /// # Errors
    ///
    /// Returns `UnknownVersion` for an empty or `latest` specifier, other
    /// resolution errors if the version is not installed, and `IoError` if a
    /// file cannot be deleted.
    pub fn remove(&mut self, spec: &str) -> Result<String> {
        let spec = spec.trim();
        if spec.is_empty() || spec.eq_ignore_ascii_case(LATEST) {
            return Err(TfvmError::unknown_version(spec));
        }

        let paths = &self.config.paths;
        paths.ensure_directories()?;
        let _lock = StoreLock::acquire(&paths.lock_path())?;

        let installed = self.catalog().list_installed()?;
        let version = resolve(spec, &installed)?;

        let store_file = self.config.paths.store_file(&version);
        let link = self.config.paths.active_link();
        let active =
            self.current.as_deref() == Some(version.as_str()) || same_file(&link, &store_file);

        std::fs::remove_file(&store_file).map_err(|e| {
            TfvmError::io_error(format!("Failed to remove {}", store_file.display()), e)
        })?;
        info!(%version, "removed from store");

        if active {
            remove_file_if_present(&link)?;
            self.current = None;
            info!(link = %link.display(), "active link removed");
        }

        Ok(version)
    }

    /// Installed versions in catalog order, flagging the active one.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnreadable` if the store cannot be listed.
    pub fn list(&self) -> Result<Vec<ListedVersion>> {
        let current = self.current.as_deref();
        Ok(self
            .catalog()
            .list_installed()?
            .into_iter()
            .map(|version| ListedVersion {
                active: current == Some(version.as_str()),
                version,
            })
            .collect())
    }

    /// Fetches and unpacks `version`, then moves its binary into the store.
    async fn materialize(&self, version: &str, url: &str) -> Result<()> {
        let paths = &self.config.paths;
        let archive = paths.archive_path();
        let staging = paths.staging_dir();
        remove_dir_if_present(&staging)?;

        self.source.download(url, &archive).await?;

        info!(archive = %archive.display(), "extracting");
        extract_zip(&archive, &staging)?;
        remove_file_if_present(&archive)?;

        let binary = staging.join(paths.binary_name());
        if !binary.is_file() {
            return Err(TfvmError::invalid_archive(format!(
                "archive for {version} does not contain {}",
                paths.binary_name()
            )));
        }

        let store_file = paths.store_file(version);
        std::fs::rename(&binary, &store_file).map_err(|e| {
            TfvmError::io_error(
                format!(
                    "Failed to move {} to {}",
                    binary.display(),
                    store_file.display()
                ),
                e,
            )
        })?;
        ensure_executable(&store_file)?;
        debug!(store_file = %store_file.display(), "stored");

        Ok(())
    }

    /// Best-effort removal of the scratch archive and staging directory.
    fn discard_scratch(&self) {
        let paths = &self.config.paths;
        if let Err(e) = remove_file_if_present(&paths.archive_path()) {
            warn!(error = %e, "could not remove scratch archive");
        }
        if let Err(e) = remove_dir_if_present(&paths.staging_dir()) {
            warn!(error = %e, "could not remove staging directory");
        }
    }

    /// Points the active link at the store file for `version`.
    fn activate(&mut self, version: &str) -> Result<()> {
        let paths = &self.config.paths;
        let target = paths.store_file(version);
        let swap = paths.swap_link();
        let link = paths.active_link();

        remove_file_if_present(&swap)?;
        create_link(self.config.link_mode, &target, &swap)?;
        std::fs::rename(&swap, &link).map_err(|e| {
            TfvmError::io_error(format!("Failed to replace {}", link.display()), e)
        })?;
        // Renaming onto a hard link of the same file is a no-op that keeps the source.
        remove_file_if_present(&swap)?;

        info!(%version, link = %link.display(), "activated");
        self.current = Some(version.to_string());
        Ok(())
    }
}

/// Symbolic links always get an absolute target, since a relative one would
/// be resolved against `bin/`.
fn create_link(mode: LinkMode, target: &Path, link: &Path) -> Result<()> {
    let result = match mode {
        LinkMode::Hard => std::fs::hard_link(target, link),
        LinkMode::Symbolic => {
            std::path::absolute(target).and_then(|target| symlink_file(&target, link))
        }
    };
    result.map_err(|e| {
        TfvmError::io_error(
            format!("Failed to link {} to {}", link.display(), target.display()),
            e,
        )
    })
}

#[cfg(unix)]
fn symlink_file(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink_file(target: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(target, link)
}

/// Whether `link` resolves to the same file as `target`.
#[cfg(unix)]
fn same_file(link: &Path, target: &Path) -> bool {
    use std::os::unix::fs::MetadataExt;

    match (std::fs::metadata(link), std::fs::metadata(target)) {
        (Ok(a), Ok(b)) => a.dev() == b.dev() && a.ino() == b.ino(),
        _ => false,
    }
}

#[cfg(not(unix))]
fn same_file(link: &Path, target: &Path) -> bool {
    match (std::fs::read_link(link), std::path::absolute(target)) {
        (Ok(dest), Ok(target)) => std::path::absolute(dest).is_ok_and(|dest| dest == target),
        _ => false,
    }
}

/// Sets `0o755` on a store file that ended up without any execute bit.
#[cfg(unix)]
fn ensure_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let metadata = std::fs::metadata(path)
        .map_err(|e| TfvmError::io_error(format!("Failed to stat {}", path.display()), e))?;
    if metadata.permissions().mode() & 0o111 == 0 {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).map_err(|e| {
            TfvmError::io_error(
                format!("Failed to set permissions: {}", path.display()),
                e,
            )
        })?;
    }
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn ensure_executable(_path: &Path) -> Result<()> {
    Ok(())
}

fn remove_file_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(TfvmError::io_error(
            format!("Failed to remove {}", path.display()),
            e,
        )),
        _ => Ok(()),
    }
}

fn remove_dir_if_present(path: &Path) -> Result<()> {
    match std::fs::remove_dir_all(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(TfvmError::io_error(
            format!("Failed to remove {}", path.display()),
            e,
        )),
        _ => Ok(()),
    }
}
