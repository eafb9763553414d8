//! Release archive extraction.
//!
//! Release archives are plain zip files holding the tool binary at their
//! root. Every entry name is resolved lexically against the destination
//! before anything is written; an entry that would land outside it aborts
//! the extraction with `IllegalPath`. Entries written before the offending
//! one are left in place, so callers extract into a scratch directory they
//! can discard.

use std::fs::File;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::errors::{Result, TfvmError};
use crate::paths::create_dir_all;

/// Mode applied to file entries that carry no unix permissions.
#[cfg(unix)]
const DEFAULT_FILE_MODE: u32 = 0o755;

/// Extracts a zip archive into `dest_dir`.
///
/// Creates the destination directory if it does not exist. Directory
/// entries are created with default permissions; file entries get the mode
/// stored in the archive. Symlink entries are written as regular files.
///
/// # Errors
///
/// Returns:
/// - `IllegalPath` if an entry would escape `dest_dir`
/// - `InvalidArchive` if the file is not a readable zip archive
/// - `IoError` if a directory or file cannot be created or written
pub fn extract_zip(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path).map_err(|e| {
        TfvmError::io_error(
            format!("Failed to open archive: {}", archive_path.display()),
            e,
        )
    })?;

    let mut archive = zip::ZipArchive::new(file).map_err(|e| {
        TfvmError::invalid_archive(format!(
            "Failed to read ZIP archive {}: {e}",
            archive_path.display()
        ))
    })?;

    create_dir_all(dest_dir)?;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i).map_err(|e| {
            TfvmError::invalid_archive(format!("Failed to read archive entry {i}: {e}"))
        })?;

        let name = entry.name().to_string();
        let output_path = contained_path(dest_dir, &name)?;

        if entry.is_dir() {
            create_dir_all(&output_path)?;
            continue;
        }

        if output_path == dest_dir {
            return Err(TfvmError::illegal_path(name));
        }

        if let Some(parent) = output_path.parent() {
            create_dir_all(parent)?;
        }

        #[cfg(unix)]
        let mode = entry
            .unix_mode()
            .map(|m| m & 0o7777)
            .filter(|m| *m != 0)
            .unwrap_or(DEFAULT_FILE_MODE);

        let mut outfile = File::create(&output_path).map_err(|e| {
            TfvmError::io_error(
                format!("Failed to create file: {}", output_path.display()),
                e,
            )
        })?;

        std::io::copy(&mut entry, &mut outfile).map_err(|e| {
            TfvmError::io_error(format!("Failed to extract: {}", output_path.display()), e)
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            std::fs::set_permissions(&output_path, std::fs::Permissions::from_mode(mode))
                .map_err(|e| {
                    TfvmError::io_error(
                        format!("Failed to set permissions: {}", output_path.display()),
                        e,
                    )
                })?;
        }

        debug!(entry = %name, "extracted");
    }

    Ok(())
}

/// Joins an archive entry name onto `dest_dir` without leaving it.
///
/// The name is cleaned lexically: `.` is dropped, `..` removes the previous
/// component, and backslashes count as separators. Climbing above
/// `dest_dir`, a rooted name, or a drive prefix is `IllegalPath`.
fn contained_path(dest_dir: &Path, name: &str) -> Result<PathBuf> {
    let normalized = name.replace('\\', "/");
    if normalized.starts_with('/') {
        return Err(TfvmError::illegal_path(name));
    }

    let mut parts = Vec::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => parts.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if parts.pop().is_none() {
                    return Err(TfvmError::illegal_path(name));
                }
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(TfvmError::illegal_path(name));
            }
        }
    }

    let mut path = dest_dir.to_path_buf();
    path.extend(parts);
    Ok(path)
}
