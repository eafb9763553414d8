//! Project-local version marker (`.tfversion`).

use std::io::ErrorKind;
use std::path::Path;

use crate::errors::{Result, TfvmError};

/// Reads the version named by a marker file: its first non-empty line, trimmed.
///
/// # Errors
///
/// Returns `NoVersionSpecified` if the file is missing or has no non-empty
/// line, and `IoError` if it exists but cannot be read.
pub fn read_marker(path: &Path) -> Result<String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(TfvmError::no_version_specified(path.to_path_buf()));
        }
        Err(e) => {
            return Err(TfvmError::io_error(
                format!("Failed to read {}", path.display()),
                e,
            ));
        }
    };

    contents
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(str::to_string)
        .ok_or_else(|| TfvmError::no_version_specified(path.to_path_buf()))
}
