//! Version specifier resolution.
//!
//! A specifier is resolved against whichever catalog the caller hands in:
//! the remote one for installs, the local one for `use` and `remove`.
//! Catalog order is significant. Index 0 is "latest", and minor
//! specifiers take the first match in listed order, not the highest patch.

use crate::errors::{Result, TfvmError};

/// Keyword accepted in place of an empty specifier.
pub const LATEST: &str = "latest";

/// Resolves `spec` to a concrete version from `catalog`.
///
/// - empty or `latest`: the first catalog entry
/// - `MAJOR.MINOR` (exactly one dot): the first entry whose first two
///   dot-separated segments are equal to the specifier's
/// - anything else: the specifier itself, if it is a catalog member
///
/// # Errors
///
/// Returns `EmptyCatalog`, `NoMatchingMinor` or `UnknownVersion` for the
/// three rules respectively.
pub fn resolve(spec: &str, catalog: &[String]) -> Result<String> {
    let spec = spec.trim();

    if spec.is_empty() || spec.eq_ignore_ascii_case(LATEST) {
        return catalog.first().cloned().ok_or(TfvmError::EmptyCatalog);
    }

    if let Some((major, minor)) = minor_spec(spec) {
        return catalog
            .iter()
            .find(|v| minor_of(v) == Some((major, minor)))
            .cloned()
            .ok_or_else(|| TfvmError::no_matching_minor(spec));
    }

    if catalog.iter().any(|v| v == spec) {
        Ok(spec.to_string())
    } else {
        Err(TfvmError::unknown_version(spec))
    }
}

/// Splits a specifier with exactly one `.` into its two segments.
fn minor_spec(spec: &str) -> Option<(&str, &str)> {
    let (major, minor) = spec.split_once('.')?;
    if minor.contains('.') {
        None
    } else {
        Some((major, minor))
    }
}

/// First two dot-separated segments of a version.
fn minor_of(version: &str) -> Option<(&str, &str)> {
    let mut segments = version.split('.');
    Some((segments.next()?, segments.next()?))
}
