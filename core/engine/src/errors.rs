//! Error types for the tfvm engine.
//!
//! Every core operation returns [`TfvmError`]. Nothing in the engine retries,
//! swallows, or terminates the process; the binary decides how a failure is
//! rendered and which exit code it maps to.

use std::path::PathBuf;
use thiserror::Error;

/// Convenience alias used throughout the engine.
pub type Result<T, E = TfvmError> = std::result::Result<T, E>;

/// Consolidated error type for version store and activation operations.
#[derive(Debug, Error)]
pub enum TfvmError {
    /// Transport failure or non-success HTTP status.
    #[error("network error: {message}")]
    NetworkError {
        /// Description of the failed request.
        message: String,
        /// The underlying transport error, when there is one.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The release index or a store entry could not be parsed.
    #[error("parse error: {message}")]
    ParseError {
        /// Description of what could not be parsed.
        message: String,
    },

    /// An archive entry would land outside the extraction directory.
    #[error("illegal file path in archive: {entry}")]
    IllegalPath {
        /// The raw entry name as stored in the archive.
        entry: String,
    },

    /// The version is not a member of the catalog it was checked against.
    #[error("unknown version: {version}")]
    UnknownVersion {
        /// The requested version.
        version: String,
    },

    /// The version already has a file in the version store.
    #[error("version {version} is already installed")]
    AlreadyInstalled {
        /// The version that is already present.
        version: String,
    },

    /// No catalog entry matched a `MAJOR.MINOR` specifier.
    #[error("no release matches minor version {spec}")]
    NoMatchingMinor {
        /// The minor specifier as given.
        spec: String,
    },

    /// "latest" was requested from an empty catalog.
    #[error("no versions available")]
    EmptyCatalog,

    /// The running OS/architecture has no published release archives.
    #[error("unsupported platform: {os} on {arch}")]
    UnsupportedPlatform {
        /// Operating system name.
        os: String,
        /// CPU architecture name.
        arch: String,
    },

    /// The version store directory could not be listed.
    #[error("cannot read version store {}", path.display())]
    StoreUnreadable {
        /// The store directory.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The downloaded archive is unreadable or lacks the tool binary.
    #[error("invalid archive: {message}")]
    InvalidArchive {
        /// Description of the problem.
        message: String,
    },

    /// No version was given and the project marker file supplied none.
    #[error("no version specified and no usable {}", marker.display())]
    NoVersionSpecified {
        /// The marker file that was consulted.
        marker: PathBuf,
    },
}

impl TfvmError {
    /// Creates a new `NetworkError` without an underlying source.
    #[must_use]
    pub fn network_error(message: impl Into<String>) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `NetworkError` wrapping a transport error.
    #[must_use]
    pub fn network_error_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::NetworkError {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new `IoError` from an I/O error with context.
    #[must_use]
    pub fn io_error(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::IoError {
            message: message.into(),
            source,
        }
    }

    /// Creates a new `ParseError`.
    #[must_use]
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self::ParseError {
            message: message.into(),
        }
    }

    /// Creates a new `IllegalPath` error.
    #[must_use]
    pub fn illegal_path(entry: impl Into<String>) -> Self {
        Self::IllegalPath {
            entry: entry.into(),
        }
    }

    /// Creates a new `UnknownVersion` error.
    #[must_use]
    pub fn unknown_version(version: impl Into<String>) -> Self {
        Self::UnknownVersion {
            version: version.into(),
        }
    }

    /// Creates a new `AlreadyInstalled` error.
    #[must_use]
    pub fn already_installed(version: impl Into<String>) -> Self {
        Self::AlreadyInstalled {
            version: version.into(),
        }
    }

    /// Creates a new `NoMatchingMinor` error.
    #[must_use]
    pub fn no_matching_minor(spec: impl Into<String>) -> Self {
        Self::NoMatchingMinor { spec: spec.into() }
    }

    /// Creates a new `UnsupportedPlatform` error.
    #[must_use]
    pub fn unsupported_platform(os: impl Into<String>, arch: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            os: os.into(),
            arch: arch.into(),
        }
    }

    /// Creates a new `StoreUnreadable` error.
    #[must_use]
    pub fn store_unreadable(path: PathBuf, source: std::io::Error) -> Self {
        Self::StoreUnreadable { path, source }
    }

    /// Creates a new `InvalidArchive` error.
    #[must_use]
    pub fn invalid_archive(message: impl Into<String>) -> Self {
        Self::InvalidArchive {
            message: message.into(),
        }
    }

    /// Creates a new `NoVersionSpecified` error.
    #[must_use]
    pub fn no_version_specified(marker: PathBuf) -> Self {
        Self::NoVersionSpecified { marker }
    }
}
