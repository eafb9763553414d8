#![warn(clippy::pedantic)]
//! Version store and activation engine for tfvm.
//!
//! tfvm keeps several releases of a single tool side by side and exposes
//! exactly one of them on `PATH` through a link in `<root>/bin`.
//!
//! ## Layers
//!
//! ```text
//! Manager ──► resolver ──► VersionCatalog ──► ReleaseSource (index page)
//!    │                           └──────────► versions/ directory
//!    ├──────► ReleaseSource::download ──► archive::extract_zip ──► staging/
//!    └──────► bin/<tool> link swap
//! ```
//!
//! - [`catalog`] lists installed versions (from the store) and available
//!   versions (scraped from the releases index).
//! - [`resolver`] turns a specifier (`""`, `latest`, `1.5`, `1.5.7`) into a
//!   concrete version from a catalog.
//! - [`download`] and [`archive`] fetch and unpack release zips.
//! - [`manager`] runs `install`, `use`, `remove` and `list`.
//!
//! The engine never terminates the process and never reads environment
//! variables after [`Config::from_env`] returns.
//!
//! ```rust,no_run
//! use tfvm_engine::{Config, HttpReleases, Manager};
//!
//! # async fn run() -> tfvm_engine::Result<()> {
//! let config = Config::from_env()?;
//! let mut manager = Manager::new(config, HttpReleases::new(), None);
//! let outcome = manager.install("1.5").await?;
//! println!("installed {}", outcome.version);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod catalog;
pub mod config;
pub mod download;
pub mod errors;
pub mod lock;
pub mod manager;
pub mod marker;
pub mod paths;
pub mod platform;
pub mod resolver;
pub mod source;

pub use catalog::VersionCatalog;
pub use config::{Config, LinkMode};
pub use download::{ProgressCallback, ProgressEvent};
pub use errors::{Result, TfvmError};
pub use manager::{InstallOutcome, ListedVersion, Manager, UseOutcome};
pub use paths::StorePaths;
pub use platform::Platform;
pub use resolver::resolve;
pub use source::{HttpReleases, ReleaseSource};
