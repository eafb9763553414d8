//! Subcommand implementations.
//!
//! - [`install`] - Download a release, or list installable ones
//! - [`use_cmd`] - Switch the active release
//! - [`remove`] - Delete an installed release
//! - [`list`] - Show installed releases

pub mod install;
pub mod list;
pub mod remove;
pub mod use_cmd;

use anyhow::Result;
use tfvm_engine::{Config, Manager, ReleaseSource};

use crate::probe;

/// Loads the config, prepares the store and probes the active version.
pub(crate) fn open_manager<S: ReleaseSource>(source: S) -> Result<Manager<S>> {
    let config = Config::from_env()?;
    config.paths.ensure_directories()?;
    let current = probe::current_version(&config.paths);
    Ok(Manager::new(config, source, current))
}
