//! Use command.
//!
//! ## Usage
//!
//! ```bash
//! tfvm use 1.5.7    # exact installed version
//! tfvm use 1.5      # first installed 1.5.x
//! tfvm use          # version named in ./.tfversion
//! ```

use anyhow::Result;
use clap::Args;
use tfvm_engine::HttpReleases;

use super::open_manager;

/// Arguments for the use command.
#[derive(Args)]
pub struct UseArgs {
    /// Installed version to activate.
    ///
    /// If omitted, the first non-empty line of .tfversion is used.
    pub version: Option<String>,
}

/// Executes the use command.
///
/// # Errors
///
/// Returns an error if no version is given or found in .tfversion, if the
/// version is not installed, or if the active link cannot be replaced.
pub fn execute(args: &UseArgs) -> Result<()> {
    let mut manager = open_manager(HttpReleases::new())?;
    let outcome = manager.use_version(args.version.as_deref())?;

    if outcome.changed {
        println!("Now using terraform {}.", outcome.version);
    } else {
        println!("terraform {} is already in use.", outcome.version);
    }
    Ok(())
}
