//! Remove command.
//!
//! ## Usage
//!
//! ```bash
//! tfvm remove 1.0.2
//! ```

use anyhow::Result;
use clap::Args;
use tfvm_engine::HttpReleases;

use super::open_manager;

/// Arguments for the remove command.
#[derive(Args)]
pub struct RemoveArgs {
    /// Installed version to remove (exact or MAJOR.MINOR, never "latest").
    pub version: String,
}

/// Executes the remove command.
///
/// # Errors
///
/// Returns an error if the version is not installed or its files cannot be
/// deleted.
pub fn execute(args: &RemoveArgs) -> Result<()> {
    let mut manager = open_manager(HttpReleases::new())?;
    let had_link = manager.config().paths.has_active_link();

    let version = manager.remove(&args.version)?;
    println!("Removed terraform {version}.");

    if had_link && !manager.config().paths.has_active_link() {
        println!("No version is active now. Run 'tfvm use <version>' to pick one.");
    }
    Ok(())
}
