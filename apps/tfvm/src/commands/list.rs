//! List command.
//!
//! ## Output Format
//!
//! ```text
//! Installed versions:
//! * 1.5.7
//!   1.0.2
//! ```

use anyhow::Result;
use clap::Args;
use tfvm_engine::HttpReleases;

use super::open_manager;

/// Arguments for the list command.
#[derive(Args)]
pub struct ListArgs {
    /// Print a JSON array of `{ "version", "active" }` objects.
    #[clap(long = "json", action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

/// Executes the list command.
///
/// # Errors
///
/// Returns an error if the version store cannot be read.
pub fn execute(args: &ListArgs) -> Result<()> {
    let manager = open_manager(HttpReleases::new())?;
    let versions = manager.list()?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&versions)?);
        return Ok(());
    }

    if versions.is_empty() {
        println!("No versions installed.");
        println!();
        println!("Run 'tfvm install' to install the latest release.");
        return Ok(());
    }

    println!("Installed versions:");
    for entry in &versions {
        let marker = if entry.active { "*" } else { " " };
        println!("{marker} {}", entry.version);
    }
    Ok(())
}
