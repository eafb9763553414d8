#![warn(clippy::pedantic)]

//! # tfvm
//!
//! Installs Terraform releases side by side under `~/.tfvm/versions` and
//! exposes one of them as `~/.tfvm/bin/terraform`. Add `~/.tfvm/bin` to
//! `PATH` to pick it up.
//!
//! ## Subcommands
//!
//! - `install` - Download a release (or list installable ones)
//! - `use` - Switch the active release
//! - `remove` - Delete an installed release
//! - `list` - Show installed releases
//!
//! ## Examples
//!
//! ```bash
//! tfvm install          # newest stable release
//! tfvm install 1.5      # newest 1.5.x release
//! tfvm use 1.5.7
//! tfvm use              # version from ./.tfversion
//! ```

mod commands;
mod probe;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{install, list, remove, use_cmd};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TFVM_LOG";

const VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("TFVM_GIT_COMMIT"),
    ")"
);

/// Terraform version manager.
#[derive(Parser)]
#[command(
    name = "tfvm",
    author,
    version = VERSION,
    about = "Install and switch between Terraform versions",
    after_help = "\
ENVIRONMENT VARIABLES:
    TFVM_HOME               Root directory (default: ~/.tfvm)
    TFVM_RELEASES_URL       Releases host (default: https://releases.hashicorp.com/terraform)
    TFVM_LINK_MODE          'hard' (default) or 'symlink'
    TFVM_LOG                Log filter, e.g. 'debug' (default: warn)
    PAGER                   Pager for 'install --list'"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// Install a Terraform version.
    ///
    /// Accepts an exact version, a MAJOR.MINOR prefix (newest matching
    /// patch) or "latest". Without a version, installs the newest stable
    /// release. The first installed version becomes active.
    Install(install::InstallArgs),

    /// Switch the active Terraform version.
    ///
    /// Without a version, reads it from .tfversion in the current directory.
    Use(use_cmd::UseArgs),

    /// Remove an installed Terraform version.
    Remove(remove::RemoveArgs),

    /// List installed Terraform versions.
    List(list::ListArgs),
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();

    if let Err(e) = run().await {
        let exit_code = handle_error(&e);
        std::process::exit(exit_code);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints the error chain and returns the exit code.
fn handle_error(e: &anyhow::Error) -> i32 {
    eprintln!("Error: {e:?}");
    1
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Install(args) => install::execute(&args).await,
        Commands::Use(args) => use_cmd::execute(&args),
        Commands::Remove(args) => remove::execute(&args),
        Commands::List(args) => list::execute(&args),
    }
}
