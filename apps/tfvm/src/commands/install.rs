//! Install command.
//!
//! ## Usage
//!
//! ```bash
//! tfvm install          # newest stable release
//! tfvm install 1.5.7    # exact version
//! tfvm install 1.5      # newest 1.5.x in the release index
//! tfvm install --list   # installable versions, through $PAGER if set
//! ```

use std::io::Write;
use std::process::{Command, Stdio};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use tfvm_engine::{Config, HttpReleases, Manager, ProgressCallback, ProgressEvent};

use super::open_manager;

/// Environment variable naming the pager for `--list`.
const PAGER_ENV: &str = "PAGER";

/// Arguments for the install command.
#[derive(Args)]
pub struct InstallArgs {
    /// Version to install: exact, MAJOR.MINOR, or "latest".
    ///
    /// If omitted, installs the newest stable release.
    pub version: Option<String>,

    /// List installable versions instead of installing.
    #[clap(short = 'l', long = "list", conflicts_with = "version")]
    pub list: bool,
}

/// Executes the install command.
///
/// # Errors
///
/// Returns an error if the release index cannot be fetched or parsed, the
/// version does not resolve or is already installed, or the download or
/// extraction fails.
pub async fn execute(args: &InstallArgs) -> Result<()> {
    if args.list {
        return list_available().await;
    }

    let source = HttpReleases::new().with_progress(progress_printer());
    let mut manager = open_manager(source)?;
    let spec = args.version.as_deref().unwrap_or_default();

    println!(
        "Installing terraform {} for {}...",
        if spec.is_empty() { "latest" } else { spec },
        manager.config().platform
    );
    let outcome = manager.install(spec).await?;

    println!("Terraform {} installed successfully.", outcome.version);
    if outcome.activated {
        println!("Now using terraform {}.", outcome.version);
    } else {
        println!("Run 'tfvm use {}' to switch to it.", outcome.version);
    }
    Ok(())
}

async fn list_available() -> Result<()> {
    let manager = Manager::new(Config::from_env()?, HttpReleases::new(), None);
    let versions = manager.catalog().list_available().await?;
    page(&versions.join("\n"))
}

/// Writes `text` through `$PAGER`, or straight to stdout when it is unset.
fn page(text: &str) -> Result<()> {
    let Some(pager) = std::env::var(PAGER_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
    else {
        println!("{text}");
        return Ok(());
    };

    let mut parts = pager.split_whitespace();
    let program = parts.next().unwrap_or_default();
    let mut child = Command::new(program)
        .args(parts)
        .stdin(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to start pager '{pager}'"))?;

    if let Some(mut stdin) = child.stdin.take() {
        // The pager may exit before reading everything.
        let _ = writeln!(stdin, "{text}");
    }
    child
        .wait()
        .with_context(|| format!("Pager '{pager}' did not finish"))?;
    Ok(())
}

/// Prints a single self-updating progress line.
fn progress_printer() -> ProgressCallback {
    Arc::new(|event: ProgressEvent| match event {
        ProgressEvent::Started { url, .. } => println!("Downloading {url}"),
        ProgressEvent::Progress { downloaded, speed } => {
            print!(
                "\r  {} ({}/s)   ",
                format_bytes(downloaded),
                format_bytes(speed)
            );
            let _ = std::io::stdout().flush();
        }
        ProgressEvent::Completed => println!(),
        ProgressEvent::Failed { .. } => {}
    })
}

#[allow(clippy::cast_precision_loss)]
fn format_bytes(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    if bytes >= 1024 * 1024 {
        format!("{:.1} MiB", bytes as f64 / MIB)
    } else {
        format!("{:.1} KiB", bytes as f64 / 1024.0)
    }
}
