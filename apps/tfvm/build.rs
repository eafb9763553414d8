//! Build script for the tfvm binary.
//!
//! Embeds the short git commit hash shown by `tfvm --version`.

use std::process::Command;

fn main() {
    let commit = git_commit();
    println!("cargo:rustc-env=TFVM_GIT_COMMIT={commit}");

    if let Some(top_level) = git_top_level() {
        println!("cargo:rerun-if-changed={top_level}/.git/HEAD");
    }
}

fn git_output(args: &[&str]) -> Option<String> {
    let output = Command::new("git").args(args).output().ok()?;
    if !output.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!text.is_empty()).then_some(text)
}

fn git_top_level() -> Option<String> {
    git_output(&["rev-parse", "--show-toplevel"])
}

fn git_commit() -> String {
    git_output(&["rev-parse", "--short", "HEAD"]).unwrap_or_else(|| "unknown".to_string())
}
