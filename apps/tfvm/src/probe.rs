//! Detects the active version by running the active binary.

use std::process::Command;

use tfvm_engine::StorePaths;
use tracing::debug;

/// Runs `<bin>/terraform -v` and returns the version it reports.
///
/// Any failure (no link, not executable, unexpected output) means no
/// version is active.
pub fn current_version(paths: &StorePaths) -> Option<String> {
    let link = paths.active_link();
    if !link.exists() {
        debug!(link = %link.display(), "no active link");
        return None;
    }

    let output = match Command::new(&link).arg("-v").output() {
        Ok(output) => output,
        Err(e) => {
            debug!(link = %link.display(), error = %e, "active binary did not run");
            return None;
        }
    };
    if !output.status.success() {
        debug!(status = %output.status, "active binary failed");
        return None;
    }

    let version = parse_version_output(&String::from_utf8_lossy(&output.stdout));
    debug!(?version, "probed active version");
    version
}

/// Extracts `1.5.7` from output such as `Terraform v1.5.7\non linux_amd64`.
///
/// The version is everything after the first `v` up to the end of that line.
pub fn parse_version_output(output: &str) -> Option<String> {
    let (_, rest) = output.split_once('v')?;
    let version = rest.lines().next()?.trim();
    (!version.is_empty()).then(|| version.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_terraform_banner() {
        assert_eq!(
            parse_version_output("Terraform v1.5.7\non linux_amd64\n").as_deref(),
            Some("1.5.7")
        );
        assert_eq!(
            parse_version_output("Terraform v0.12.31\r\n").as_deref(),
            Some("0.12.31")
        );
    }

    #[test]
    fn output_without_version_is_none() {
        assert_eq!(parse_version_output(""), None);
        assert_eq!(parse_version_output("Terraform\n"), None);
        assert_eq!(parse_version_output("Terraform v\n"), None);
    }

    #[test]
    fn missing_link_is_no_version() {
        let temp = assert_fs::TempDir::new().unwrap();
        let paths = StorePaths::with_root(temp.path().to_path_buf(), "terraform", "");
        assert_eq!(current_version(&paths), None);
    }
}
