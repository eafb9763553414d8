//! Installed and available version listings.
//!
//! Installed versions come from the file names in the version store.
//! Available versions are scraped from the releases index page, whose anchor
//! texts look like `terraform_1.5.7`. The index lists newest first and that
//! order is kept.

use std::cmp::Ordering;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::{Result, TfvmError};
use crate::source::ReleaseSource;

const ANCHOR_PATTERN: &str = r"(?is)<a\b[^>]*>(.*?)</a\s*>";
const TAG_PATTERN: &str = r"(?s)<[^>]*>";

/// Read-only view over the local store and the remote index.
pub struct VersionCatalog<'a> {
    config: &'a Config,
    source: &'a dyn ReleaseSource,
}

impl<'a> VersionCatalog<'a> {
    #[must_use]
    pub fn new(config: &'a Config, source: &'a dyn ReleaseSource) -> Self {
        Self { config, source }
    }

    /// Versions present in the store, newest first.
    ///
    /// Only regular files are considered. Names that do not follow the
    /// `<tool><version><ext>` pattern are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns `StoreUnreadable` if the store directory cannot be listed.
    pub fn list_installed(&self) -> Result<Vec<String>> {
        let paths = &self.config.paths;
        let store_err = |e: std::io::Error| TfvmError::store_unreadable(paths.versions.clone(), e);

        let mut versions = Vec::new();
        for entry in std::fs::read_dir(&paths.versions).map_err(store_err)? {
            let entry = entry.map_err(store_err)?;
            if !entry.file_type().map_err(store_err)?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(name = ?entry.file_name(), "skipping non UTF-8 store entry");
                continue;
            };
            match parse_store_file_name(&name, paths.tool(), paths.extension()) {
                Ok(version) => versions.push(version),
                Err(e) => warn!(%name, error = %e, "skipping store entry"),
            }
        }

        versions.sort_by(|a, b| newest_first(a, b));
        Ok(versions)
    }

    /// Stable releases published for the configured platform, in index order.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if the index cannot be fetched and `ParseError`
    /// if it contains no anchors at all.
    pub async fn list_available(&self) -> Result<Vec<String>> {
        let html = self.source.fetch_index(&self.config.index_url()).await?;
        let versions = parse_release_index(&html, self.config.paths.tool())?;
        let platform = self.config.platform;

        Ok(versions
            .into_iter()
            .filter(|v| {
                let supported = platform.supports_release(v);
                if !supported {
                    debug!(version = %v, %platform, "not published for platform");
                }
                supported
            })
            .collect())
    }

    /// # Errors
    ///
    /// Same as [`Self::list_installed`].
    pub fn is_installed(&self, version: &str) -> Result<bool> {
        Ok(self.list_installed()?.iter().any(|v| v == version))
    }

    /// # Errors
    ///
    /// Same as [`Self::list_available`].
    pub async fn is_available(&self, version: &str) -> Result<bool> {
        Ok(self.list_available().await?.iter().any(|v| v == version))
    }
}

/// Extracts stable versions from a releases index page, in page order.
///
/// Every anchor whose text mentions `tool` contributes the segment between
/// the first and second underscore of that text. Versions containing `-`
/// (pre-releases) are dropped. Anchors without an underscore are skipped.
///
/// # Errors
///
/// Returns `ParseError` if the page has no anchors, which means it is not a
/// releases index at all.
pub fn parse_release_index(html: &str, tool: &str) -> Result<Vec<String>> {
    let anchor = Regex::new(ANCHOR_PATTERN)
        .map_err(|e| TfvmError::parse_error(format!("anchor pattern: {e}")))?;
    let tag = Regex::new(TAG_PATTERN)
        .map_err(|e| TfvmError::parse_error(format!("tag pattern: {e}")))?;

    let mut anchors = 0usize;
    let mut versions = Vec::new();
    for captures in anchor.captures_iter(html) {
        anchors += 1;
        let text = tag.replace_all(&captures[1], "");
        let text = text.trim();
        if !text.contains(tool) {
            continue;
        }
        let Some(version) = text.split('_').nth(1) else {
            debug!(text, "anchor has no version segment");
            continue;
        };
        if version.is_empty() || version.contains('-') {
            continue;
        }
        versions.push(version.to_string());
    }

    if anchors == 0 {
        return Err(TfvmError::parse_error(
            "release index contains no links".to_string(),
        ));
    }
    Ok(versions)
}

/// Recovers the version from a store file name such as `terraform1.5.7.exe`.
///
/// # Errors
///
/// Returns `ParseError` if the name lacks the tool prefix or the executable
/// suffix, or if what remains does not start with a digit.
pub fn parse_store_file_name(name: &str, tool: &str, extension: &str) -> Result<String> {
    let rest = name
        .strip_prefix(tool)
        .ok_or_else(|| TfvmError::parse_error(format!("'{name}' does not start with '{tool}'")))?;
    let version = rest.strip_suffix(extension).ok_or_else(|| {
        TfvmError::parse_error(format!("'{name}' does not end with '{extension}'"))
    })?;

    if version.starts_with(|c: char| c.is_ascii_digit()) {
        Ok(version.to_string())
    } else {
        Err(TfvmError::parse_error(format!(
            "'{name}' has no version after '{tool}'"
        )))
    }
}

/// Semver versions first, newest to oldest; anything else after, by name.
fn newest_first(a: &str, b: &str) -> Ordering {
    match (semver::Version::parse(a), semver::Version::parse(b)) {
        (Ok(a), Ok(b)) => b.cmp(&a),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    use async_trait::async_trait;

    use crate::paths::StorePaths;
    use crate::platform::Platform;

    const INDEX: &str = r#"<!DOCTYPE html>
<html>
<head><title>Terraform Versions | HashiCorp Releases</title></head>
<body>
<ul>
  <li><a href="../">../</a></li>
  <li><a href="/terraform/1.6.0-beta1/">terraform_1.6.0-beta1</a></li>
  <li><a href="/terraform/1.5.7/">terraform_1.5.7</a></li>
  <li><a href="/terraform/1.0.2/">
      terraform_1.0.2
  </a></li>
  <li><a href="/terraform/1.0.1/">terraform_1.0.1</a></li>
  <li><a href="/terraform/0.15.5/"><span>terraform_0.15.5</span></a></li>
  <li><a href="/vault/1.2.3/">vault_1.2.3</a></li>
</ul>
</body>
</html>"#;

    struct StaticIndex(&'static str);

    #[async_trait]
    impl ReleaseSource for StaticIndex {
        async fn fetch_index(&self, _url: &str) -> Result<String> {
            Ok(self.0.to_string())
        }

        async fn download(&self, url: &str, _dest: &Path) -> Result<()> {
            Err(TfvmError::network_error(format!("unexpected download {url}")))
        }
    }

    fn config(root: &Path, platform: Platform) -> Config {
        let paths = StorePaths::with_root(root.to_path_buf(), "terraform", "");
        Config::new(paths, platform)
    }

    #[test]
    fn index_parsing_keeps_page_order_and_drops_prereleases() {
        let versions = parse_release_index(INDEX, "terraform").unwrap();
        assert_eq!(versions, vec!["1.5.7", "1.0.2", "1.0.1", "0.15.5"]);
    }

    #[test]
    fn index_without_anchors_is_a_parse_error() {
        let err = parse_release_index("<html><body>maintenance</body></html>", "terraform")
            .unwrap_err();
        assert!(matches!(err, TfvmError::ParseError { .. }));
    }

    #[test]
    fn index_with_only_foreign_anchors_is_empty() {
        let html = r#"<a href="/vault/">vault_1.0.0</a><a href="/x">terraform</a>"#;
        assert!(parse_release_index(html, "terraform").unwrap().is_empty());
    }

    #[test]
    fn store_file_names_parse() {
        assert_eq!(
            parse_store_file_name("terraform1.5.7", "terraform", "").unwrap(),
            "1.5.7"
        );
        assert_eq!(
            parse_store_file_name("terraform0.12.31.exe", "terraform", ".exe").unwrap(),
            "0.12.31"
        );
    }

    #[test]
    fn malformed_store_file_names_are_rejected() {
        for name in ["terraform", "tofu1.6.0", "terraform.zip", "terraform1.5.7"] {
            assert!(
                parse_store_file_name(name, "terraform", ".exe").is_err(),
                "{name} should not parse"
            );
        }
        assert!(parse_store_file_name("terraformx", "terraform", "").is_err());
    }

    #[test]
    fn newest_first_orders_semver_then_names() {
        let mut versions = vec!["0.9.9", "nightly", "1.10.0", "1.2.0", "1.2.0-rc1"];
        versions.sort_by(|a, b| newest_first(a, b));
        assert_eq!(versions, vec!["1.10.0", "1.2.0", "1.2.0-rc1", "0.9.9", "nightly"]);
    }

    #[test]
    fn list_installed_reads_store_and_skips_junk() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = config(temp.path(), Platform::LinuxAmd64);
        config.paths.ensure_directories().unwrap();
        for name in ["terraform1.0.2", "terraform1.5.7", "README", "terraform"] {
            std::fs::write(config.paths.versions.join(name), b"bin").unwrap();
        }
        std::fs::create_dir(config.paths.versions.join("terraform9.9.9")).unwrap();

        let source = StaticIndex(INDEX);
        let catalog = VersionCatalog::new(&config, &source);

        assert_eq!(catalog.list_installed().unwrap(), vec!["1.5.7", "1.0.2"]);
        assert!(catalog.is_installed("1.0.2").unwrap());
        assert!(!catalog.is_installed("9.9.9").unwrap());
    }

    #[test]
    fn list_installed_without_store_is_unreadable() {
        let temp = assert_fs::TempDir::new().unwrap();
        let config = config(&temp.path().join("missing"), Platform::LinuxAmd64);
        let source = StaticIndex(INDEX);

        let err = VersionCatalog::new(&config, &source)
            .list_installed()
            .unwrap_err();
        assert!(matches!(err, TfvmError::StoreUnreadable { .. }));
    }

    #[tokio::test]
    async fn list_available_filters_apple_silicon() {
        let temp = assert_fs::TempDir::new().unwrap();
        let source = StaticIndex(INDEX);

        let linux = config(temp.path(), Platform::LinuxAmd64);
        let catalog = VersionCatalog::new(&linux, &source);
        assert_eq!(
            catalog.list_available().await.unwrap(),
            vec!["1.5.7", "1.0.2", "1.0.1", "0.15.5"]
        );
        assert!(catalog.is_available("0.15.5").await.unwrap());

        let mac = config(temp.path(), Platform::DarwinArm64);
        let catalog = VersionCatalog::new(&mac, &source);
        assert_eq!(catalog.list_available().await.unwrap(), vec!["1.5.7", "1.0.2"]);
        assert!(!catalog.is_available("1.0.1").await.unwrap());
    }
}
