//! End-to-end store lifecycle against an in-memory releases host.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tfvm_engine::{
    Config, LinkMode, Manager, Platform, ReleaseSource, Result, StorePaths, TfvmError,
};
use zip::write::SimpleFileOptions;

/// Releases host stub: a fixed index and zips containing a `terraform` entry.
struct StubHost {
    versions: Vec<&'static str>,
    page: Option<&'static str>,
    requested: Mutex<Vec<String>>,
}

impl StubHost {
    fn new(versions: &[&'static str]) -> Self {
        Self {
            versions: versions.to_vec(),
            page: None,
            requested: Mutex::new(Vec::new()),
        }
    }

    /// Serves `page` verbatim as the index.
    fn with_page(page: &'static str) -> Self {
        Self {
            page: Some(page),
            ..Self::new(&[])
        }
    }
}

#[async_trait]
impl ReleaseSource for StubHost {
    async fn fetch_index(&self, _url: &str) -> Result<String> {
        if let Some(page) = self.page {
            return Ok(page.to_string());
        }
        let items: String = self
            .versions
            .iter()
            .map(|v| format!("<li><a href=\"/terraform/{v}/\">terraform_{v}</a></li>"))
            .collect();
        Ok(format!(
            "<html><body><ul><li><a href=\"../\">../</a></li>{items}</ul></body></html>"
        ))
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        self.requested.lock().unwrap().push(url.to_string());
        let version = url.rsplit('/').nth(1).unwrap_or_default().to_string();

        let file = std::fs::File::create(dest).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = SimpleFileOptions::default().unix_permissions(0o755);
        zip.start_file("terraform", options).unwrap();
        write!(zip, "#!/bin/sh\necho Terraform v{version}\n").unwrap();
        zip.start_file("LICENSE.txt", options).unwrap();
        zip.write_all(b"MPL-2.0").unwrap();
        zip.finish().unwrap();
        Ok(())
    }
}

fn config(root: &Path) -> Config {
    let paths = StorePaths::with_root(root.to_path_buf(), "terraform", "");
    Config::new(paths, Platform::LinuxAmd64)
        .with_releases_url("https://releases.test/terraform")
        .with_marker_file(root.join(".tfversion"))
}

fn store_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<_> = std::fs::read_dir(root.join("versions"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    files.sort();
    files
}

#[tokio::test]
async fn install_use_remove_round_trip() {
    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.path();
    let mut manager = Manager::new(config(root), StubHost::new(&["1.0.2"]), None);

    let outcome = manager.install("1.0.2").await.unwrap();
    assert_eq!(outcome.version, "1.0.2");
    assert_eq!(store_files(root), vec![root.join("versions").join("terraform1.0.2")]);
    assert!(manager.catalog().is_installed("1.0.2").unwrap());

    let used = manager.use_version(Some("1.0.2")).unwrap();
    assert_eq!(used.version, "1.0.2");
    let link = root.join("bin").join("terraform");
    assert_eq!(
        std::fs::read(&link).unwrap(),
        std::fs::read(root.join("versions").join("terraform1.0.2")).unwrap()
    );

    assert_eq!(manager.remove("1.0.2").unwrap(), "1.0.2");
    assert!(store_files(root).is_empty());
    assert!(link.symlink_metadata().is_err());
    assert_eq!(manager.current(), None);
    assert!(!manager.catalog().is_installed("1.0.2").unwrap());
}

#[tokio::test]
async fn exactly_one_link_after_switching() {
    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.path();
    let mut manager = Manager::new(config(root), StubHost::new(&["1.5.7", "1.0.2"]), None);
    manager.install("1.0.2").await.unwrap();
    manager.install("1.5.7").await.unwrap();

    manager.use_version(Some("1.5.7")).unwrap();
    manager.use_version(Some("1.0")).unwrap();

    let bin: Vec<_> = std::fs::read_dir(root.join("bin")).unwrap().collect();
    assert_eq!(bin.len(), 1);
    let contents = std::fs::read_to_string(root.join("bin").join("terraform")).unwrap();
    assert!(contents.contains("Terraform v1.0.2"));
}

#[cfg(unix)]
#[tokio::test]
async fn hard_link_shares_inode_with_store_file() {
    use std::os::unix::fs::MetadataExt;

    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.path();
    let mut manager = Manager::new(config(root), StubHost::new(&["1.0.2"]), None);
    manager.install("1.0.2").await.unwrap();

    let link = std::fs::metadata(root.join("bin").join("terraform")).unwrap();
    let stored = std::fs::metadata(root.join("versions").join("terraform1.0.2")).unwrap();
    assert_eq!(link.ino(), stored.ino());
    assert_eq!(link.mode() & 0o777, 0o755);
}

#[cfg(unix)]
#[tokio::test]
async fn use_is_idempotent_on_disk() {
    use std::os::unix::fs::MetadataExt;

    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.path();
    let host = StubHost::new(&["1.0.2"]);
    let mut manager = Manager::new(config(root).with_link_mode(LinkMode::Symbolic), host, None);
    manager.install("1.0.2").await.unwrap();

    let link = root.join("bin").join("terraform");
    let before = std::fs::symlink_metadata(&link).unwrap();
    let outcome = manager.use_version(Some("1.0.2")).unwrap();
    let after = std::fs::symlink_metadata(&link).unwrap();

    assert!(!outcome.changed);
    assert_eq!(before.ino(), after.ino());
    assert_eq!(before.ctime(), after.ctime());
}

#[tokio::test]
async fn reinstall_reports_already_installed_and_changes_nothing() {
    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.path();
    let mut manager = Manager::new(config(root), StubHost::new(&["1.0.2"]), None);
    manager.install("1.0.2").await.unwrap();
    let store_before = store_files(root);
    let link_before = std::fs::read(root.join("bin").join("terraform")).unwrap();

    let err = manager.install("1.0.2").await.unwrap_err();

    assert!(matches!(err, TfvmError::AlreadyInstalled { .. }));
    assert_eq!(store_files(root), store_before);
    assert_eq!(
        std::fs::read(root.join("bin").join("terraform")).unwrap(),
        link_before
    );
}

#[tokio::test]
async fn minor_specifier_installs_first_listed_patch() {
    let temp = assert_fs::TempDir::new().unwrap();
    let root = temp.path();
    let host = StubHost::new(&["1.1.0", "1.0.5", "1.0.3", "0.9.9"]);
    let mut manager = Manager::new(config(root), host, None);

    let outcome = manager.install("1.0").await.unwrap();

    assert_eq!(outcome.version, "1.0.5");
}

#[tokio::test]
async fn empty_remote_catalog_cannot_install_latest() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut manager = Manager::new(config(temp.path()), StubHost::new(&[]), None);

    let err = manager.install("").await.unwrap_err();

    assert!(matches!(err, TfvmError::EmptyCatalog));
    assert!(store_files(temp.path()).is_empty());
}

#[tokio::test]
async fn index_page_without_links_is_a_parse_error() {
    let temp = assert_fs::TempDir::new().unwrap();
    let host = StubHost::with_page("<html><body>Service Unavailable</body></html>");
    let mut manager = Manager::new(config(temp.path()), host, None);

    let err = manager.install("").await.unwrap_err();

    assert!(matches!(err, TfvmError::ParseError { .. }));
    assert!(store_files(temp.path()).is_empty());
}

#[tokio::test]
async fn removing_unknown_version_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let mut manager = Manager::new(config(temp.path()), StubHost::new(&["1.0.2"]), None);
    manager.install("1.0.2").await.unwrap();

    let err = manager.remove("1.5.7").unwrap_err();

    assert!(matches!(err, TfvmError::UnknownVersion { .. }));
    assert_eq!(store_files(temp.path()).len(), 1);
}
