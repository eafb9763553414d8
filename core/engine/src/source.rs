//! Where release data comes from.
//!
//! The catalog and the manager only talk to a [`ReleaseSource`]. The binary
//! uses [`HttpReleases`]; tests substitute an in-memory implementation.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::download::{ProgressCallback, download_file};
use crate::errors::{Result, TfvmError};

/// Access to a releases host.
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Fetches the HTML index page listing every release.
    async fn fetch_index(&self, url: &str) -> Result<String>;

    /// Downloads a release archive to `dest`, replacing any existing file.
    async fn download(&self, url: &str, dest: &Path) -> Result<()>;
}

/// [`ReleaseSource`] backed by HTTP.
pub struct HttpReleases {
    client: reqwest::Client,
    progress: Option<ProgressCallback>,
}

impl HttpReleases {
    /// Creates a source with a default client and no progress reporting.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            progress: None,
        }
    }

    /// Reports download progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = Some(callback);
        self
    }
}

impl Default for HttpReleases {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReleaseSource for HttpReleases {
    async fn fetch_index(&self, url: &str) -> Result<String> {
        debug!(url, "fetching release index");
        let response = self.client.get(url).send().await.map_err(|e| {
            TfvmError::network_error_with_source(format!("Failed to fetch {url}"), e)
        })?;

        if !response.status().is_success() {
            return Err(TfvmError::network_error(format!(
                "HTTP error {}: {url}",
                response.status()
            )));
        }

        response.text().await.map_err(|e| {
            TfvmError::network_error_with_source(format!("Failed to read body of {url}"), e)
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<()> {
        download_file(&self.client, url, dest, self.progress.as_ref()).await
    }
}
