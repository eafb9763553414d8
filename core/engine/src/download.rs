//! HTTP download of release archives.
//!
//! The body is streamed to `<dest>.tmp` and renamed over `dest` once the
//! last chunk is flushed, so an existing file is only replaced by a complete
//! one. A single attempt is made: failures surface immediately and any retry
//! policy belongs to the caller. No timeout is applied here either.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::errors::{Result, TfvmError};

/// Progress event emitted during downloads.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    /// Download has started.
    Started {
        /// The URL being downloaded.
        url: String,
        /// Total size in bytes, `0` when the server sent no length.
        total: u64,
    },
    /// Download progress update.
    Progress {
        /// Bytes downloaded so far.
        downloaded: u64,
        /// Current download speed in bytes per second.
        speed: u64,
    },
    /// Download completed successfully.
    Completed,
    /// Download failed with an error.
    Failed {
        /// Error description.
        error: String,
    },
}

/// Callback type for receiving progress updates during downloads.
pub type ProgressCallback = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// Minimum interval between progress callback invocations in milliseconds.
const PROGRESS_CALLBACK_INTERVAL_MS: u128 = 100;

/// Downloads `url` to `dest`, overwriting any existing file.
///
/// # Errors
///
/// Returns a `NetworkError` on transport failure or a non-2xx status, and an
/// `IoError` if the destination cannot be created, written or renamed.
pub async fn download_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    callback: Option<&ProgressCallback>,
) -> Result<()> {
    let temp_path = dest.with_extension("tmp");

    if let Some(parent) = dest.parent() {
        crate::paths::create_dir_all(parent)?;
    }

    info!(url, dest = %dest.display(), "downloading archive");
    match stream_to_file(client, url, &temp_path, callback).await {
        Ok(()) => {
            tokio::fs::rename(&temp_path, dest).await.map_err(|e| {
                TfvmError::io_error(
                    format!(
                        "Failed to rename {} to {}",
                        temp_path.display(),
                        dest.display()
                    ),
                    e,
                )
            })?;
            if let Some(cb) = callback {
                cb(ProgressEvent::Completed);
            }
            Ok(())
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&temp_path).await;
            if let Some(cb) = callback {
                cb(ProgressEvent::Failed {
                    error: e.to_string(),
                });
            }
            Err(e)
        }
    }
}

async fn stream_to_file(
    client: &reqwest::Client,
    url: &str,
    dest: &Path,
    callback: Option<&ProgressCallback>,
) -> Result<()> {
    let response = client.get(url).send().await.map_err(|e| {
        TfvmError::network_error_with_source(format!("Failed to connect to {url}"), e)
    })?;

    if !response.status().is_success() {
        return Err(TfvmError::network_error(format!(
            "HTTP error {}: {url}",
            response.status()
        )));
    }

    let total = response.content_length().unwrap_or(0);
    debug!(total, "response accepted");
    if let Some(cb) = callback {
        cb(ProgressEvent::Started {
            url: url.to_string(),
            total,
        });
    }

    let mut file = tokio::fs::File::create(dest).await.map_err(|e| {
        TfvmError::io_error(format!("Failed to create file: {}", dest.display()), e)
    })?;

    let mut stream = response.bytes_stream();
    let mut downloaded: u64 = 0;
    let start_time = Instant::now();
    let mut last_callback_time = Instant::now();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| {
            TfvmError::network_error_with_source(format!("Failed to read chunk from {url}"), e)
        })?;
        file.write_all(&chunk).await.map_err(|e| {
            TfvmError::io_error(format!("Failed to write to {}", dest.display()), e)
        })?;
        downloaded += chunk.len() as u64;

        if let Some(cb) = callback {
            let now = Instant::now();
            if now.duration_since(last_callback_time).as_millis()
                >= PROGRESS_CALLBACK_INTERVAL_MS
            {
                cb(ProgressEvent::Progress {
                    downloaded,
                    speed: bytes_per_second(downloaded, start_time.elapsed().as_secs_f64()),
                });
                last_callback_time = now;
            }
        }
    }

    file.flush()
        .await
        .map_err(|e| TfvmError::io_error(format!("Failed to flush {}", dest.display()), e))?;

    if let Some(cb) = callback {
        cb(ProgressEvent::Progress {
            downloaded,
            speed: bytes_per_second(downloaded, start_time.elapsed().as_secs_f64()),
        });
    }
    debug!(downloaded, "download finished");

    Ok(())
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn bytes_per_second(downloaded: u64, elapsed_secs: f64) -> u64 {
    if elapsed_secs > 0.0 {
        (downloaded as f64 / elapsed_secs) as u64
    } else {
        0
    }
}
