use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{SyncError, SyncResult};

/// Something that can put the bytes behind `url` at `dest`.
///
/// The orchestrator only depends on this seam, so the retry loop can be
/// driven without a network.
#[async_trait]
pub trait FileFetcher: Send + Sync {
    /// Write the remote file to `dest`, truncating anything already there.
    /// Returns the number of bytes written.
    async fn fetch_to(&self, url: &str, dest: &Path) -> SyncResult<u64>;
}

/// Sequential, streaming HTTP downloader.
pub struct Downloader {
    client: Client,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    // ── Single file download ────────────────────────────

    /// Stream `url` into `dest` chunk by chunk.
    ///
    /// Creates parent directories as needed. The file handle is dropped
    /// before returning so the caller can hash or delete it immediately.
    pub async fn download_file(&self, url: &str, dest: &Path) -> SyncResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::Io {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }

        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let io_err = |e: std::io::Error| SyncError::Io {
            path: dest.to_path_buf(),
            source: e,
        };

        let mut written = 0u64;
        {
            let mut file = tokio::fs::File::create(dest).await.map_err(io_err)?;
            let mut stream = response.bytes_stream();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk).await.map_err(io_err)?;
                written += chunk.len() as u64;
            }
            file.flush().await.map_err(io_err)?;
        }

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, written);
        Ok(written)
    }
}

#[async_trait]
impl FileFetcher for Downloader {
    async fn fetch_to(&self, url: &str, dest: &Path) -> SyncResult<u64> {
        self.download_file(url, dest).await
    }
}
