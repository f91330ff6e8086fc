//! Media download operations.

use crate::error::{ClientError, Result};
use crate::types::DownloadProgress;
use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

/// Download client for resolved stream URLs.
pub struct DownloadClient<'a> {
    http: &'a Client,
}

impl<'a> DownloadClient<'a> {
    pub(crate) fn new(http: &'a Client) -> Self {
        Self { http }
    }

    /// Download `url` into `dest_path`.
    ///
    /// Parent directories are created as needed. `progress_callback` is
    /// called after every received chunk.
    ///
    /// # Returns
    /// The number of bytes written.
    pub async fn download_to<F>(
        &self,
        url: &str,
        dest_path: &Path,
        mut progress_callback: F,
    ) -> Result<u64>
    where
        F: FnMut(DownloadProgress),
    {
        debug!(url = %url, dest = %dest_path.display(), "Downloading media");

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_connect() || e.is_timeout() {
                ClientError::ServerUnreachable(e.to_string())
            } else {
                ClientError::Request(e)
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let message = if status == StatusCode::NOT_FOUND {
                format!("Media not found: {}", url)
            } else {
                response.text().await.unwrap_or_default()
            };
            return Err(ClientError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let total_size = response.content_length();

        if let Some(parent) = dest_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = File::create(dest_path).await?;
        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            let progress = total_size
                .filter(|total| *total > 0)
                .map_or(0.0, |total| downloaded as f32 / total as f32);
            progress_callback(DownloadProgress {
                bytes_received: downloaded,
                bytes_total: total_size,
                progress,
            });
        }

        file.flush().await?;

        info!(
            url = %url,
            dest = %dest_path.display(),
            size = downloaded,
            "Media downloaded"
        );

        Ok(downloaded)
    }
}
