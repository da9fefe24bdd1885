//! Artifact download.

use reqwest::header::{HeaderValue, USER_AGENT};

use crate::config::UpdaterConfig;
use crate::context::UpdateContext;
use crate::error::{Result, UpdateError};

/// Download progress event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DownloadProgress {
    /// Bytes downloaded so far.
    pub downloaded: u64,
    /// Total bytes to download, zero if the server did not say.
    pub total: u64,
}

impl DownloadProgress {
    /// Returns the progress as a fraction (0.0 to 1.0).
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            return 0.0;
        }
        (self.downloaded as f64 / self.total as f64) as f32
    }

    /// Returns the progress as a percentage (0 to 100).
    #[must_use]
    pub fn percentage(&self) -> u8 {
        (self.fraction() * 100.0).min(100.0) as u8
    }
}

/// Fetches artifacts into memory.
#[derive(Debug, Clone)]
pub struct Downloader {
    client: reqwest::Client,
    user_agent: HeaderValue,
}

impl Downloader {
    /// Creates a downloader using the configured download timeout.
    pub fn new(config: &UpdaterConfig) -> Result<Self> {
        let user_agent = HeaderValue::from_str(&config.user_agent)
            .map_err(|e| UpdateError::Network(format!("invalid user agent: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(config.download_timeout)
            .build()
            .map_err(|e| UpdateError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client, user_agent })
    }

    /// Downloads `url` into memory.
    pub async fn download(&self, ctx: &UpdateContext, url: &str) -> Result<Vec<u8>> {
        self.download_with_progress(ctx, url, |_| {}).await
    }

    /// Downloads `url` into memory, reporting progress after every chunk.
    ///
    /// Cancelling `ctx` aborts the transfer between chunks.
    pub async fn download_with_progress<F>(
        &self,
        ctx: &UpdateContext,
        url: &str,
        mut on_progress: F,
    ) -> Result<Vec<u8>>
    where
        F: FnMut(DownloadProgress),
    {
        ctx.ensure_active()?;
        tracing::info!("Downloading update from {}", url);

        let mut response = ctx
            .run(async {
                self.client
                    .get(url)
                    .header(USER_AGENT, self.user_agent.clone())
                    .send()
                    .await
                    .map_err(UpdateError::from)
            })
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpdateError::HttpStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let total = response.content_length().unwrap_or(0);
        let capacity = usize::try_from(total).unwrap_or(0);
        let mut data = Vec::with_capacity(capacity);

        while let Some(chunk) = ctx
            .run(async { response.chunk().await.map_err(UpdateError::from) })
            .await?
        {
            data.extend_from_slice(&chunk);
            let progress = DownloadProgress {
                downloaded: data.len() as u64,
                total,
            };
            tracing::trace!(
                "Downloaded {} of {} bytes",
                progress.downloaded,
                progress.total
            );
            on_progress(progress);
        }

        tracing::info!("Download complete: {} bytes", data.len());
        Ok(data)
    }
}
