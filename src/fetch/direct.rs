//! Direct HTTP fetch of a known media URL

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::progress::{ProgressReporter, SpeedMeter};
use crate::utils::{discard_file, partial_path};
use futures::StreamExt;
use reqwest::header::USER_AGENT;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Streams an HTTP resource to disk in bounded chunks
///
/// Progress is reported after every chunk write with the cumulative byte
/// count and the `Content-Length` value (0 when the server omits it).
///
/// On failure the partial download is removed and any file already at the
/// destination is left as it was.
///
/// # Examples
///
/// ```no_run
/// use media_acquire::fetch::DirectFetcher;
/// use media_acquire::progress::TracingReporter;
/// use media_acquire::config::DownloadConfig;
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = DirectFetcher::new(&DownloadConfig::default())?;
/// fetcher
///     .fetch("https://cdn.example/clip.mp4", Path::new("downloads/clip.mp4"), &TracingReporter)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct DirectFetcher {
    client: reqwest::Client,
    user_agent: String,
    chunk_size: usize,
}

impl DirectFetcher {
    /// Create a fetcher with its own HTTP client
    pub fn new(config: &DownloadConfig) -> Result<Self> {
        Ok(Self::with_client(
            super::build_client()?,
            config.user_agent.clone(),
            config.chunk_size,
        ))
    }

    /// Create a fetcher around an existing client
    pub fn with_client(client: reqwest::Client, user_agent: String, chunk_size: usize) -> Self {
        Self {
            client,
            user_agent,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Download `url` into `destination_file`
    pub async fn fetch(
        &self,
        url: &str,
        destination_file: &Path,
        reporter: &dyn ProgressReporter,
    ) -> Result<PathBuf> {
        self.fetch_with_cancel(url, destination_file, reporter, &CancellationToken::new())
            .await
    }

    /// Download `url` into `destination_file`, aborting when `cancel` fires
    ///
    /// Bytes go to a private `.part` sibling that is renamed onto
    /// `destination_file` only once the body is complete, so a failed or
    /// cancelled fetch never touches an existing file at that path.
    /// Cancellation drops the response stream and returns [`Error::Cancelled`].
    pub async fn fetch_with_cancel(
        &self,
        url: &str,
        destination_file: &Path,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        debug!(%url, ?destination_file, "starting direct fetch");

        let part = partial_path(destination_file);
        let downloaded = match self.stream_to(url, &part, reporter, cancel).await {
            Ok(downloaded) => downloaded,
            Err(e) => {
                discard_file(&part).await;
                return Err(e);
            }
        };

        if let Err(e) = tokio::fs::rename(&part, destination_file).await {
            discard_file(&part).await;
            return Err(Error::Io(std::io::Error::new(
                e.kind(),
                format!(
                    "failed to move '{}' into place: {}",
                    destination_file.display(),
                    e
                ),
            )));
        }

        info!(%url, ?destination_file, bytes = downloaded, "direct fetch complete");
        Ok(destination_file.to_path_buf())
    }

    /// Stream the response body into `part`, returning the byte count
    async fn stream_to(
        &self,
        url: &str,
        part: &Path,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<u64> {
        let request = self
            .client
            .get(url)
            .header(USER_AGENT, &self.user_agent)
            .send();
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            response = request => response?,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Network(format!("HTTP {} fetching {}", status, url)));
        }

        let total_bytes = response.content_length().unwrap_or(0);
        let mut file = tokio::fs::File::create(part).await.map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("failed to create '{}': {}", part.display(), e),
            ))
        })?;

        let mut meter = SpeedMeter::new(total_bytes);
        let mut downloaded: u64 = 0;
        reporter.report(meter.sample(downloaded));

        let mut stream = response.bytes_stream();
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                next = stream.next() => next,
            };
            let Some(chunk) = next else {
                break;
            };
            let chunk = chunk?;

            for piece in chunk.chunks(self.chunk_size) {
                file.write_all(piece).await?;
                downloaded += piece.len() as u64;
                reporter.report(meter.sample(downloaded));
            }
        }

        file.flush().await?;
        debug!(%url, bytes = downloaded, content_length = total_bytes, "body complete");
        Ok(downloaded)
    }
}
