//! No-op extractor for graceful degradation

use super::traits::{Extractor, ExtractorCapabilities, ExtractorProgressEvent, ExtractorRequest};
use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// Extractor used when no extraction engine is available
///
/// Every call fails with `Error::NotSupported`, which the orchestrator treats
/// like any other extraction failure and moves on to the scrape fallback.
///
/// # Examples
///
/// ```
/// use media_acquire::extractor::{Extractor, ExtractorRequest, NoOpExtractor};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() {
/// let request = ExtractorRequest::new("https://example.com/watch", "out/%(title)s.%(ext)s");
/// let result = NoOpExtractor
///     .extract(&request, &|_| {}, &CancellationToken::new())
///     .await;
/// assert!(result.is_err());
/// # }
/// ```
pub struct NoOpExtractor;

#[async_trait]
impl Extractor for NoOpExtractor {
    async fn extract(
        &self,
        _request: &ExtractorRequest,
        _on_progress: &(dyn Fn(ExtractorProgressEvent) + Send + Sync),
        _cancel: &CancellationToken,
    ) -> crate::Result<PathBuf> {
        Err(crate::Error::NotSupported(
            "Extraction requires external yt-dlp binary. \
             Configure ytdlp_path in config or ensure yt-dlp is in PATH."
                .into(),
        ))
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities { can_extract: false }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
