//! Traits and types for the extraction engine

use async_trait::async_trait;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

/// What the extraction engine is asked to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractorRequest {
    /// Page URL to resolve
    pub url: String,
    /// Output path template, e.g. `downloads/%(title)s.%(ext)s`
    pub output_template: String,
    /// Extra HTTP headers sent by the engine
    pub headers: Vec<(String, String)>,
}

impl ExtractorRequest {
    /// Create a request without extra headers
    pub fn new(url: impl Into<String>, output_template: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            output_template: output_template.into(),
            headers: Vec::new(),
        }
    }

    /// Add a header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A progress event in the engine's own vocabulary
///
/// Fields the engine could not determine are `None`.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractorProgressEvent {
    /// Engine status, e.g. `downloading`, `finished`, `error`
    pub status: String,
    /// Bytes downloaded for the current format
    pub downloaded_bytes: Option<u64>,
    /// Total (or estimated total) bytes for the current format
    pub total_bytes: Option<u64>,
    /// Speed in bytes per second
    pub speed: Option<f64>,
    /// Seconds remaining
    pub eta: Option<u64>,
}

impl ExtractorProgressEvent {
    /// Whether this event reports an in-flight transfer
    pub fn is_downloading(&self) -> bool {
        self.status == "downloading"
    }
}

/// Capabilities of an extractor implementation
#[derive(Debug, Clone, Copy)]
pub struct ExtractorCapabilities {
    /// Can resolve and download pages
    pub can_extract: bool,
}

/// Trait for the external extraction engine
///
/// Implementations resolve a page URL into a media stream and download it
/// according to the request's output template. Any failure (unsupported site,
/// no stream, network trouble) is reported as an error; the caller decides
/// whether to fall back.
///
/// # Examples
///
/// ```no_run
/// use media_acquire::extractor::{CliExtractor, Extractor, ExtractorRequest};
/// use tokio_util::sync::CancellationToken;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let extractor = CliExtractor::from_path().expect("yt-dlp not found");
/// let request = ExtractorRequest::new(
///     "https://www.youtube.com/watch?v=abc",
///     "downloads/%(title)s.%(ext)s",
/// );
///
/// let path = extractor
///     .extract(&request, &|event| println!("{:?}", event), &CancellationToken::new())
///     .await?;
/// println!("saved to {}", path.display());
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Resolve and download `request.url`
    ///
    /// `on_progress` is called synchronously for every native progress event.
    ///
    /// # Returns
    ///
    /// The path of the file the engine finally wrote.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The engine cannot handle the URL or finds no stream
    /// - The external binary fails to execute (for CLI implementations)
    /// - The operation is not supported (for stub implementations)
    /// - `cancel` fires, in which case [`crate::Error::Cancelled`] is returned
    async fn extract(
        &self,
        request: &ExtractorRequest,
        on_progress: &(dyn Fn(ExtractorProgressEvent) + Send + Sync),
        cancel: &CancellationToken,
    ) -> crate::Result<PathBuf>;

    /// Query capabilities of this extractor
    fn capabilities(&self) -> ExtractorCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
