//! Acquisition orchestrator
//!
//! The [`AcquisitionOrchestrator`] owns every pipeline component and drives a
//! single request through the state machine in [`state`]: classify, fetch
//! with fallback, validate, repair.

mod state;


use crate::config::Config;
use crate::error::Result;
use crate::extractor::{CliExtractor, Extractor, ExtractorFetcher, NoOpExtractor};
use crate::fetch::{self, DirectFetcher, PageScraper};
use crate::media::{CliMediaTool, MediaTool, NoOpMediaTool};
use crate::post_processing::PostProcessor;
use crate::progress::ProgressReporter;
use crate::types::{AcquisitionRequest, Event, FetchOutcome};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

/// Capacity of the event channel; slower subscribers see `RecvError::Lagged`
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Runs acquisitions: one URL in, one validated media file out
///
/// Cloneable; all heavy members are shared.
///
/// # Examples
///
/// ```no_run
/// use media_acquire::{AcquisitionOrchestrator, AcquisitionRequest, Config};
/// use media_acquire::progress::TracingReporter;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = AcquisitionOrchestrator::new(Config::default())?;
///
///     let mut events = orchestrator.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("Event: {:?}", event);
///         }
///     });
///
///     let request = AcquisitionRequest::new("https://cdn.example/clip.mp4", "/tmp/out");
///     let outcome = orchestrator.acquire(request, &TracingReporter).await?;
///     println!("saved {} via {:?}", outcome.file_path.display(), outcome.strategy_used);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct AcquisitionOrchestrator {
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: broadcast::Sender<Event>,
    pub(crate) config: Arc<Config>,
    pub(crate) direct: DirectFetcher,
    pub(crate) scraper: PageScraper,
    pub(crate) extractor: Arc<ExtractorFetcher>,
    pub(crate) post_processor: Arc<PostProcessor>,
}

impl AcquisitionOrchestrator {
    /// Create an orchestrator using the external tools named in `config`
    ///
    /// `yt-dlp` and `ffmpeg` are taken from the configured paths or searched
    /// in PATH. A missing tool is replaced by its no-op stand-in: without an
    /// extractor every indirect URL goes straight to the scrape fallback, and
    /// without ffmpeg no file can pass validation.
    pub fn new(config: Config) -> Result<Self> {
        let extractor: Arc<dyn Extractor> = match config.tools.resolve_ytdlp() {
            Some(path) => Arc::new(CliExtractor::new(path)),
            None => Arc::new(NoOpExtractor),
        };
        let media_tool: Arc<dyn MediaTool> = match config.tools.resolve_ffmpeg() {
            Some(path) => Arc::new(CliMediaTool::new(path)),
            None => Arc::new(NoOpMediaTool),
        };
        Self::with_tools(config, extractor, media_tool)
    }

    /// Create an orchestrator with explicit tool implementations
    pub fn with_tools(
        config: Config,
        extractor: Arc<dyn Extractor>,
        media_tool: Arc<dyn MediaTool>,
    ) -> Result<Self> {
        config.validate()?;

        let extractor_caps = extractor.capabilities();
        let media_caps = media_tool.capabilities();
        tracing::info!(
            extractor = extractor.name(),
            can_extract = extractor_caps.can_extract,
            media_tool = media_tool.name(),
            can_validate = media_caps.can_validate,
            can_remux = media_caps.can_remux,
            "Acquisition tools initialized"
        );

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        let client = fetch::build_client()?;
        let direct = DirectFetcher::with_client(
            client.clone(),
            config.download.user_agent.clone(),
            config.download.chunk_size,
        );
        let scraper = PageScraper::with_client(client, config.download.scrape_user_agent.clone());
        let extractor = Arc::new(ExtractorFetcher::new(
            extractor,
            config.download.user_agent.clone(),
        ));
        let post_processor = Arc::new(PostProcessor::new(
            event_tx.clone(),
            media_tool,
            config.download.discard_invalid,
            config.download.repair,
        ));

        Ok(Self {
            event_tx,
            config: Arc::new(config),
            direct,
            scraper,
            extractor,
            post_processor,
        })
    }

    /// Subscribe to acquisition events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        self.config.clone()
    }

    /// Build a request that writes into the configured destination directory
    pub fn request(&self, source_url: impl Into<String>) -> AcquisitionRequest {
        AcquisitionRequest::new(source_url, self.default_destination())
    }

    fn default_destination(&self) -> PathBuf {
        self.config.download.destination_dir.clone()
    }

    /// Acquire the media behind `request`
    ///
    /// # Errors
    ///
    /// - `Error::Network` when the last strategy fails on the wire
    /// - `Error::NotFound` when the extractor failed and the page has no video element
    /// - `Error::Validation` when the downloaded file does not decode
    pub async fn acquire(
        &self,
        request: AcquisitionRequest,
        reporter: &dyn ProgressReporter,
    ) -> Result<FetchOutcome> {
        self.acquire_with_cancel(request, reporter, CancellationToken::new())
            .await
    }

    /// Acquire the media behind `request`, aborting when `cancel` fires
    ///
    /// Cancellation during a fetch closes the HTTP stream or kills the
    /// extractor process and deletes the partial output. Once validation has
    /// started the request runs to completion, so the remux rename is never
    /// interrupted.
    pub async fn acquire_with_cancel(
        &self,
        request: AcquisitionRequest,
        reporter: &dyn ProgressReporter,
        cancel: CancellationToken,
    ) -> Result<FetchOutcome> {
        tracing::info!(
            url = %request.source_url(),
            destination = ?request.destination_dir(),
            "starting acquisition"
        );
        state::Run::new(self, &request, reporter, &cancel)
            .drive()
            .await
    }
}
