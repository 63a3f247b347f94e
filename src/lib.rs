//! # media-acquire
//!
//! Fetch one media file from a URL, whichever way works, and make sure it plays.
//!
//! ## Pipeline
//!
//! 1. **Classify** the URL by its path: a known media extension means a direct
//!    file, anything else a page.
//! 2. **Fetch** with fallback. Direct files are streamed over HTTP. Pages go to
//!    the extraction engine (`yt-dlp`); when it fails, the page HTML is scanned
//!    for a `<video>` source which is then streamed directly.
//! 3. **Validate** the file with a decode-only `ffmpeg` pass.
//! 4. **Repair** the container with a stream-copy remux that replaces the
//!    original atomically. A failed remux keeps the validated original.
//!
//! ## Quick Start
//!
//! ```no_run
//! use media_acquire::{AcquisitionOrchestrator, Config};
//! use media_acquire::progress::TracingReporter;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = AcquisitionOrchestrator::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = orchestrator.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let request = orchestrator.request("https://video.example/watch?v=42");
//!     let outcome = orchestrator.acquire(request, &TracingReporter).await?;
//!     println!("saved to {}", outcome.file_path.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// URL classification
pub mod classify;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Extraction engine seam and the extractor fetch strategy
pub mod extractor;
/// Direct HTTP fetch and page scraping
pub mod fetch;
/// Media tool seam (decode check, remux)
pub mod media;
/// Acquisition state machine
pub mod orchestrator;
/// Integrity validation and container repair
pub mod post_processing;
/// Progress observation
pub mod progress;
/// Retry logic with exponential backoff
pub mod retry;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export commonly used types
pub use classify::{classify_url, classify_url_with};
pub use config::{Config, DownloadConfig, RetryConfig, ToolsConfig};
pub use error::{Error, ErrorDetail, Result};
pub use extractor::{
    CliExtractor, Extractor, ExtractorCapabilities, ExtractorProgressEvent, ExtractorRequest,
    NoOpExtractor,
};
pub use media::{CliMediaTool, MediaTool, MediaToolCapabilities, NoOpMediaTool, ToolRun};
pub use orchestrator::AcquisitionOrchestrator;
pub use progress::ProgressReporter;
pub use types::{
    AcquisitionRequest, Event, FetchOutcome, ProgressSample, RepairOutcome, Stage, Strategy,
    UrlKind, ValidatedFile, ValidationVerdict,
};

use tokio_util::sync::CancellationToken;

/// Run one acquisition, cancelling it on a termination signal.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// On a signal the in-flight fetch is aborted and its partial output removed;
/// the call then returns `Error::Cancelled`. A request already in validation
/// finishes normally.
///
/// # Example
///
/// ```no_run
/// use media_acquire::{AcquisitionOrchestrator, Config, acquire_until_signal};
/// use media_acquire::progress::TracingReporter;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = AcquisitionOrchestrator::new(Config::default())?;
///     let request = orchestrator.request("https://cdn.example/clip.mp4");
///
///     let outcome = acquire_until_signal(&orchestrator, request, &TracingReporter).await?;
///     println!("{}", outcome.file_path.display());
///     Ok(())
/// }
/// ```
pub async fn acquire_until_signal(
    orchestrator: &AcquisitionOrchestrator,
    request: AcquisitionRequest,
    reporter: &dyn ProgressReporter,
) -> Result<FetchOutcome> {
    let cancel = CancellationToken::new();
    let acquisition = orchestrator.acquire_with_cancel(request, reporter, cancel.clone());
    tokio::pin!(acquisition);

    tokio::select! {
        result = &mut acquisition => result,
        _ = wait_for_signal() => {
            cancel.cancel();
            acquisition.await
        }
    }
}

/// Resolve on the first SIGTERM or SIGINT
///
/// Handlers that cannot be registered (some containers) are skipped; with
/// none registered this falls back to `ctrl_c`.
#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut listeners = Vec::new();
    for (kind, name) in [
        (SignalKind::terminate(), "SIGTERM"),
        (SignalKind::interrupt(), "SIGINT"),
    ] {
        match signal(kind) {
            Ok(listener) => listeners.push((name, listener)),
            Err(e) => tracing::warn!(signal = name, error = %e, "could not register signal handler"),
        }
    }

    if listeners.is_empty() {
        tracing::error!("no signal handlers registered, using ctrl_c fallback");
        tokio::signal::ctrl_c().await.ok();
        return;
    }

    let received = listeners.iter_mut().map(|(name, listener)| {
        Box::pin(async move {
            listener.recv().await;
            *name
        })
    });
    let (name, _, _) = futures::future::select_all(received).await;
    tracing::info!(signal = name, "termination signal received, cancelling acquisition");
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
    tracing::info!("Ctrl+C received, cancelling acquisition");
}
