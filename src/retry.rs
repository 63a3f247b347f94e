//! Retry logic with exponential backoff
//!
//! The acquisition pipeline never retries on its own: each state is entered
//! at most once per request. This module lets a caller re-run the whole
//! pipeline when the final failure looks transient.
//!
//! # Example
//!
//! ```no_run
//! use media_acquire::{AcquisitionOrchestrator, Config};
//! use media_acquire::progress::NoOpReporter;
//! use media_acquire::retry::acquire_with_retry;
//!
//! # async fn example() -> media_acquire::Result<()> {
//! let orchestrator = AcquisitionOrchestrator::new(Config::default())?;
//! let request = orchestrator.request("https://cdn.example/clip.mp4");
//! let outcome = acquire_with_retry(&orchestrator, &request, &NoOpReporter).await?;
//! println!("{}", outcome.file_path.display());
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::{Error, Result};
use crate::orchestrator::AcquisitionOrchestrator;
use crate::progress::ProgressReporter;
use crate::types::{AcquisitionRequest, FetchOutcome};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (timeouts, connection resets, server errors) should return `true`.
/// Permanent failures (missing page, corrupt media, bad config) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // A 4xx will answer the same way next time, except throttling
            Error::Network(msg) => match http_status(msg) {
                Some(status) => !(400..500).contains(&status) || status == 408 || status == 429,
                None => true,
            },
            Error::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::TimedOut
                    | std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::NotConnected
                    | std::io::ErrorKind::BrokenPipe
                    | std::io::ErrorKind::Interrupted
            ),
            Error::Config { .. }
            | Error::Extraction(_)
            | Error::NotFound(_)
            | Error::Validation { .. }
            | Error::Remux { .. }
            | Error::ExternalTool(_)
            | Error::NotSupported(_)
            | Error::Cancelled
            | Error::Other(_) => false,
        }
    }
}

/// Status code from a `"HTTP <code> ..."` network message
fn http_status(message: &str) -> Option<u16> {
    let rest = message.strip_prefix("HTTP ")?;
    rest.split_whitespace().next()?.parse().ok()
}

/// Delay schedule between attempts
///
/// Grows by `backoff_multiplier` up to `max_delay`. Out-of-range values
/// (negative, NaN, overflowing) saturate at `max_delay` instead of panicking.
struct Backoff<'a> {
    config: &'a RetryConfig,
    next: Duration,
}

impl<'a> Backoff<'a> {
    fn new(config: &'a RetryConfig) -> Self {
        Self {
            config,
            next: config.initial_delay.min(config.max_delay),
        }
    }

    /// Delay to sleep before the upcoming retry, jitter included
    fn advance(&mut self) -> Duration {
        let base = self.next;
        let grown = Duration::try_from_secs_f64(base.as_secs_f64() * self.config.backoff_multiplier)
            .unwrap_or(self.config.max_delay);
        self.next = grown.min(self.config.max_delay);

        if self.config.jitter {
            add_jitter(base)
        } else {
            base
        }
    }
}

/// Run `operation` until it succeeds, fails permanently, or retries run out
///
/// `config.max_attempts` counts retries, so the operation runs at most
/// `max_attempts + 1` times.
pub async fn download_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut backoff = Backoff::new(config);
    let mut retries = 0;

    loop {
        let error = match operation().await {
            Ok(value) => {
                if retries > 0 {
                    tracing::info!(attempts = retries + 1, "succeeded after retry");
                }
                return Ok(value);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            tracing::error!(error = %error, "permanent failure, not retrying");
            return Err(error);
        }
        if retries >= config.max_attempts {
            tracing::error!(error = %error, attempts = retries + 1, "retries exhausted");
            return Err(error);
        }

        retries += 1;
        let delay = backoff.advance();
        tracing::warn!(
            error = %error,
            retry = retries,
            max_attempts = config.max_attempts,
            delay_ms = delay.as_millis() as u64,
            "transient failure, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}

/// Run a whole acquisition, re-running it on transient failure
///
/// Uses the orchestrator's `retry` settings. Every attempt starts from
/// classification again; a validation or not-found failure ends the loop
/// immediately.
pub async fn acquire_with_retry(
    orchestrator: &AcquisitionOrchestrator,
    request: &AcquisitionRequest,
    reporter: &dyn ProgressReporter,
) -> Result<FetchOutcome> {
    let config = orchestrator.get_config();
    download_with_retry(&config.retry, || {
        orchestrator.acquire(request.clone(), reporter)
    })
    .await
}

/// Stretch `delay` by a random factor in `[1, 2]`
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(1.0..=2.0);
    delay.mul_f64(factor)
}
