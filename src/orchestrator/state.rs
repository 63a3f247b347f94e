//! Acquisition state machine
//!
//! ```text
//! Start -> ClassifyUrl -> DirectAttempt ------------------------------+
//!                      \-> ExtractorAttempt -------------------------+-> Validate -> Done
//!                              \-> (failed) ScrapeFallback -> DirectAttempt
//! any state -> Failed
//! ```
//!
//! Each state is entered at most once per request. Retries are the
//! caller's business (see [`crate::retry`]).

use super::AcquisitionOrchestrator;
use crate::classify::classify_url_with;
use crate::error::{Error, ErrorDetail, Result};
use crate::progress::ProgressReporter;
use crate::types::{AcquisitionRequest, Event, FetchOutcome, RepairOutcome, Stage, Strategy, UrlKind};
use crate::utils::{ensure_dir, sanitize_filename};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// One state of a single acquisition
#[derive(Debug)]
pub(crate) enum State {
    Start,
    ClassifyUrl,
    DirectAttempt { url: String },
    ExtractorAttempt,
    ScrapeFallback { extractor_error: Error },
    Validate { file: PathBuf, strategy: Strategy },
    Done(FetchOutcome),
    Failed(Error),
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::Start => "start",
            State::ClassifyUrl => "classify_url",
            State::DirectAttempt { .. } => "direct_attempt",
            State::ExtractorAttempt => "extractor_attempt",
            State::ScrapeFallback { .. } => "scrape_fallback",
            State::Validate { .. } => "validate",
            State::Done(_) => "done",
            State::Failed(_) => "failed",
        }
    }
}

/// Context of one in-flight request
pub(crate) struct Run<'a> {
    orchestrator: &'a AcquisitionOrchestrator,
    request: &'a AcquisitionRequest,
    reporter: &'a dyn ProgressReporter,
    cancel: &'a CancellationToken,
    /// Failures that were recovered from, attached to the outcome
    recovered: Vec<ErrorDetail>,
}

impl<'a> Run<'a> {
    pub(crate) fn new(
        orchestrator: &'a AcquisitionOrchestrator,
        request: &'a AcquisitionRequest,
        reporter: &'a dyn ProgressReporter,
        cancel: &'a CancellationToken,
    ) -> Self {
        Self {
            orchestrator,
            request,
            reporter,
            cancel,
            recovered: Vec::new(),
        }
    }

    /// Step the machine until it reaches a terminal state
    pub(crate) async fn drive(mut self) -> Result<FetchOutcome> {
        let mut state = State::Start;
        loop {
            if self.cancel.is_cancelled() && !matches!(state, State::Done(_) | State::Failed(_)) {
                debug!(state = state.name(), "cancelled between states");
                state = State::Failed(Error::Cancelled);
            }

            state = match state {
                State::Done(outcome) => {
                    info!(
                        url = %self.request.source_url(),
                        path = ?outcome.file_path,
                        strategy = ?outcome.strategy_used,
                        repaired = outcome.repair.is_repaired(),
                        "acquisition complete"
                    );
                    self.emit(Event::Complete {
                        path: outcome.file_path.clone(),
                        strategy: outcome.strategy_used,
                    });
                    return Ok(outcome);
                }
                State::Failed(e) => {
                    error!(url = %self.request.source_url(), error = %e, "acquisition failed");
                    self.emit(Event::Failed {
                        error: e.to_string(),
                    });
                    return Err(e);
                }
                other => {
                    debug!(state = other.name(), "entering state");
                    self.step(other).await
                }
            };
        }
    }

    async fn step(&mut self, state: State) -> State {
        match state {
            State::Start => self.start().await,
            State::ClassifyUrl => self.classify(),
            State::DirectAttempt { url } => self.direct_attempt(url).await,
            State::ExtractorAttempt => self.extractor_attempt().await,
            State::ScrapeFallback { extractor_error } => self.scrape_fallback(extractor_error).await,
            State::Validate { file, strategy } => self.validate(file, strategy).await,
            terminal @ (State::Done(_) | State::Failed(_)) => terminal,
        }
    }

    fn emit(&self, event: Event) {
        self.orchestrator.event_tx.send(event).ok();
    }

    async fn start(&mut self) -> State {
        if self.request.source_url().is_empty() {
            return State::Failed(Error::Config {
                message: "source URL is empty".into(),
                key: Some("source_url".into()),
            });
        }
        match ensure_dir(self.request.destination_dir()).await {
            Ok(()) => State::ClassifyUrl,
            Err(e) => State::Failed(e),
        }
    }

    fn classify(&mut self) -> State {
        let url = self.request.source_url();
        let kind = classify_url_with(url, &self.orchestrator.config.download.direct_extensions);
        debug!(%url, ?kind, "classified URL");

        self.emit(Event::Classified {
            url: url.to_string(),
            kind,
        });

        match kind {
            UrlKind::Direct => State::DirectAttempt {
                url: url.to_string(),
            },
            UrlKind::Indirect => State::ExtractorAttempt,
        }
    }

    async fn direct_attempt(&mut self, url: String) -> State {
        let file_name = sanitize_filename(&self.orchestrator.config.download.direct_filename);
        if file_name.is_empty() {
            return State::Failed(Error::Config {
                message: "direct_filename is empty after sanitization".into(),
                key: Some("download.direct_filename".into()),
            });
        }
        let destination = self.request.destination_dir().join(file_name);

        self.emit(Event::AttemptStarted {
            stage: Stage::Direct,
            url: url.clone(),
        });

        let result = self
            .orchestrator
            .direct
            .fetch_with_cancel(&url, &destination, self.reporter, self.cancel)
            .await;

        match result {
            Ok(file) => State::Validate {
                file,
                strategy: Strategy::Direct,
            },
            Err(e) => {
                // Direct is always the last strategy
                self.emit(Event::AttemptFailed {
                    stage: Stage::Direct,
                    error: e.to_string(),
                });
                State::Failed(e)
            }
        }
    }

    async fn extractor_attempt(&mut self) -> State {
        let url = self.request.source_url();
        self.emit(Event::AttemptStarted {
            stage: Stage::Extractor,
            url: url.to_string(),
        });

        let result = self
            .orchestrator
            .extractor
            .fetch(url, self.request.destination_dir(), self.reporter, self.cancel)
            .await;

        match result {
            Ok(file) => State::Validate {
                file,
                strategy: Strategy::Extractor,
            },
            Err(Error::Cancelled) => State::Failed(Error::Cancelled),
            Err(e) => {
                warn!(
                    %url,
                    engine = self.orchestrator.extractor.engine_name(),
                    error = %e,
                    "extractor failed, falling back to page scrape"
                );
                self.emit(Event::AttemptFailed {
                    stage: Stage::Extractor,
                    error: e.to_string(),
                });
                self.recovered.push(ErrorDetail::from(&e));
                State::ScrapeFallback { extractor_error: e }
            }
        }
    }

    async fn scrape_fallback(&mut self, extractor_error: Error) -> State {
        let url = self.request.source_url();
        self.emit(Event::AttemptStarted {
            stage: Stage::Scrape,
            url: url.to_string(),
        });

        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            result = self.orchestrator.scraper.resolve_direct_url(url) => result,
        };

        match result {
            Ok(resolved) => {
                info!(%url, %resolved, "scrape fallback resolved media URL");
                self.emit(Event::Scraped {
                    resolved_url: resolved.clone(),
                });
                State::DirectAttempt { url: resolved }
            }
            Err(Error::Cancelled) => State::Failed(Error::Cancelled),
            Err(e) => {
                self.emit(Event::AttemptFailed {
                    stage: Stage::Scrape,
                    error: e.to_string(),
                });
                State::Failed(match e {
                    Error::NotFound(msg) => Error::NotFound(format!(
                        "{} (extractor failed first: {})",
                        msg, extractor_error
                    )),
                    other => other,
                })
            }
        }
    }

    async fn validate(&mut self, file: PathBuf, strategy: Strategy) -> State {
        let processed = match self.orchestrator.post_processor.run(&file).await {
            Ok(processed) => processed,
            Err(e) => return State::Failed(e),
        };

        if let RepairOutcome::Failed { reason } = &processed.repair {
            self.recovered.push(ErrorDetail::from(&Error::Remux {
                path: processed.path.clone(),
                reason: reason.clone(),
            }));
        }

        State::Done(FetchOutcome {
            file_path: processed.path,
            strategy_used: strategy,
            repair: processed.repair,
            recovered: std::mem::take(&mut self.recovered),
        })
    }
}
