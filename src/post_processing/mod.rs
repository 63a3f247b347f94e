//! Post-processing pipeline for downloaded media
//!
//! Runs after a fetch strategy produced a file:
//! 1. Validate - decode-only integrity pass (terminal on failure)
//! 2. Remux - stream-copy container repair (non-fatal on failure)
//!
//! Remux only accepts a [`ValidatedFile`], which only the validator hands
//! out, so a destructive rewrite can never precede validation.

use crate::error::{Error, Result};
use crate::media::MediaTool;
use crate::types::{Event, RepairOutcome, ValidatedFile};
use crate::utils::discard_file;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

mod remux;
mod validate;

pub use remux::Remuxer;
pub use validate::IntegrityValidator;

/// Result of a successful post-processing run
#[derive(Debug, Clone)]
pub struct Processed {
    /// Final path of the file (unchanged by remux)
    pub path: PathBuf,
    /// What the remux step did
    pub repair: RepairOutcome,
}

/// Post-processing pipeline executor
pub struct PostProcessor {
    /// Event channel for emitting pipeline events
    event_tx: broadcast::Sender<Event>,
    validator: IntegrityValidator,
    remuxer: Remuxer,
    /// Delete files that fail validation
    discard_invalid: bool,
    /// Run the remux step at all
    repair_enabled: bool,
}

impl PostProcessor {
    /// Create a new post-processing pipeline executor
    pub fn new(
        event_tx: broadcast::Sender<Event>,
        tool: Arc<dyn MediaTool>,
        discard_invalid: bool,
        repair_enabled: bool,
    ) -> Self {
        Self {
            event_tx,
            validator: IntegrityValidator::new(tool.clone()),
            remuxer: Remuxer::new(tool),
            discard_invalid,
            repair_enabled,
        }
    }

    /// Validate `path`, then repair it
    ///
    /// # Errors
    ///
    /// `Error::Validation` when the file fails the decode pass or no tool is
    /// available to decide. Remux problems are reported in
    /// [`Processed::repair`], never as an error.
    pub async fn run(&self, path: &Path) -> Result<Processed> {
        let validated = self.run_validate_stage(path).await?;
        let repair = self.run_remux_stage(&validated).await;

        Ok(Processed {
            path: validated.into_path(),
            repair,
        })
    }

    async fn run_validate_stage(&self, path: &Path) -> Result<ValidatedFile> {
        debug!(?path, "running validate stage");
        self.event_tx
            .send(Event::Validating {
                path: path.to_path_buf(),
            })
            .ok();

        match self.validator.require_valid(path).await {
            Ok(validated) => {
                self.event_tx
                    .send(Event::ValidateComplete { valid: true })
                    .ok();
                Ok(validated)
            }
            Err(Error::Validation { path, diagnostic }) => {
                error!(?path, %diagnostic, "file failed validation");
                self.event_tx
                    .send(Event::ValidateComplete { valid: false })
                    .ok();
                if self.discard_invalid {
                    discard_file(&path).await;
                }
                Err(Error::Validation { path, diagnostic })
            }
            Err(Error::NotSupported(msg)) => {
                // Without a decoder nothing can vouch for the file
                error!(?path, "validation not supported: {}", msg);
                self.event_tx
                    .send(Event::ValidateComplete { valid: false })
                    .ok();
                Err(Error::Validation {
                    path: path.to_path_buf(),
                    diagnostic: msg,
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn run_remux_stage(&self, validated: &ValidatedFile) -> RepairOutcome {
        if !self.repair_enabled {
            let reason = "repair disabled in config".to_string();
            debug!(path = ?validated.path(), "skipping remux (disabled)");
            self.event_tx
                .send(Event::RemuxSkipped {
                    reason: reason.clone(),
                })
                .ok();
            return RepairOutcome::Unchanged { reason };
        }

        self.event_tx
            .send(Event::Remuxing {
                path: validated.path().to_path_buf(),
            })
            .ok();

        let outcome = self.remuxer.repair_validated(validated).await;
        match &outcome {
            RepairOutcome::Repaired { path } => {
                info!(?path, "container repaired");
                self.event_tx
                    .send(Event::RemuxComplete { path: path.clone() })
                    .ok();
            }
            RepairOutcome::Unchanged { reason } => {
                warn!(path = ?validated.path(), "remux skipped: {}", reason);
                self.event_tx
                    .send(Event::RemuxSkipped {
                        reason: reason.clone(),
                    })
                    .ok();
            }
            RepairOutcome::Failed { reason } => {
                warn!(path = ?validated.path(), "remux failed, keeping validated file: {}", reason);
                self.event_tx
                    .send(Event::RemuxFailed {
                        error: reason.clone(),
                    })
                    .ok();
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests;
