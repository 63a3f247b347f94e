//! Container repair by stream-copy remux

use super::validate::IntegrityValidator;
use crate::error::{Error, Result};
use crate::media::MediaTool;
use crate::types::{RepairOutcome, ValidatedFile};
use crate::utils::{discard_file, remux_temp_path};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Rewrites a file's container without re-encoding
///
/// The tool writes into a `fixed_` sibling of the original. Only after it
/// succeeds is the sibling renamed over the original in one step, so a
/// reader of the original path sees either the old file or the new one.
#[derive(Clone)]
pub struct Remuxer {
    tool: Arc<dyn MediaTool>,
}

impl Remuxer {
    /// Create a remuxer backed by `tool`
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self { tool }
    }

    /// Validate `path`, then remux it
    ///
    /// An invalid file is returned as `Error::Validation` and left exactly
    /// as it was.
    pub async fn repair(&self, path: &Path) -> Result<RepairOutcome> {
        let validated = IntegrityValidator::new(self.tool.clone())
            .require_valid(path)
            .await?;
        Ok(self.repair_validated(&validated).await)
    }

    /// Remux a file that already passed validation
    ///
    /// Never fails the caller: tool failures come back as
    /// [`RepairOutcome::Failed`] with the original untouched, and a missing
    /// tool as [`RepairOutcome::Unchanged`].
    pub async fn repair_validated(&self, file: &ValidatedFile) -> RepairOutcome {
        let path = file.path();

        let temp_path = match remux_temp_path(path) {
            Ok(p) => p,
            Err(e) => {
                return RepairOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        debug!(?path, ?temp_path, tool = self.tool.name(), "remuxing");

        let run = match self.tool.remux(path, &temp_path).await {
            Ok(run) => run,
            Err(Error::NotSupported(msg)) => {
                discard_file(&temp_path).await;
                return RepairOutcome::Unchanged { reason: msg };
            }
            Err(e) => {
                discard_file(&temp_path).await;
                return RepairOutcome::Failed {
                    reason: e.to_string(),
                };
            }
        };

        if !run.success {
            discard_file(&temp_path).await;
            return RepairOutcome::Failed {
                reason: run.diagnostic,
            };
        }
        if !run.diagnostic.is_empty() {
            debug!(?path, diagnostic = %run.diagnostic, "remux finished with warnings");
        }

        // rename(2) replaces the destination atomically on the same filesystem
        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            warn!(?path, ?temp_path, error = %e, "failed to replace original with remuxed file");
            discard_file(&temp_path).await;
            return RepairOutcome::Failed {
                reason: format!("failed to replace '{}': {}", path.display(), e),
            };
        }

        info!(?path, "remux complete");
        RepairOutcome::Repaired {
            path: path.to_path_buf(),
        }
    }
}
