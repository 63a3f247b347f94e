//! Decode-only integrity validation

use crate::error::{Error, Result};
use crate::media::MediaTool;
use crate::types::{ValidatedFile, ValidationVerdict};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Confirms a file is a readable media container
///
/// The verdict comes from a full decode pass by the media tool, never from
/// the file size: a truncated download or a saved HTML error page can look
/// plausible by size alone.
#[derive(Clone)]
pub struct IntegrityValidator {
    tool: Arc<dyn MediaTool>,
}

impl IntegrityValidator {
    /// Create a validator backed by `tool`
    pub fn new(tool: Arc<dyn MediaTool>) -> Self {
        Self { tool }
    }

    /// Run the decode pass and return the verdict
    ///
    /// Deterministic for an unmodified file: the same file yields the same
    /// verdict.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot run at all, including
    /// `Error::NotSupported` when no tool is installed.
    pub async fn validate(&self, path: &Path) -> Result<ValidationVerdict> {
        debug!(?path, tool = self.tool.name(), "validating media file");

        let run = self.tool.validate(path).await?;
        let verdict = ValidationVerdict {
            valid: run.success,
            diagnostic: run.diagnostic,
        };

        info!(?path, valid = verdict.valid, "validation complete");
        Ok(verdict)
    }

    /// Validate and, if valid, return proof for the remux step
    ///
    /// An invalid file becomes `Error::Validation` carrying the diagnostic.
    pub async fn require_valid(&self, path: &Path) -> Result<ValidatedFile> {
        let verdict = self.validate(path).await?;
        if verdict.valid {
            Ok(ValidatedFile::new(path.to_path_buf()))
        } else {
            Err(Error::Validation {
                path: path.to_path_buf(),
                diagnostic: verdict.diagnostic,
            })
        }
    }
}
