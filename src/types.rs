//! Core types and events for media-acquire

use crate::error::ErrorDetail;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// A single acquisition: what to fetch and where to put it
///
/// Immutable once created; consumed once by the orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionRequest {
    source_url: String,
    destination_dir: PathBuf,
}

impl AcquisitionRequest {
    /// Create a new request
    pub fn new(source_url: impl Into<String>, destination_dir: impl Into<PathBuf>) -> Self {
        Self {
            source_url: source_url.into().trim().to_string(),
            destination_dir: destination_dir.into(),
        }
    }

    /// URL supplied by the user
    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    /// Directory the final file is written to
    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }
}

/// Result of syntactic URL classification
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrlKind {
    /// Path ends in a raw container extension
    Direct,
    /// Anything else (a page the extractor has to resolve)
    Indirect,
}

/// Strategy that produced the final file
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Raw HTTP streaming of a known media URL
    Direct,
    /// External extraction engine
    Extractor,
}

/// Pipeline stage, used in events and logs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// URL classification
    Classify,
    /// Direct HTTP fetch
    Direct,
    /// Extraction engine fetch
    Extractor,
    /// Video element scrape fallback
    Scrape,
    /// Decode-only integrity pass
    Validate,
    /// Container remux
    Remux,
}

impl From<Strategy> for Stage {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Direct => Stage::Direct,
            Strategy::Extractor => Stage::Extractor,
        }
    }
}

/// One progress observation during a single fetch
///
/// `total_bytes == 0` means the total is unknown; consumers must render
/// indeterminate progress rather than divide by it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    /// Bytes written so far (non-decreasing within one fetch)
    pub bytes_downloaded: u64,
    /// Expected total, 0 if unknown
    pub total_bytes: u64,
    /// Instantaneous speed in bytes per second, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed_bps: Option<f64>,
    /// Estimated seconds remaining, if known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_secs: Option<u64>,
}

impl ProgressSample {
    /// Sample with only byte counts
    pub fn new(bytes_downloaded: u64, total_bytes: u64) -> Self {
        Self {
            bytes_downloaded,
            total_bytes,
            speed_bps: None,
            eta_secs: None,
        }
    }

    /// Completed fraction in `0.0..=1.0`, or `None` when the total is unknown
    pub fn fraction(&self) -> Option<f64> {
        if self.total_bytes == 0 {
            return None;
        }
        Some((self.bytes_downloaded as f64 / self.total_bytes as f64).clamp(0.0, 1.0))
    }

    /// Completed percentage in `0.0..=100.0`, or `None` when the total is unknown
    pub fn percent(&self) -> Option<f64> {
        self.fraction().map(|f| f * 100.0)
    }
}

/// Verdict of the decode-only integrity pass
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationVerdict {
    /// Whether the file decoded cleanly
    pub valid: bool,
    /// Tool output explaining the verdict (empty when clean)
    pub diagnostic: String,
}

/// A file that passed validation
///
/// Only the integrity validator can construct this, so holding one is proof
/// that the remux precondition holds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedFile {
    path: PathBuf,
}

impl ValidatedFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Path of the validated file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Consume into the underlying path
    pub fn into_path(self) -> PathBuf {
        self.path
    }
}

/// Result of the container repair step
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum RepairOutcome {
    /// Remux succeeded and the file at `path` was atomically replaced
    Repaired {
        /// Path of the repaired file (same as the original)
        path: PathBuf,
    },
    /// Repair was not attempted
    Unchanged {
        /// Why repair was skipped
        reason: String,
    },
    /// Remux failed; the original file is untouched
    Failed {
        /// Diagnostic from the remux tool
        reason: String,
    },
}

impl RepairOutcome {
    /// Whether the file was rewritten
    pub fn is_repaired(&self) -> bool {
        matches!(self, RepairOutcome::Repaired { .. })
    }
}

/// Final result of a successful acquisition
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchOutcome {
    /// The downloaded, validated file
    pub file_path: PathBuf,
    /// Strategy that produced it
    pub strategy_used: Strategy,
    /// What the repair step did
    pub repair: RepairOutcome,
    /// Failures recovered along the way (failed extractor attempt, failed remux)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub recovered: Vec<ErrorDetail>,
}

/// Event emitted by the orchestrator
///
/// Events are the observable record of the acquisition state machine. Subscribe
/// with [`crate::AcquisitionOrchestrator::subscribe`].
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// URL classified
    Classified {
        /// Source URL
        url: String,
        /// Classification result
        kind: UrlKind,
    },

    /// A fetch strategy (or the scrape fallback) started
    AttemptStarted {
        /// Stage being attempted
        stage: Stage,
        /// URL the stage operates on
        url: String,
    },

    /// A fetch strategy (or the scrape fallback) failed
    AttemptFailed {
        /// Stage that failed
        stage: Stage,
        /// Error message
        error: String,
    },

    /// The scrape fallback resolved a direct media URL
    Scraped {
        /// URL found in the page's video element
        resolved_url: String,
    },

    /// Integrity validation started
    Validating {
        /// File being validated
        path: PathBuf,
    },

    /// Integrity validation completed
    ValidateComplete {
        /// Whether the file is playable
        valid: bool,
    },

    /// Remux started
    Remuxing {
        /// File being remuxed
        path: PathBuf,
    },

    /// Remux completed and the file was replaced
    RemuxComplete {
        /// Replaced file
        path: PathBuf,
    },

    /// Remux skipped (disabled or tool unavailable)
    RemuxSkipped {
        /// Reason for skipping
        reason: String,
    },

    /// Remux failed; the validated file is kept as-is
    RemuxFailed {
        /// Error message
        error: String,
    },

    /// Acquisition finished successfully
    Complete {
        /// Final file path
        path: PathBuf,
        /// Strategy that produced the file
        strategy: Strategy,
    },

    /// Acquisition failed
    Failed {
        /// Error message
        error: String,
    },
}
