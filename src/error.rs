//! Error types for media-acquire
//!
//! This module provides the error taxonomy for the acquisition pipeline:
//! - Strategy errors (network, extraction, scrape) that drive fallback
//! - Post-processing errors (validation, remux)
//! - Machine-readable error codes and a serializable [`ErrorDetail`] for front-ends

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for media-acquire operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for media-acquire
///
/// Every variant carries a human-readable diagnostic so the failure can be
/// surfaced as-is by whatever front-end embeds the pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "chunk_size")
        key: Option<String>,
    },

    /// Transport failure or non-success HTTP status
    #[error("network error: {0}")]
    Network(String),

    /// The extraction engine could not resolve or download the URL
    #[error("extraction error: {0}")]
    Extraction(String),

    /// The page scraper found no video element source
    #[error("not found: {0}")]
    NotFound(String),

    /// Downloaded file failed the decode-only integrity pass
    #[error("validation failed for {path}: {diagnostic}")]
    Validation {
        /// File that failed validation
        path: PathBuf,
        /// Diagnostic output from the decode tool
        diagnostic: String,
    },

    /// Container remux failed
    #[error("remux failed for {path}: {reason}")]
    Remux {
        /// File that could not be remuxed
        path: PathBuf,
        /// The reason the remux failed
        reason: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// External tool could not be executed (ffmpeg, yt-dlp)
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// The acquisition was cancelled by the caller
    #[error("acquisition cancelled")]
    Cancelled,

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {}", e)
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            e.to_string()
        };
        Error::Network(message)
    }
}

impl Error {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Network(_) => "network_error",
            Error::Extraction(_) => "extraction_error",
            Error::NotFound(_) => "not_found",
            Error::Validation { .. } => "validation_error",
            Error::Remux { .. } => "remux_error",
            Error::Io(_) => "io_error",
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::Cancelled => "cancelled",
            Error::Other(_) => "internal_error",
        }
    }
}

/// Serializable error information for front-ends
///
/// # Example JSON
///
/// ```json
/// {
///   "code": "validation_error",
///   "message": "validation failed for downloads/clip.mp4: moov atom not found",
///   "details": { "path": "downloads/clip.mp4", "diagnostic": "moov atom not found" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "not_found", "validation_error")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context (paths, tool diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for ErrorDetail {
    fn from(error: &Error) -> Self {
        let details = match error {
            Error::Validation { path, diagnostic } => Some(serde_json::json!({
                "path": path,
                "diagnostic": diagnostic,
            })),
            Error::Remux { path, reason } => Some(serde_json::json!({
                "path": path,
                "reason": reason,
            })),
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ErrorDetail {
            code: error.error_code().to_string(),
            message: error.to_string(),
            details,
        }
    }
}

impl From<Error> for ErrorDetail {
    fn from(error: Error) -> Self {
        ErrorDetail::from(&error)
    }
}
