//! Traits and types for the external decode tool

use async_trait::async_trait;
use std::path::Path;

/// Outcome of one tool invocation
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolRun {
    /// Whether the tool reported success
    pub success: bool,
    /// Error output of the tool, trimmed (empty when clean)
    pub diagnostic: String,
}

impl ToolRun {
    /// A clean successful run
    pub fn ok() -> Self {
        Self {
            success: true,
            diagnostic: String::new(),
        }
    }

    /// A failed run with a diagnostic
    pub fn failed(diagnostic: impl Into<String>) -> Self {
        Self {
            success: false,
            diagnostic: diagnostic.into(),
        }
    }
}

/// Capabilities of a media tool implementation
#[derive(Debug, Clone, Copy)]
pub struct MediaToolCapabilities {
    /// Can run a decode-only integrity pass
    pub can_validate: bool,
    /// Can remux by stream copy
    pub can_remux: bool,
}

/// Trait for the external decode/remux tool
///
/// # Examples
///
/// ```no_run
/// use media_acquire::media::{CliMediaTool, MediaTool};
/// use std::path::Path;
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let tool = CliMediaTool::from_path().expect("ffmpeg not found");
///
/// let run = tool.validate(Path::new("downloads/clip.mp4")).await?;
/// if run.success {
///     let run = tool
///         .remux(Path::new("downloads/clip.mp4"), Path::new("downloads/fixed_clip.mp4"))
///         .await?;
///     println!("remux ok: {}", run.success);
/// }
/// # Ok(())
/// # }
/// ```
#[async_trait]
pub trait MediaTool: Send + Sync {
    /// Decode the whole file to a null sink
    ///
    /// `success` is true only if the tool exited cleanly and reported no
    /// decode errors.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be executed, or
    /// `Error::NotSupported` for stub implementations.
    async fn validate(&self, path: &Path) -> crate::Result<ToolRun>;

    /// Stream-copy `input` into a new container at `output`
    ///
    /// `success` is true only if the tool exited cleanly and `output` exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the tool cannot be executed, or
    /// `Error::NotSupported` for stub implementations.
    async fn remux(&self, input: &Path, output: &Path) -> crate::Result<ToolRun>;

    /// Query capabilities of this tool
    fn capabilities(&self) -> MediaToolCapabilities;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}
