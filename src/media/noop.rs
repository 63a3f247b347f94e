//! No-op media tool for graceful degradation

use super::traits::{MediaTool, MediaToolCapabilities, ToolRun};
use async_trait::async_trait;
use std::path::Path;

/// Media tool used when no ffmpeg binary is available
///
/// Both operations return `Error::NotSupported`. Validation is then terminal
/// for the pipeline while repair is skipped.
pub struct NoOpMediaTool;

#[async_trait]
impl MediaTool for NoOpMediaTool {
    async fn validate(&self, _path: &Path) -> crate::Result<ToolRun> {
        Err(crate::Error::NotSupported(
            "Media validation requires external ffmpeg binary. \
             Configure ffmpeg_path in config or ensure ffmpeg is in PATH."
                .into(),
        ))
    }

    async fn remux(&self, _input: &Path, _output: &Path) -> crate::Result<ToolRun> {
        Err(crate::Error::NotSupported(
            "Remux requires external ffmpeg binary. \
             Configure ffmpeg_path in config or ensure ffmpeg is in PATH."
                .into(),
        ))
    }

    fn capabilities(&self) -> MediaToolCapabilities {
        MediaToolCapabilities {
            can_validate: false,
            can_remux: false,
        }
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}
