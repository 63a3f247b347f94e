//! CLI-based media tool using the external ffmpeg binary

use super::traits::{MediaTool, MediaToolCapabilities, ToolRun};
use async_trait::async_trait;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// CLI-based media tool using the external `ffmpeg` binary
///
/// Runs with `-v error`, so any stderr output is a real decode problem.
///
/// # Examples
///
/// ```no_run
/// use media_acquire::media::CliMediaTool;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let tool = CliMediaTool::new(PathBuf::from("/usr/bin/ffmpeg"));
///
/// // Or auto-discover from PATH
/// let tool = CliMediaTool::from_path().expect("ffmpeg not found in PATH");
/// ```
pub struct CliMediaTool {
    binary_path: PathBuf,
}

impl CliMediaTool {
    /// Create a new CLI tool with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find ffmpeg in PATH
    pub fn from_path() -> Option<Self> {
        which::which("ffmpeg").ok().map(Self::new)
    }

    fn validate_args(path: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(path.as_os_str().to_owned());
        args.extend(["-f", "null", "-"].map(OsString::from));
        args
    }

    fn remux_args(input: &Path, output: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = ["-nostdin", "-v", "error", "-y", "-i"]
            .into_iter()
            .map(OsString::from)
            .collect();
        args.push(input.as_os_str().to_owned());
        // Video and audio only; attachments and data streams often have no
        // place in the target container
        args.extend(["-map", "0:v?", "-map", "0:a?", "-c", "copy"].map(OsString::from));
        args.push(output.as_os_str().to_owned());
        args
    }

    async fn run(&self, args: Vec<OsString>) -> crate::Result<std::process::Output> {
        debug!(binary = ?self.binary_path, ?args, "running ffmpeg");
        Command::new(&self.binary_path)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute ffmpeg: {}", e)))
    }
}

fn stderr_text(stderr: &[u8]) -> String {
    String::from_utf8_lossy(stderr).trim().to_string()
}

#[async_trait]
impl MediaTool for CliMediaTool {
    async fn validate(&self, path: &Path) -> crate::Result<ToolRun> {
        let output = self.run(Self::validate_args(path)).await?;
        let diagnostic = stderr_text(&output.stderr);

        if output.status.success() && diagnostic.is_empty() {
            return Ok(ToolRun::ok());
        }
        Ok(ToolRun::failed(if diagnostic.is_empty() {
            format!("ffmpeg exited with {}", output.status)
        } else {
            diagnostic
        }))
    }

    async fn remux(&self, input: &Path, output_path: &Path) -> crate::Result<ToolRun> {
        let output = self.run(Self::remux_args(input, output_path)).await?;
        let diagnostic = stderr_text(&output.stderr);

        if !output.status.success() {
            return Ok(ToolRun::failed(if diagnostic.is_empty() {
                format!("ffmpeg exited with {}", output.status)
            } else {
                diagnostic
            }));
        }
        if !tokio::fs::try_exists(output_path).await.unwrap_or(false) {
            return Ok(ToolRun::failed(format!(
                "ffmpeg reported success but '{}' was not created",
                output_path.display()
            )));
        }

        // Non-fatal warnings on a successful copy are kept for the log
        Ok(ToolRun {
            success: true,
            diagnostic,
        })
    }

    fn capabilities(&self) -> MediaToolCapabilities {
        MediaToolCapabilities {
            can_validate: true,
            can_remux: true,
        }
    }

    fn name(&self) -> &'static str {
        "cli-ffmpeg"
    }
}
