//! CLI-based extractor using the external yt-dlp binary

use super::parser::{FILEPATH_TEMPLATE, PROGRESS_TEMPLATE, parse_filepath_line, parse_progress_line};
use super::traits::{Extractor, ExtractorCapabilities, ExtractorProgressEvent, ExtractorRequest};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::ffi::OsString;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Number of stderr lines kept for the error message
const STDERR_TAIL_LINES: usize = 8;

/// CLI-based extractor using the external `yt-dlp` binary
///
/// Progress and the final output path are read from tagged stdout lines.
/// The child is killed if the returned future is dropped or `cancel` fires.
///
/// # Examples
///
/// ```no_run
/// use media_acquire::extractor::CliExtractor;
/// use std::path::PathBuf;
///
/// // Create with explicit path
/// let extractor = CliExtractor::new(PathBuf::from("/usr/local/bin/yt-dlp"));
///
/// // Or auto-discover from PATH
/// let extractor = CliExtractor::from_path().expect("yt-dlp not found in PATH");
/// ```
pub struct CliExtractor {
    binary_path: PathBuf,
}

impl CliExtractor {
    /// Create a new CLI extractor with an explicit binary path
    pub fn new(binary_path: PathBuf) -> Self {
        Self { binary_path }
    }

    /// Attempt to find yt-dlp in PATH
    pub fn from_path() -> Option<Self> {
        which::which("yt-dlp").ok().map(Self::new)
    }

    /// Arguments passed to yt-dlp for `request`
    fn build_args(request: &ExtractorRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = [
            "--newline",
            "--no-playlist",
            "--restrict-filenames",
            // --print implies --quiet; keep the progress lines
            "--progress",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "--print",
            FILEPATH_TEMPLATE,
        ]
        .into_iter()
        .map(OsString::from)
        .collect();

        for (name, value) in &request.headers {
            args.push("--add-header".into());
            args.push(format!("{}:{}", name, value).into());
        }

        args.push("-o".into());
        args.push(request.output_template.clone().into());

        // A URL starting with '-' must not be read as an option
        args.push("--".into());
        args.push(request.url.clone().into());
        args
    }
}

/// Bounded buffer of the most recent stderr lines
#[derive(Debug, Default)]
struct StderrTail {
    lines: VecDeque<String>,
}

impl StderrTail {
    fn push(&mut self, line: String) {
        if line.trim().is_empty() {
            return;
        }
        if self.lines.len() == STDERR_TAIL_LINES {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    fn joined(&self) -> String {
        self.lines.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }
}

#[async_trait]
impl Extractor for CliExtractor {
    async fn extract(
        &self,
        request: &ExtractorRequest,
        on_progress: &(dyn Fn(ExtractorProgressEvent) + Send + Sync),
        cancel: &CancellationToken,
    ) -> crate::Result<PathBuf> {
        let mut child = Command::new(&self.binary_path)
            .args(Self::build_args(request))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| crate::Error::ExternalTool(format!("Failed to execute yt-dlp: {}", e)))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| crate::Error::ExternalTool("yt-dlp stdout unavailable".into()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| crate::Error::ExternalTool("yt-dlp stderr unavailable".into()))?;

        let mut out_lines = BufReader::new(stdout).lines();
        let mut err_lines = BufReader::new(stderr).lines();
        let mut stdout_done = false;
        let mut stderr_done = false;
        let mut final_path: Option<PathBuf> = None;
        let mut tail = StderrTail::default();

        while !(stdout_done && stderr_done) {
            tokio::select! {
                _ = cancel.cancelled() => {
                    child.start_kill().ok();
                    return Err(crate::Error::Cancelled);
                }

                res = out_lines.next_line(), if !stdout_done => match res {
                    Ok(Some(line)) => {
                        if let Some(event) = parse_progress_line(&line) {
                            on_progress(event);
                        } else if let Some(path) = parse_filepath_line(&line) {
                            debug!(?path, "yt-dlp reported output file");
                            final_path = Some(path);
                        } else {
                            trace!(line = %line, "yt-dlp stdout");
                        }
                    }
                    Ok(None) => stdout_done = true,
                    Err(e) => {
                        debug!(error = %e, "error reading yt-dlp stdout");
                        stdout_done = true;
                    }
                },

                res = err_lines.next_line(), if !stderr_done => match res {
                    Ok(Some(line)) => {
                        trace!(line = %line, "yt-dlp stderr");
                        tail.push(line);
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => {
                        debug!(error = %e, "error reading yt-dlp stderr");
                        stderr_done = true;
                    }
                },
            }
        }

        let status = tokio::select! {
            _ = cancel.cancelled() => {
                child.start_kill().ok();
                return Err(crate::Error::Cancelled);
            }
            status = child.wait() => status.map_err(|e| {
                crate::Error::ExternalTool(format!("Failed to wait for yt-dlp: {}", e))
            })?,
        };

        if !status.success() {
            let detail = tail.joined();
            return Err(crate::Error::Extraction(if detail.is_empty() {
                format!("yt-dlp exited with {}", status)
            } else {
                format!("yt-dlp exited with {}: {}", status, detail)
            }));
        }

        final_path.ok_or_else(|| {
            crate::Error::Extraction("yt-dlp finished without reporting an output file".into())
        })
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities { can_extract: true }
    }

    fn name(&self) -> &'static str {
        "cli-yt-dlp"
    }
}
