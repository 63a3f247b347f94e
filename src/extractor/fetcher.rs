//! Adapter running the extraction engine as a pipeline fetch strategy

use super::traits::{Extractor, ExtractorProgressEvent, ExtractorRequest};
use crate::error::{Error, Result};
use crate::progress::ProgressReporter;
use crate::types::ProgressSample;
use crate::utils::{discard_file, sanitize_filename, unused_path};
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Suffixes of the engine's in-progress files
const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl"];

/// Fetch strategy backed by an [`Extractor`]
///
/// Builds the engine request, translates its native progress events into
/// [`ProgressSample`]s, and makes sure the final file name is sanitized.
pub struct ExtractorFetcher {
    extractor: Arc<dyn Extractor>,
    user_agent: String,
}

impl ExtractorFetcher {
    /// Create a fetcher sending `user_agent` with every engine request
    pub fn new(extractor: Arc<dyn Extractor>, user_agent: impl Into<String>) -> Self {
        Self {
            extractor,
            user_agent: user_agent.into(),
        }
    }

    /// Name of the underlying engine
    pub fn engine_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Output template rooted at `destination_dir`
    pub fn output_template(destination_dir: &Path) -> String {
        destination_dir
            .join("%(title)s.%(ext)s")
            .to_string_lossy()
            .into_owned()
    }

    /// Resolve and download `url` into `destination_dir`
    ///
    /// Every engine failure other than cancellation is reported as
    /// [`Error::Extraction`]. In-progress files the engine left behind are
    /// removed on failure.
    pub async fn fetch(
        &self,
        url: &str,
        destination_dir: &Path,
        reporter: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let request = ExtractorRequest::new(url, Self::output_template(destination_dir))
            .with_header("User-Agent", self.user_agent.clone());

        debug!(
            %url,
            engine = self.extractor.name(),
            template = %request.output_template,
            "starting extractor fetch"
        );

        let before = list_dir(destination_dir).await;
        let adapter = ProgressAdapter::new(reporter);
        let on_progress = |event: ExtractorProgressEvent| adapter.on_event(event);

        let result = self.extractor.extract(&request, &on_progress, cancel).await;

        let reported = match result {
            Ok(path) => path,
            Err(e) => {
                discard_new_partials(destination_dir, &before).await;
                return Err(match e {
                    Error::Cancelled => Error::Cancelled,
                    Error::Extraction(msg) => Error::Extraction(msg),
                    other => Error::Extraction(format!("{}: {}", self.extractor.name(), other)),
                });
            }
        };

        let final_path = finalize_output(&reported, destination_dir).await?;
        info!(%url, path = ?final_path, "extractor fetch complete");
        Ok(final_path)
    }
}

#[derive(Debug, Default)]
struct AdapterState {
    /// Bytes from formats that already finished
    offset: u64,
    /// Last raw counter seen from the engine
    last_raw: u64,
    /// Last value handed to the reporter
    last_reported: u64,
}

/// Translates engine progress events into samples
///
/// Engines restart their byte counter for each format they download
/// (separate audio and video streams). A drop in the raw counter is taken
/// as a new format and the previous count is carried as an offset, so the
/// reported value never decreases.
struct ProgressAdapter<'a> {
    reporter: &'a dyn ProgressReporter,
    state: Mutex<AdapterState>,
}

impl<'a> ProgressAdapter<'a> {
    fn new(reporter: &'a dyn ProgressReporter) -> Self {
        Self {
            reporter,
            state: Mutex::new(AdapterState::default()),
        }
    }

    fn on_event(&self, event: ExtractorProgressEvent) {
        let Some(raw) = event.downloaded_bytes else {
            return;
        };

        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if raw < state.last_raw {
            state.offset += state.last_raw;
        }
        state.last_raw = raw;

        // Non-download statuses only feed the counter tracking
        if !event.is_downloading() {
            return;
        }

        let bytes_downloaded = (state.offset + raw).max(state.last_reported);
        state.last_reported = bytes_downloaded;

        let total_bytes = match event.total_bytes {
            Some(total) if total > 0 => (state.offset + total).max(bytes_downloaded),
            _ => 0,
        };
        drop(state);

        self.reporter.report(ProgressSample {
            bytes_downloaded,
            total_bytes,
            speed_bps: event.speed,
            eta_secs: event.eta,
        });
    }
}

/// Check the engine's output and move it to its sanitized name
async fn finalize_output(reported: &Path, destination_dir: &Path) -> Result<PathBuf> {
    if !tokio::fs::try_exists(reported).await.unwrap_or(false) {
        return Err(Error::Extraction(format!(
            "engine reported '{}' but the file does not exist",
            reported.display()
        )));
    }

    let original_name = reported
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let sanitized = sanitize_filename(original_name);
    if sanitized.is_empty() {
        return Err(Error::Extraction(format!(
            "engine output name {:?} is empty after sanitization",
            original_name
        )));
    }

    let preferred = destination_dir.join(&sanitized);
    if preferred == reported {
        return Ok(preferred);
    }

    let target = unused_path(&preferred).await;
    if target != preferred {
        warn!(
            existing = ?preferred,
            renamed = ?target,
            "sanitized name already taken, keeping the existing file"
        );
    }

    debug!(from = ?reported, to = ?target, "renaming engine output to sanitized name");
    tokio::fs::rename(reported, &target).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!(
                "failed to move '{}' to '{}': {}",
                reported.display(),
                target.display(),
                e
            ),
        ))
    })?;
    Ok(target)
}

async fn list_dir(dir: &Path) -> HashSet<OsString> {
    let mut names = HashSet::new();
    let Ok(mut entries) = tokio::fs::read_dir(dir).await else {
        return names;
    };
    while let Ok(Some(entry)) = entries.next_entry().await {
        names.insert(entry.file_name());
    }
    names
}

async fn discard_new_partials(dir: &Path, before: &HashSet<OsString>) {
    for name in list_dir(dir).await.difference(before) {
        let is_partial = name
            .to_str()
            .is_some_and(|n| PARTIAL_SUFFIXES.iter().any(|s| n.ends_with(s)) || n.contains(".part-Frag"));
        if is_partial {
            discard_file(&dir.join(name)).await;
        }
    }
}
