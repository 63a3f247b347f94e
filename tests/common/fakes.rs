//! Stand-ins for yt-dlp and ffmpeg built on the public tool traits

use async_trait::async_trait;
use media_acquire::{
    Error, Extractor, ExtractorCapabilities, ExtractorProgressEvent, ExtractorRequest, MediaTool,
    MediaToolCapabilities, Result, ToolRun,
};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// Extractor that rejects every URL, like yt-dlp on an unsupported site
#[derive(Default)]
pub struct UnsupportedSiteExtractor {
    calls: AtomicUsize,
}

impl UnsupportedSiteExtractor {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for UnsupportedSiteExtractor {
    async fn extract(
        &self,
        request: &ExtractorRequest,
        _on_progress: &(dyn Fn(ExtractorProgressEvent) + Send + Sync),
        _cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Extraction(format!(
            "ERROR: Unsupported URL: {}",
            request.url
        )))
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities { can_extract: true }
    }

    fn name(&self) -> &'static str {
        "fake-unsupported"
    }
}

/// Extractor that "downloads" fixed bytes in a few progress steps
pub struct SiteExtractor {
    title: String,
    bytes: Vec<u8>,
}

impl SiteExtractor {
    pub fn new(title: &str, bytes: &[u8]) -> Self {
        Self {
            title: title.to_string(),
            bytes: bytes.to_vec(),
        }
    }
}

#[async_trait]
impl Extractor for SiteExtractor {
    async fn extract(
        &self,
        request: &ExtractorRequest,
        on_progress: &(dyn Fn(ExtractorProgressEvent) + Send + Sync),
        _cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let total = self.bytes.len() as u64;
        for done in [0, total / 2, total] {
            on_progress(ExtractorProgressEvent {
                status: "downloading".into(),
                downloaded_bytes: Some(done),
                total_bytes: Some(total),
                speed: None,
                eta: None,
            });
        }

        let template = Path::new(&request.output_template);
        let dir = template.parent().unwrap_or(Path::new("."));
        let path = dir.join(format!("{}.mp4", self.title));
        tokio::fs::write(&path, &self.bytes).await?;
        Ok(path)
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities { can_extract: true }
    }

    fn name(&self) -> &'static str {
        "fake-site"
    }
}

/// ffmpeg stand-in: files starting with `<` (HTML) fail to decode,
/// remux is a byte-identical copy
#[derive(Default)]
pub struct FakeFfmpeg {
    pub fail_remux: bool,
    remuxed: Mutex<Vec<PathBuf>>,
}

impl FakeFfmpeg {
    pub fn failing_remux() -> Self {
        Self {
            fail_remux: true,
            ..Self::default()
        }
    }

    pub fn remuxed(&self) -> Vec<PathBuf> {
        self.remuxed.lock().unwrap().clone()
    }
}

#[async_trait]
impl MediaTool for FakeFfmpeg {
    async fn validate(&self, path: &Path) -> Result<ToolRun> {
        let bytes = tokio::fs::read(path).await?;
        if bytes.is_empty() || bytes.starts_with(b"<") {
            Ok(ToolRun::failed(format!(
                "{}: Invalid data found when processing input",
                path.display()
            )))
        } else {
            Ok(ToolRun::ok())
        }
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<ToolRun> {
        self.remuxed.lock().unwrap().push(input.to_path_buf());
        if self.fail_remux {
            return Ok(ToolRun::failed("Could not write header for output file"));
        }
        tokio::fs::copy(input, output).await?;
        Ok(ToolRun::ok())
    }

    fn capabilities(&self) -> MediaToolCapabilities {
        MediaToolCapabilities {
            can_validate: true,
            can_remux: true,
        }
    }

    fn name(&self) -> &'static str {
        "fake-ffmpeg"
    }
}
