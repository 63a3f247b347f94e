//! Shared fakes for unit tests: a media tool and an extractor with canned answers.

use crate::error::{Error, Result};
use crate::extractor::{Extractor, ExtractorCapabilities, ExtractorProgressEvent, ExtractorRequest};
use crate::media::{MediaTool, MediaToolCapabilities, ToolRun};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio_util::sync::CancellationToken;

/// How [`ScriptedTool`] answers a remux call
#[derive(Debug, Clone)]
pub(crate) enum RemuxBehavior {
    /// Write `remuxed:` + input bytes to the output and succeed
    Copy,
    /// Write a partial output, then report failure
    FailWritingTemp(String),
}

/// Media tool with canned answers that performs real file effects
pub(crate) struct ScriptedTool {
    verdict: ToolRun,
    remux: RemuxBehavior,
    validate_calls: AtomicUsize,
    remux_calls: AtomicUsize,
}

impl ScriptedTool {
    pub(crate) fn valid() -> Self {
        Self {
            verdict: ToolRun::ok(),
            remux: RemuxBehavior::Copy,
            validate_calls: AtomicUsize::new(0),
            remux_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn invalid(diagnostic: &str) -> Self {
        Self {
            verdict: ToolRun::failed(diagnostic),
            ..Self::valid()
        }
    }

    pub(crate) fn with_remux(mut self, remux: RemuxBehavior) -> Self {
        self.remux = remux;
        self
    }

    pub(crate) fn remux_calls(&self) -> usize {
        self.remux_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaTool for ScriptedTool {
    async fn validate(&self, _path: &Path) -> Result<ToolRun> {
        self.validate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict.clone())
    }

    async fn remux(&self, input: &Path, output: &Path) -> Result<ToolRun> {
        self.remux_calls.fetch_add(1, Ordering::SeqCst);
        match &self.remux {
            RemuxBehavior::Copy => {
                let mut bytes = b"remuxed:".to_vec();
                bytes.extend(tokio::fs::read(input).await?);
                tokio::fs::write(output, bytes).await?;
                Ok(ToolRun::ok())
            }
            RemuxBehavior::FailWritingTemp(diagnostic) => {
                tokio::fs::write(output, b"partial").await?;
                Ok(ToolRun::failed(diagnostic.clone()))
            }
        }
    }

    fn capabilities(&self) -> MediaToolCapabilities {
        MediaToolCapabilities {
            can_validate: true,
            can_remux: true,
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// How [`ScriptedExtractor`] answers an extract call
#[derive(Debug, Clone)]
pub(crate) enum ExtractBehavior {
    /// Fail with `Error::Extraction`
    Fail(String),
    /// Write `bytes` to `<template dir>/<file_name>` after reporting progress
    Write { file_name: String, bytes: Vec<u8> },
}

/// Extractor with a canned answer that counts its calls
pub(crate) struct ScriptedExtractor {
    behavior: ExtractBehavior,
    calls: AtomicUsize,
}

impl ScriptedExtractor {
    pub(crate) fn failing(message: &str) -> Self {
        Self {
            behavior: ExtractBehavior::Fail(message.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn writing(file_name: &str, bytes: &[u8]) -> Self {
        Self {
            behavior: ExtractBehavior::Write {
                file_name: file_name.to_string(),
                bytes: bytes.to_vec(),
            },
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Extractor for ScriptedExtractor {
    async fn extract(
        &self,
        request: &ExtractorRequest,
        on_progress: &(dyn Fn(ExtractorProgressEvent) + Send + Sync),
        _cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.behavior {
            ExtractBehavior::Fail(message) => Err(Error::Extraction(message.clone())),
            ExtractBehavior::Write { file_name, bytes } => {
                let dir = Path::new(&request.output_template)
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                let path = dir.join(file_name);
                on_progress(ExtractorProgressEvent {
                    status: "downloading".into(),
                    downloaded_bytes: Some(bytes.len() as u64),
                    total_bytes: Some(bytes.len() as u64),
                    speed: None,
                    eta: None,
                });
                tokio::fs::write(&path, bytes).await?;
                Ok(path)
            }
        }
    }

    fn capabilities(&self) -> ExtractorCapabilities {
        ExtractorCapabilities { can_extract: true }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
