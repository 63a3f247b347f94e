//! Configuration types for media-acquire

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Smallest accepted read chunk (8 KiB)
pub const MIN_CHUNK_SIZE: usize = 8 * 1024;

/// Largest accepted read chunk (64 KiB)
pub const MAX_CHUNK_SIZE: usize = 64 * 1024;

/// Download behavior configuration (directories, headers, chunking, post-processing)
///
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadConfig {
    /// Default destination directory (default: "./downloads")
    #[serde(default = "default_destination_dir")]
    pub destination_dir: PathBuf,

    /// Filename used for direct fetches (default: "downloaded_video.mp4")
    #[serde(default = "default_direct_filename")]
    pub direct_filename: String,

    /// Read chunk size in bytes for direct fetches (default: 8192)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// User-Agent sent with direct fetches and to the extraction engine
    ///
    /// Many media hosts reject default HTTP client identifiers, so this defaults
    /// to a desktop browser string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// User-Agent sent when fetching pages for the video element fallback
    #[serde(default = "default_scrape_user_agent")]
    pub scrape_user_agent: String,

    /// Path extensions classified as direct media files (default: mp4, mov, avi, mkv)
    #[serde(default = "default_direct_extensions")]
    pub direct_extensions: Vec<String>,

    /// Delete a downloaded file that fails validation (default: true)
    #[serde(default = "default_true")]
    pub discard_invalid: bool,

    /// Run the container remux step after validation (default: true)
    #[serde(default = "default_true")]
    pub repair: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            destination_dir: default_destination_dir(),
            direct_filename: default_direct_filename(),
            chunk_size: default_chunk_size(),
            user_agent: default_user_agent(),
            scrape_user_agent: default_scrape_user_agent(),
            direct_extensions: default_direct_extensions(),
            discard_invalid: true,
            repair: true,
        }
    }
}

/// External tool paths (ffmpeg, yt-dlp)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Path to ffmpeg executable (auto-detected if None)
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    /// Path to yt-dlp executable (auto-detected if None)
    #[serde(default)]
    pub ytdlp_path: Option<PathBuf>,

    /// Whether to search PATH for external binaries if explicit paths not set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: None,
            ytdlp_path: None,
            search_path: true,
        }
    }
}

impl ToolsConfig {
    /// Resolve the ffmpeg binary: explicit path first, then PATH lookup
    pub fn resolve_ffmpeg(&self) -> Option<PathBuf> {
        self.resolve(&self.ffmpeg_path, "ffmpeg")
    }

    /// Resolve the yt-dlp binary: explicit path first, then PATH lookup
    pub fn resolve_ytdlp(&self) -> Option<PathBuf> {
        self.resolve(&self.ytdlp_path, "yt-dlp")
    }

    fn resolve(&self, explicit: &Option<PathBuf>, binary: &str) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.clone());
        }
        if self.search_path {
            return which::which(binary).ok();
        }
        None
    }
}

/// Main configuration for the acquisition pipeline
///
/// Fields are organized into sub-configs:
/// - [`download`](DownloadConfig) — destination, headers, chunking, post-processing
/// - [`tools`](ToolsConfig) — external binary paths
/// - [`retry`](RetryConfig) — caller-level retry of the whole pipeline
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Download behavior settings
    #[serde(default)]
    pub download: DownloadConfig,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Retry settings used by [`crate::retry::acquire_with_retry`]
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Check settings that would otherwise fail deep inside the pipeline
    pub fn validate(&self) -> Result<()> {
        let chunk = self.download.chunk_size;
        if !(MIN_CHUNK_SIZE..=MAX_CHUNK_SIZE).contains(&chunk) {
            return Err(Error::Config {
                message: format!(
                    "chunk size {} outside {}..={} bytes",
                    chunk, MIN_CHUNK_SIZE, MAX_CHUNK_SIZE
                ),
                key: Some("chunk_size".to_string()),
            });
        }

        if crate::utils::sanitize_filename(&self.download.direct_filename).is_empty() {
            return Err(Error::Config {
                message: format!(
                    "direct filename {:?} is empty after sanitization",
                    self.download.direct_filename
                ),
                key: Some("direct_filename".to_string()),
            });
        }

        if self.download.user_agent.trim().is_empty() {
            return Err(Error::Config {
                message: "user agent must not be empty".to_string(),
                key: Some("user_agent".to_string()),
            });
        }

        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(Error::Config {
                message: format!("backoff multiplier {} must be a finite value >= 1.0", multiplier),
                key: Some("retry.backoff_multiplier".to_string()),
            });
        }

        if self.retry.max_delay < self.retry.initial_delay {
            return Err(Error::Config {
                message: format!(
                    "max delay {:?} is shorter than initial delay {:?}",
                    self.retry.max_delay, self.retry.initial_delay
                ),
                key: Some("retry.max_delay".to_string()),
            });
        }

        Ok(())
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 2 seconds)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 60 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_destination_dir() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_direct_filename() -> String {
    "downloaded_video.mp4".to_string()
}

fn default_chunk_size() -> usize {
    MIN_CHUNK_SIZE
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/124.0.0.0 Safari/537.36"
        .to_string()
}

fn default_scrape_user_agent() -> String {
    "Mozilla/5.0".to_string()
}

fn default_direct_extensions() -> Vec<String> {
    vec![
        "mp4".to_string(),
        "mov".to_string(),
        "avi".to_string(),
        "mkv".to_string(),
    ]
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(2)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(60)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
