//! HTTP retrieval: direct media streaming and the video element fallback
//!
//! Both fetchers share one [`reqwest::Client`] and send an explicit
//! `User-Agent` on every request. No request timeout is set here; deadlines
//! belong to the caller wrapping the pipeline.

mod direct;
mod scrape;

pub use direct::DirectFetcher;
pub use scrape::{PageScraper, find_video_source};

use crate::error::{Error, Result};

/// Build the HTTP client shared by the fetchers
pub fn build_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| Error::Network(format!("failed to create HTTP client: {}", e)))
}
