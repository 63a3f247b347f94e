//! Extraction engine integration
//!
//! The engine resolves a page URL (a video site, an embed) into a media
//! stream and downloads it. It is hidden behind the [`Extractor`] trait:
//!
//! - [`CliExtractor`]: runs the external `yt-dlp` binary
//! - [`NoOpExtractor`]: stub used when no engine is installed
//!
//! [`ExtractorFetcher`] wraps an extractor as a pipeline fetch strategy,
//! translating native progress events into [`crate::ProgressSample`]s.

mod cli;
mod fetcher;
mod noop;
mod parser;
mod traits;

pub use cli::CliExtractor;
pub use fetcher::ExtractorFetcher;
pub use noop::NoOpExtractor;
pub use parser::{parse_filepath_line, parse_progress_line};
pub use traits::{Extractor, ExtractorCapabilities, ExtractorProgressEvent, ExtractorRequest};
