//! Parser for yt-dlp output lines
//!
//! The command line asks yt-dlp to print two kinds of tagged lines (see
//! [`PROGRESS_TEMPLATE`] and [`FILEPATH_TEMPLATE`]). Everything else it prints
//! is diagnostic noise.

use super::traits::ExtractorProgressEvent;
use std::path::PathBuf;

/// Tag opening a progress line
pub const PROGRESS_TAG: &str = "[progress]";

/// Tag opening the final output path line
pub const FILEPATH_TAG: &str = "[filepath]";

/// Value of `--progress-template`
///
/// `total_bytes` falls back to yt-dlp's estimate for fragmented streams.
pub const PROGRESS_TEMPLATE: &str = "download:[progress] %(progress.status)s \
     %(progress.downloaded_bytes)s \
     %(progress.total_bytes,progress.total_bytes_estimate)s \
     %(progress.speed)s %(progress.eta)s";

/// Value of `--print`, emitted once the file reaches its final location
pub const FILEPATH_TEMPLATE: &str = "after_move:[filepath] %(filepath)s";

/// Parse a `[progress]` line
///
/// Returns `None` for any other line. Missing fields are printed by yt-dlp as
/// `NA` and come back as `None`.
///
/// # Examples
///
/// ```
/// use media_acquire::extractor::parse_progress_line;
///
/// let event = parse_progress_line("[progress] downloading 1024 4096 512.5 6").unwrap();
/// assert!(event.is_downloading());
/// assert_eq!(event.downloaded_bytes, Some(1024));
/// assert_eq!(event.total_bytes, Some(4096));
///
/// let event = parse_progress_line("[progress] downloading 1024 NA NA NA").unwrap();
/// assert_eq!(event.total_bytes, None);
/// ```
pub fn parse_progress_line(line: &str) -> Option<ExtractorProgressEvent> {
    let rest = line.trim().strip_prefix(PROGRESS_TAG)?;
    let mut fields = rest.split_whitespace();

    let status = fields.next()?.to_string();
    let downloaded_bytes = fields.next().and_then(parse_count);
    let total_bytes = fields.next().and_then(parse_count);
    let speed = fields.next().and_then(parse_float);
    let eta = fields.next().and_then(parse_count);

    Some(ExtractorProgressEvent {
        status,
        downloaded_bytes,
        total_bytes,
        speed,
        eta,
    })
}

/// Parse a `[filepath]` line into the reported output path
pub fn parse_filepath_line(line: &str) -> Option<PathBuf> {
    let rest = line.trim_end_matches(['\r', '\n']);
    let path = rest.trim_start().strip_prefix(FILEPATH_TAG)?.trim();
    if path.is_empty() || path == "NA" {
        return None;
    }
    Some(PathBuf::from(path))
}

fn parse_float(field: &str) -> Option<f64> {
    if field == "NA" || field == "None" {
        return None;
    }
    field.parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

// yt-dlp prints byte counts as floats for some estimates ("1234.0")
fn parse_count(field: &str) -> Option<u64> {
    if let Ok(v) = field.parse::<u64>() {
        return Some(v);
    }
    parse_float(field).map(|v| v.round() as u64)
}
