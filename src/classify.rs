//! URL classification
//!
//! Purely syntactic: decides whether a URL points straight at a media file or
//! at a page the extractor must resolve. The decision looks at the path
//! component only, so query strings and fragments (`clip.mp4?token=1`) do not
//! defeat the match.

use crate::types::UrlKind;
use url::Url;

/// Raw container extensions classified as direct by default
pub const DEFAULT_DIRECT_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv"];

/// Classify `source_url` against the default extension list
///
/// # Examples
///
/// ```
/// use media_acquire::classify::classify_url;
/// use media_acquire::UrlKind;
///
/// assert_eq!(classify_url("https://x/a.mp4?token=1"), UrlKind::Direct);
/// assert_eq!(classify_url("https://www.youtube.com/watch?v=abc"), UrlKind::Indirect);
/// ```
pub fn classify_url(source_url: &str) -> UrlKind {
    classify_url_with(source_url, DEFAULT_DIRECT_EXTENSIONS)
}

/// Classify `source_url` against a caller-supplied extension list
///
/// Extensions are compared case-insensitively and may be given with or
/// without a leading dot.
pub fn classify_url_with<S: AsRef<str>>(source_url: &str, extensions: &[S]) -> UrlKind {
    let path = url_path(source_url);

    let Some(last_segment) = path.rsplit('/').next() else {
        return UrlKind::Indirect;
    };
    let Some((_, ext)) = last_segment.rsplit_once('.') else {
        return UrlKind::Indirect;
    };

    let is_direct = extensions
        .iter()
        .map(|e| e.as_ref().trim_start_matches('.'))
        .any(|e| !e.is_empty() && e.eq_ignore_ascii_case(ext));

    if is_direct {
        UrlKind::Direct
    } else {
        UrlKind::Indirect
    }
}

/// Path component of a URL
///
/// Falls back to stripping the query and fragment by hand when the string
/// does not parse as an absolute URL.
fn url_path(source_url: &str) -> String {
    if let Ok(parsed) = Url::parse(source_url) {
        return parsed.path().to_string();
    }

    let end = source_url.find(['?', '#']).unwrap_or(source_url.len());
    source_url[..end].to_string()
}
