//! Utility functions for file operations and path manipulation

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Prefix of the temporary file a remux writes before replacing the original
pub const REMUX_TEMP_PREFIX: &str = "fixed_";

/// Suffix of the file a direct fetch streams into before it is complete
pub const PARTIAL_SUFFIX: &str = ".part";

/// Longest extension accepted as such; anything longer is treated as part of the stem
const MAX_EXTENSION_LEN: usize = 10;

/// Restrict a single path component to `[A-Za-z0-9_-]`
///
/// Runs of whitespace collapse to one `_`; every other character is dropped.
///
/// # Examples
///
/// ```
/// use media_acquire::utils::sanitize_component;
///
/// assert_eq!(sanitize_component("My  Cool Video!"), "My_Cool_Video");
/// assert_eq!(sanitize_component("../../etc/passwd"), "etcpasswd");
/// ```
pub fn sanitize_component(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;

    for c in name.trim().chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
                in_whitespace = true;
            }
            continue;
        }
        in_whitespace = false;
        if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
            out.push(c);
        }
    }

    out
}

/// Sanitize a filename derived from untrusted metadata
///
/// The stem and the extension are sanitized separately so the extension's dot
/// survives. Returns an empty string when nothing usable remains; callers must
/// treat that as an error.
///
/// # Examples
///
/// ```
/// use media_acquire::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("Big Buck Bunny (2008).mp4"), "Big_Buck_Bunny_2008.mp4");
/// assert_eq!(sanitize_filename("../secret"), "secret");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let name = name.trim();

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext))
            if !ext.is_empty()
                && ext.len() <= MAX_EXTENSION_LEN
                && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            (stem, Some(ext))
        }
        _ => (name, None),
    };

    let stem = sanitize_component(stem);
    if stem.is_empty() {
        return String::new();
    }

    match ext {
        Some(ext) => format!("{}.{}", stem, ext.to_ascii_lowercase()),
        None => stem,
    }
}

/// Path of the temporary remux output for `path`, in the same directory
pub fn remux_temp_path(path: &Path) -> Result<PathBuf> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| Error::Remux {
            path: path.to_path_buf(),
            reason: "cannot extract file name".to_string(),
        })?;

    let sanitized = sanitize_filename(file_name);
    if sanitized.is_empty() {
        return Err(Error::Remux {
            path: path.to_path_buf(),
            reason: format!("file name {:?} is empty after sanitization", file_name),
        });
    }

    let parent = path.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(format!("{}{}", REMUX_TEMP_PREFIX, sanitized)))
}

/// Private sibling a fetch writes into before renaming onto `path`
///
/// ```
/// use media_acquire::utils::partial_path;
/// use std::path::Path;
///
/// assert_eq!(partial_path(Path::new("/out/clip.mp4")), Path::new("/out/clip.mp4.part"));
/// ```
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(PARTIAL_SUFFIX);
    path.with_file_name(name)
}

/// First of `path`, `stem_1.ext`, `stem_2.ext`, ... that does not exist yet
pub async fn unused_path(path: &Path) -> PathBuf {
    if !tokio::fs::try_exists(path).await.unwrap_or(false) {
        return path.to_path_buf();
    }

    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut n: u32 = 1;
    loop {
        let name = match &ext {
            Some(ext) => format!("{}_{}.{}", stem, n, ext),
            None => format!("{}_{}", stem, n),
        };
        let candidate = path.with_file_name(name);
        if !tokio::fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        n += 1;
    }
}

/// Create a directory and all missing parents (`mkdir -p`)
pub async fn ensure_dir(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path).await.map_err(|e| {
        Error::Io(std::io::Error::new(
            e.kind(),
            format!("failed to create directory '{}': {}", path.display(), e),
        ))
    })
}

/// Remove a partially written or rejected file
///
/// A missing file is not an error. Other failures are logged and swallowed
/// since the caller is already on an error path.
pub async fn discard_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(?path, "discarded file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(?path, error = %e, "failed to discard file"),
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn component_keeps_allowed_characters() {
        assert_eq!(sanitize_component("abc_XYZ-019"), "abc_XYZ-019");
    }

    #[test]
    fn component_collapses_whitespace_runs() {
        assert_eq!(sanitize_component("a \t\n b"), "a_b");
    }

    #[test]
    fn component_trims_outer_whitespace() {
        assert_eq!(sanitize_component("  title  "), "title");
    }

    #[test]
    fn component_strips_traversal_and_separators() {
        assert_eq!(sanitize_component("../..\\x/y"), "xy");
    }

    #[test]
    fn component_strips_shell_metacharacters() {
        assert_eq!(sanitize_component("a;rm -rf $(b)`c`|d&e"), "arm_-rf_bcde");
    }

    #[test]
    fn component_drops_non_ascii() {
        assert_eq!(sanitize_component("café 動画"), "caf_");
    }

    #[test]
    fn filename_preserves_extension_dot() {
        assert_eq!(sanitize_filename("clip.mp4"), "clip.mp4");
    }

    #[test]
    fn filename_lowercases_extension() {
        assert_eq!(sanitize_filename("CLIP.MKV"), "CLIP.mkv");
    }

    #[test]
    fn filename_with_inner_dots_keeps_only_last_as_extension() {
        assert_eq!(sanitize_filename("a.b.c.webm"), "abc.webm");
    }

    #[test]
    fn filename_without_extension() {
        assert_eq!(sanitize_filename("just a title"), "just_a_title");
    }

    #[test]
    fn filename_with_suspicious_extension_is_treated_as_stem() {
        assert_eq!(sanitize_filename("x./etc/passwd"), "xetcpasswd");
    }

    #[test]
    fn filename_that_is_only_traversal_is_empty() {
        assert_eq!(sanitize_filename("../.."), "");
        assert_eq!(sanitize_filename(".mp4"), "");
    }

    #[test]
    fn remux_temp_path_is_prefixed_sibling() {
        let temp = remux_temp_path(Path::new("/tmp/out/my clip.mp4")).unwrap();
        assert_eq!(temp, PathBuf::from("/tmp/out/fixed_my_clip.mp4"));
    }

    #[test]
    fn remux_temp_path_rejects_unsanitizable_name() {
        let result = remux_temp_path(Path::new("/tmp/out/!!!"));
        assert!(matches!(result, Err(Error::Remux { .. })));
    }

    #[test]
    fn partial_path_appends_suffix_to_full_name() {
        assert_eq!(
            partial_path(Path::new("/out/downloaded_video.mp4")),
            Path::new("/out/downloaded_video.mp4.part")
        );
    }

    #[tokio::test]
    async fn unused_path_returns_free_path_unchanged() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("clip.mp4");

        assert_eq!(unused_path(&path).await, path);
    }

    #[tokio::test]
    async fn unused_path_numbers_around_existing_files() {
        let temp = tempdir().unwrap();
        std::fs::write(temp.path().join("clip.mp4"), b"a").unwrap();
        std::fs::write(temp.path().join("clip_1.mp4"), b"b").unwrap();

        assert_eq!(
            unused_path(&temp.path().join("clip.mp4")).await,
            temp.path().join("clip_2.mp4")
        );
    }

    #[tokio::test]
    async fn ensure_dir_creates_nested_directories() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a").join("b").join("c");

        ensure_dir(&nested).await.unwrap();
        assert!(nested.is_dir());

        // Second call on an existing directory is a no-op
        ensure_dir(&nested).await.unwrap();
    }

    #[tokio::test]
    async fn discard_file_removes_and_tolerates_missing() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("partial.mp4");
        std::fs::write(&path, b"partial").unwrap();

        discard_file(&path).await;
        assert!(!path.exists());

        discard_file(&path).await;
    }
}
