//! Utility functions for file paths and URLs

use crate::error::{Error, Result};
use crate::sanitize::DEFAULT_EXTENSION;
use std::path::{Path, PathBuf};

/// Maximum number of rename attempts when resolving file collisions
pub const MAX_RENAME_ATTEMPTS: u32 = 9999;

/// Longest extension accepted from a URL path
const MAX_URL_EXTENSION_LEN: usize = 5;

/// Candidate path for the `attempt`-th collision of `path`
///
/// Attempt `0` is `path` itself. Later attempts add a suffix the way browsers
/// uniquify downloads (`cat.png` -> `cat (1).png`). Only computes the name;
/// whether it is free is decided by whoever creates the file.
///
/// # Examples
///
/// ```
/// use carousel_dl::utils::numbered_path;
/// use std::path::Path;
///
/// let path = Path::new("/tmp/out/cat.png");
/// assert_eq!(numbered_path(path, 0).unwrap(), path);
/// assert_eq!(numbered_path(path, 2).unwrap(), Path::new("/tmp/out/cat (2).png"));
/// ```
pub fn numbered_path(path: &Path, attempt: u32) -> Result<PathBuf> {
    if attempt == 0 {
        return Ok(path.to_path_buf());
    }

    let stem = path.file_stem().and_then(|s| s.to_str()).ok_or_else(|| {
        Error::PersistenceFailed(format!(
            "cannot extract file stem from {}",
            path.display()
        ))
    })?;

    let parent = path.parent().ok_or_else(|| {
        Error::PersistenceFailed(format!(
            "cannot extract parent directory of {}",
            path.display()
        ))
    })?;

    let new_name = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{} ({}).{}", stem, attempt, ext),
        None => format!("{} ({})", stem, attempt),
    };
    Ok(parent.join(new_name))
}

/// Guess an image extension from a URL path
///
/// Takes the extension of the last path segment (query and fragment ignored),
/// capped at five characters. Falls back to `jpg` when the URL has no usable
/// extension.
///
/// # Examples
///
/// ```
/// use carousel_dl::utils::image_extension_from_url;
///
/// assert_eq!(image_extension_from_url("https://cdn.example/a/b.webp?x=1"), "webp");
/// assert_eq!(image_extension_from_url("https://cdn.example/a/b"), "jpg");
/// ```
pub fn image_extension_from_url(url: &str) -> String {
    let last_segment = match url::Url::parse(url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .map(str::to_string),
        // Not absolute: fall back to plain string handling
        Err(_) => url
            .split(['?', '#'])
            .next()
            .and_then(|path| path.rsplit('/').next())
            .map(str::to_string),
    };

    last_segment
        .as_deref()
        .and_then(|segment| segment.rsplit_once('.'))
        .map(|(_, ext)| ext.chars().take(MAX_URL_EXTENSION_LEN).collect::<String>())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
