//! URL path helpers

use crate::error::{Error, Result};

/// Get the directory above `path`
///
/// # Examples
/// ```ignore
/// parent("/a/b/") // -> "/a"
/// parent("/a")    // -> ""
/// parent("/")     // -> Err(Error::NoParent)
/// ```
pub fn parent(path: &str) -> Result<String> {
    let trimmed = path.trim();
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    if trimmed.is_empty() {
        return Err(Error::NoParent(path.to_string()));
    }

    match trimmed.rfind('/') {
        Some(index) => Ok(trimmed[..index].to_string()),
        None => Err(Error::NoParent(path.to_string())),
    }
}

/// Split a URL path into segments, rejecting traversal
///
/// Leading and trailing slashes are ignored, so `/dir` and `/dir/` give the
/// same segments. Empty inner segments, `.` and `..` are not found.
pub fn path_segments(path: &str) -> Result<Vec<&str>> {
    let trimmed = path.trim_matches('/');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = trimmed.split('/').collect();
    for segment in &segments {
        if segment.is_empty() || *segment == "." || *segment == ".." || segment.contains('\\') {
            return Err(Error::NotFound(path.to_string()));
        }
    }

    Ok(segments)
}

/// Whether `slug` appears in a comma-delimited exclude list
///
/// Each entry is trimmed and may carry a leading slash.
pub fn is_slug_excluded(slug: &str, exclude: Option<&str>) -> bool {
    let Some(exclude) = exclude else {
        return false;
    };

    exclude
        .split(',')
        .map(|entry| entry.trim())
        .map(|entry| entry.strip_prefix('/').unwrap_or(entry))
        .any(|entry| !entry.is_empty() && entry == slug)
}

/// Decode a percent-encoded request path
pub fn decode_path(path: &str) -> String {
    percent_encoding::percent_decode_str(path)
        .decode_utf8_lossy()
        .into_owned()
}
