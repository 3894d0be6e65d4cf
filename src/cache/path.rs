//! Cache path derivation
//!
//! A cached page lives at `<root>/<entry>/index.html`, where the entry is built
//! from the site's base URL and the request path. The scheme is dropped so the
//! front-end server can map `$host$uri` straight onto the tree.

use percent_encoding::percent_decode_str;
use std::path::{MAIN_SEPARATOR, Path, PathBuf};
use thiserror::Error;
use url::Url;

/// File written inside each entry directory
pub const INDEX_FILE: &str = "index.html";

/// Why a request could not be mapped to a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// A `.` or `..` segment would escape or alias the cache root
    #[error("relative segment '{0}' in request path")]
    Traversal(String),
    /// Segment contains a character that cannot appear in a file name
    #[error("invalid path segment '{0}'")]
    InvalidSegment(String),
}

fn check_segment(segment: &str) -> Result<&str, PathError> {
    if segment == "." || segment == ".." {
        return Err(PathError::Traversal(segment.to_string()));
    }
    if segment.contains(['\\', '\0']) {
        return Err(PathError::InvalidSegment(segment.to_string()));
    }
    Ok(segment)
}

/// Normalize a configured cache root.
///
/// Returns `None` for an empty setting, which disables the cache. Trailing
/// separators are trimmed; a bare separator stays the filesystem root.
pub fn normalize_root(raw: &str) -> Option<PathBuf> {
    if raw.is_empty() {
        return None;
    }

    let trimmed = raw.trim_end_matches(['/', MAIN_SEPARATOR]);
    if trimmed.is_empty() {
        return Some(PathBuf::from(MAIN_SEPARATOR.to_string()));
    }
    Some(PathBuf::from(trimmed))
}

/// Derive the relative entry for a site base URL and request path.
///
/// The entry uses `/` separators regardless of platform and is the same string
/// stored in the tracking table. Empty segments collapse, so leading and
/// trailing separators never reach the filesystem. The base URL path is
/// percent-decoded so it matches the decoded request path.
pub fn cache_entry(base_url: &str, full_path: &str) -> Result<String, PathError> {
    let prefix = match Url::parse(base_url) {
        Ok(url) if url.has_host() => {
            let host = url.host_str().unwrap_or_default();
            let base_path = percent_decode_str(url.path()).decode_utf8_lossy();
            match url.port() {
                Some(port) => format!("{}:{}/{}", host, port, base_path),
                None => format!("{}/{}", host, base_path),
            }
        }
        // Relative base URLs ("/", "/en/") are used as-is
        _ => base_url.to_string(),
    };

    let path = full_path.split(['?', '#']).next().unwrap_or_default();

    let combined = format!("{}/{}", prefix, path);
    let segments = combined
        .split('/')
        .filter(|s| !s.is_empty())
        .map(check_segment)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(segments.join("/"))
}

/// Check an entry received from outside, such as a tracking row.
pub fn check_entry(entry: &str) -> Result<(), PathError> {
    entry
        .split('/')
        .filter(|s| !s.is_empty())
        .try_for_each(|seg| check_segment(seg).map(|_| ()))
}

/// Directory holding the entry's `index.html`.
///
/// Entries read back from the tracking table are checked again, so a row
/// holding `..` cannot point outside `root`.
pub fn entry_dir(root: &Path, entry: &str) -> Result<PathBuf, PathError> {
    entry
        .split('/')
        .filter(|s| !s.is_empty())
        .try_fold(root.to_path_buf(), |dir, seg| Ok(dir.join(check_segment(seg)?)))
}
