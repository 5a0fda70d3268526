//! Lexical path utilities for `/`-separated project paths.
//!
//! Pure functions, nothing here touches the filesystem.

/// Normalize a project path lexically.
///
/// Resolves `.` and `..`, collapses repeated separators, adds the leading
/// `/` and keeps a trailing one. Returns `None` for empty input or when `..`
/// climbs above `/`.
///
/// # Examples
/// ```ignore
/// assert_eq!(normalize("/a/./b/../c.html").as_deref(), Some("/a/c.html"));
/// assert_eq!(normalize("/a/../../etc"), None);
/// ```
pub fn normalize(path: &str) -> Option<String> {
    if path.is_empty() {
        return None;
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            _ => segments.push(segment),
        }
    }

    let directory = path.ends_with('/') || path.ends_with("/.") || path.ends_with("/..");
    let mut normalized = format!("/{}", segments.join("/"));
    if directory && !segments.is_empty() {
        normalized.push('/');
    }
    Some(normalized)
}

/// Resolve a reference found inside the document at `base` to a project path.
///
/// Absolute references resolve from `/`, others from the document's directory.
pub fn resolve_reference(base: &str, reference: &str) -> Option<String> {
    if reference.starts_with('/') {
        return normalize(reference);
    }
    let dir = base.rfind('/').map_or("/", |pos| &base[..=pos]);
    normalize(&format!("{dir}{reference}"))
}

/// Check if a path names a directory (default document case).
#[inline]
pub fn is_directory(path: &str) -> bool {
    path.ends_with('/')
}
