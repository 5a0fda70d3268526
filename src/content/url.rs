//! URL classification.
//!
//! Every non-empty URL string is exactly one of:
//! - `Handle`: an in-process handle (`blob:...`)
//! - `Remote`: anything with `//` or a `data:` URL
//! - `Relative`: a path into the project tree

/// Reserved prefix of every in-process handle.
pub const HANDLE_PREFIX: &str = "blob:";

/// How a URL relates to the project tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlKind {
    Relative,
    Handle,
    Remote,
}

impl UrlKind {
    /// Classify a URL string. Empty input yields `None`.
    pub fn classify(url: &str) -> Option<Self> {
        if url.is_empty() {
            return None;
        }
        // Checked first: `blob:http://host/uuid` also contains `//`
        if url.starts_with(HANDLE_PREFIX) {
            return Some(Self::Handle);
        }
        if url.contains("//") || is_data_url(url) {
            return Some(Self::Remote);
        }
        Some(Self::Relative)
    }
}

fn is_data_url(url: &str) -> bool {
    url.trim_start()
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

/// Check if a URL is really a relative path into the project tree.
#[inline]
pub fn is_relative_url(url: &str) -> bool {
    UrlKind::classify(url) == Some(UrlKind::Relative)
}

/// Check if a URL is an in-process handle.
#[inline]
pub fn is_handle_url(url: &str) -> bool {
    UrlKind::classify(url) == Some(UrlKind::Handle)
}

/// Split a URL into path and the `?query#fragment` suffix.
///
/// # Examples
/// ```ignore
/// assert_eq!(split_suffix("img/a.png?v=2#top"), ("img/a.png", "?v=2#top"));
/// ```
pub fn split_suffix(url: &str) -> (&str, &str) {
    match url.find(['?', '#']) {
        Some(pos) => url.split_at(pos),
        None => (url, ""),
    }
}
