//! Content classification for served files.
//!
//! - [`ContentKind`]: what a file extension means for serving
//! - [`mime`]: extension to MIME type table
//! - [`url`]: relative / handle / remote URL classification

pub mod mime;
pub mod url;

use std::path::Path;

pub use url::UrlKind;

/// Kind of a served file, determines the serving branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    /// HTML document - rewritten or instrumented before serving
    Html,
    /// Stylesheet - rewritten once and served as a handle
    Css,
    /// Raster or vector image
    Image,
    /// Markdown source (rendered to HTML by the editor)
    Markdown,
    /// Anything else
    Other,
}

impl ContentKind {
    /// Detect kind from a file extension.
    ///
    /// Case-insensitive, a leading dot is ignored. Unknown extensions are `Other`.
    pub fn from_extension(ext: &str) -> Self {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        match ext.to_ascii_lowercase().as_str() {
            "html" | "htm" | "htmls" | "htx" | "xhtml" => Self::Html,
            "css" => Self::Css,
            "md" | "markdown" => Self::Markdown,
            "ico" | "bmp" | "svg" | "png" | "jpg" | "jpe" | "jpeg" | "gif" | "webp" | "avif" => {
                Self::Image
            }
            _ => Self::Other,
        }
    }

    /// Detect kind from a `/`-separated project path.
    ///
    /// Paths without an extension (including directory paths) are `Other`.
    pub fn from_path(path: &str) -> Self {
        extension(path).map_or(Self::Other, Self::from_extension)
    }

    /// Display name for this kind.
    pub fn name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Css => "css",
            Self::Image => "image",
            Self::Markdown => "markdown",
            Self::Other => "other",
        }
    }

    /// Whether documents of this kind go through the rewrite pipeline.
    #[inline]
    pub fn needs_rewriting(self) -> bool {
        matches!(self, Self::Html | Self::Css)
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Extension of the last path segment, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let name = path.rsplit('/').next().unwrap_or(path);
    Path::new(name).extension().and_then(|e| e.to_str())
}

#[inline]
pub fn is_html(ext: &str) -> bool {
    ContentKind::from_extension(ext) == ContentKind::Html
}

#[inline]
pub fn is_css(ext: &str) -> bool {
    ContentKind::from_extension(ext) == ContentKind::Css
}

#[inline]
pub fn is_image(ext: &str) -> bool {
    ContentKind::from_extension(ext) == ContentKind::Image
}

#[inline]
pub fn is_markdown(ext: &str) -> bool {
    ContentKind::from_extension(ext) == ContentKind::Markdown
}

#[inline]
pub fn needs_rewriting(ext: &str) -> bool {
    ContentKind::from_extension(ext).needs_rewriting()
}

/// Check if files with this extension can be read as UTF-8 text.
pub fn is_utf8_encoded(ext: &str) -> bool {
    mime::is_text(mime::from_extension(ext))
}
