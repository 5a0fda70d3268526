//! MIME type detection for served files.
//!
//! Media extensions that can carry either audio or video resolve to the
//! video type.

/// MIME type constants.
pub mod types {
    // Text
    pub const HTML: &str = "text/html";
    pub const CSS: &str = "text/css";
    pub const JAVASCRIPT: &str = "text/javascript";
    pub const PLAIN: &str = "text/plain";

    // Binary
    pub const OCTET_STREAM: &str = "application/octet-stream";

    // Images
    pub const ICO: &str = "image/x-icon";
    pub const BMP: &str = "image/bmp";
    pub const SVG: &str = "image/svg+xml";
    pub const PNG: &str = "image/png";
    pub const JPEG: &str = "image/jpeg";
    pub const GIF: &str = "image/gif";
    pub const WEBP: &str = "image/webp";
    pub const AVIF: &str = "image/avif";

    // Video
    pub const MP4: &str = "video/mp4";
    pub const MPEG: &str = "video/mpeg";
    pub const OGG_VIDEO: &str = "video/ogg";
    pub const MOV: &str = "video/quicktime";
    pub const WEBM: &str = "video/webm";
    pub const AVI: &str = "video/avi";

    // Audio
    pub const MP3: &str = "audio/mpeg";
    pub const WAV: &str = "audio/vnd.wave";

    // Fonts
    pub const EOT: &str = "application/vnd.ms-fontobject";
    pub const OTF: &str = "application/x-font-opentype";
    pub const TTF: &str = "application/x-font-ttf";
    pub const WOFF: &str = "application/font-woff";
}

/// Guess MIME type from a file extension (leading dot optional, any case).
pub fn from_extension(ext: &str) -> &'static str {
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    match ext.to_ascii_lowercase().as_str() {
        // Markdown is previewed as rendered HTML
        "html" | "htmls" | "htm" | "htx" | "xhtml" | "md" | "markdown" => types::HTML,
        "css" => types::CSS,
        "js" => types::JAVASCRIPT,
        "txt" => types::PLAIN,

        "ico" => types::ICO,
        "bmp" => types::BMP,
        "svg" => types::SVG,
        "png" => types::PNG,
        "jpg" | "jpe" | "jpeg" => types::JPEG,
        "gif" => types::GIF,
        "webp" => types::WEBP,
        "avif" => types::AVIF,

        "mp4" => types::MP4,
        "mpeg" => types::MPEG,
        "ogg" | "ogv" => types::OGG_VIDEO,
        "mov" | "qt" => types::MOV,
        "webm" => types::WEBM,
        "avi" | "divx" => types::AVI,
        "mpa" | "mp3" => types::MP3,
        "wav" => types::WAV,

        "eot" => types::EOT,
        "otf" => types::OTF,
        "ttf" => types::TTF,
        "woff" => types::WOFF,

        _ => types::OCTET_STREAM,
    }
}

/// MIME type of a `/`-separated project path.
pub fn from_path(path: &str) -> &'static str {
    super::extension(path).map_or(types::OCTET_STREAM, from_extension)
}

/// Check if the MIME type's top-level type is `text`.
pub fn is_text(mime: &str) -> bool {
    mime.split('/')
        .next()
        .is_some_and(|top| top.trim().eq_ignore_ascii_case("text"))
        && mime.contains('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_extension() {
        assert_eq!(from_extension("html"), types::HTML);
        assert_eq!(from_extension(".MD"), types::HTML);
        assert_eq!(from_extension("css"), types::CSS);
        assert_eq!(from_extension("jpe"), types::JPEG);
        assert_eq!(from_extension("ico"), types::ICO);
        assert_eq!(from_extension("woff"), types::WOFF);
        assert_eq!(from_extension("xyz"), types::OCTET_STREAM);
        assert_eq!(from_extension(""), types::OCTET_STREAM);
    }

    #[test]
    fn test_audio_video_prefers_video() {
        assert_eq!(from_extension("ogg"), types::OGG_VIDEO);
        assert_eq!(from_extension("mpeg"), types::MPEG);
        assert_eq!(from_extension("mp4"), types::MP4);
        assert_eq!(from_extension("webm"), types::WEBM);
        assert_eq!(from_extension("mp3"), types::MP3);
    }

    #[test]
    fn test_from_path() {
        assert_eq!(from_path("/site/index.html"), types::HTML);
        assert_eq!(from_path("/img/logo.PNG"), types::PNG);
        assert_eq!(from_path("/assets/"), types::OCTET_STREAM);
    }

    #[test]
    fn test_is_text() {
        assert!(is_text(types::HTML));
        assert!(is_text(types::CSS));
        assert!(is_text("text/plain; charset=utf-8"));
        assert!(!is_text(types::PNG));
        assert!(!is_text("textual/x"));
        assert!(!is_text("text"));
        assert!(!is_text(""));
    }
}
