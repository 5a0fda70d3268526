//! Embedded preview resources.
//!
//! The transport script connects a previewed document to the editor over
//! `postMessage`. It is either inlined into the document or referenced from a
//! configured URL.

const TRANSPORT_JS: &str = include_str!("serve/transport.js");

const PATH_PLACEHOLDER: &str = "__PREVIEW_DOCUMENT_PATH__";

/// How the transport script is attached to served HTML.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransportScript {
    /// Embed the script body
    #[default]
    Inline,
    /// Reference the script by URL
    External(String),
}

impl TransportScript {
    pub fn from_config(src: Option<&str>) -> Self {
        match src.map(str::trim) {
            Some(src) if !src.is_empty() => Self::External(src.to_string()),
            _ => Self::Inline,
        }
    }

    /// `<script>` tag for the document at `path`.
    pub fn tag_for(&self, path: &str) -> String {
        match self {
            Self::Inline => {
                let js = TRANSPORT_JS.replace(PATH_PLACEHOLDER, &js_string(path));
                format!("<script>{js}</script>")
            }
            Self::External(src) => format!(
                "<script src=\"{}\" data-preview-path=\"{}\"></script>",
                escape_attr(src),
                escape_attr(path)
            ),
        }
    }
}

/// JSON string literal that is safe inside a `<script>` element.
fn js_string(value: &str) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "\"\"".into())
        .replace("</", "<\\/")
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
