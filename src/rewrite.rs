//! Rewrite pipeline seam.
//!
//! The engine hands all HTML and CSS to a [`Rewriter`]. Errors returned
//! here reach the serve caller unchanged.
//!
//! [`ReferenceRewriter`] is the basic pipeline used by the CLI:
//! - HTML: relative `href` / `src` values that already have a registered
//!   handle point at the handle, and the transport script is injected if the
//!   document doesn't carry it yet
//! - CSS: relative `url(...)` references become project-absolute, since a
//!   stylesheet loaded from a handle has no usable base URL

use std::sync::LazyLock;

use anyhow::Result;
use async_trait::async_trait;
use regex::{Captures, Regex};

use crate::content::url::{is_relative_url, split_suffix};
use crate::embed::TransportScript;
use crate::registry::HandleRegistry;
use crate::server::inject::inject_transport;
use crate::utils::path::resolve_reference;

/// External markup / stylesheet transformation.
#[async_trait]
pub trait Rewriter: Send + Sync {
    /// Rewrite a live HTML document. Embedded references resolve through `registry`.
    async fn rewrite_html(&self, path: &str, html: String, registry: &HandleRegistry) -> Result<String>;

    /// Rewrite a stylesheet.
    async fn rewrite_css(&self, path: &str, css: String) -> Result<String>;
}

static ATTR_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(^|\s)(href|src)(\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

static CSS_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\burl\(\s*(?:"([^"]*)"|'([^']*)'|([^)"'\s]*))\s*\)"#).unwrap()
});

/// Reference-swapping rewriter with transport instrumentation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceRewriter {
    transport: TransportScript,
}

impl ReferenceRewriter {
    pub fn new(transport: TransportScript) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl Rewriter for ReferenceRewriter {
    async fn rewrite_html(&self, path: &str, html: String, registry: &HandleRegistry) -> Result<String> {
        let tag = self.transport.tag_for(path);
        // Disk documents arrive with the transport already injected
        let has_transport = html.contains(&tag);

        let swapped = ATTR_REF.replace_all(&html, |caps: &Captures| {
            let value = caps.get(4).or_else(|| caps.get(5)).map_or("", |m| m.as_str());
            let handle = is_relative_url(value)
                .then(|| resolve_reference(path, split_suffix(value).0))
                .flatten()
                .and_then(|target| registry.handle_of(&target));
            match handle {
                Some(handle) => format!("{}{}{}\"{handle}\"", &caps[1], &caps[2], &caps[3]),
                None => caps[0].to_string(),
            }
        });

        if has_transport {
            return Ok(swapped.into_owned());
        }
        let (instrumented, _) = inject_transport(&swapped, &tag);
        Ok(instrumented)
    }

    async fn rewrite_css(&self, path: &str, css: String) -> Result<String> {
        let rewritten = CSS_URL.replace_all(&css, |caps: &Captures| {
            let value = (1..=3)
                .find_map(|i| caps.get(i))
                .map_or("", |m| m.as_str());
            if !is_relative_url(value) || value.starts_with('#') {
                return caps[0].to_string();
            }
            let (target, suffix) = split_suffix(value);
            match resolve_reference(path, target) {
                Some(resolved) => format!("url(\"{resolved}{suffix}\")"),
                None => caps[0].to_string(),
            }
        });
        Ok(rewritten.into_owned())
    }
}
