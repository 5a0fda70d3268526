//! Live preview serving engine.
//!
//! Turns a project path into something the preview surface can load:
//!
//! ```text
//! path --> live document? --yes--> body --+--------------> HTML: rewrite_html --> strategy --> handle | markup
//!              |                          |                ^
//!              no --> disk read --> body -+--> HTML: inject
//!                                         |
//!                                         +--> CSS: handle exists? --yes--> handle
//!                                                      |
//!                                                      no --> rewrite_css --> new handle
//! ```
//!
//! Live documents are keyed by their resolved path, the same key requests
//! are looked up with.

pub mod inject;
#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::content::mime::types;
use crate::content::{ContentKind, UrlKind};
use crate::embed::TransportScript;
use crate::error::ServeError;
use crate::live::{LiveDocument, LiveDocumentCache};
use crate::probe::{CapabilityProbe, ServingStrategy};
use crate::registry::HandleRegistry;
use crate::rewrite::Rewriter;
use crate::source::{ContentSource, ProjectRoot};
use crate::utils::path::is_directory;

use inject::inject_transport;

/// Result of a serve request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Served {
    /// Text for in-place injection into the surface
    Markup(String),
    /// Handle the surface loads directly
    Handle(String),
}

impl Served {
    pub fn as_handle(&self) -> Option<&str> {
        match self {
            Self::Handle(handle) => Some(handle.as_str()),
            Self::Markup(_) => None,
        }
    }

    pub fn as_markup(&self) -> Option<&str> {
        match self {
            Self::Markup(markup) => Some(markup.as_str()),
            Self::Handle(_) => None,
        }
    }
}

/// A server the routing layer can pick for a path.
#[async_trait]
pub trait Server: Send + Sync {
    /// Whether this server handles `path`.
    fn can_serve(&self, path: &str) -> bool;

    /// URL the surface should use for `path`.
    fn path_to_url(&self, path: &str) -> String;

    /// Project path behind `url`. `None` for anything this server doesn't own.
    fn url_to_path(&self, url: &str) -> Option<String>;

    async fn serve_for_path(&self, path: &str) -> Result<Served, ServeError>;

    async fn serve_for_url(&self, url: &str) -> Result<Served, ServeError> {
        let path = self
            .url_to_path(url)
            .ok_or_else(|| ServeError::UnknownHandle(url.to_string()))?;
        self.serve_for_path(&path).await
    }
}

/// Serves HTML and CSS, preferring live documents over disk content.
pub struct HtmlServer {
    root: ProjectRoot,
    index: String,
    registry: Arc<HandleRegistry>,
    live: LiveDocumentCache,
    source: Arc<dyn ContentSource>,
    rewriter: Arc<dyn Rewriter>,
    probe: Arc<CapabilityProbe>,
    transport: TransportScript,
    /// One slot per stylesheet whose rewrite is in flight
    css_rewrites: DashMap<String, Arc<Mutex<()>>>,
}

impl HtmlServer {
    pub fn new(
        root: ProjectRoot,
        registry: Arc<HandleRegistry>,
        source: Arc<dyn ContentSource>,
        rewriter: Arc<dyn Rewriter>,
        probe: Arc<CapabilityProbe>,
    ) -> Self {
        Self {
            root,
            index: crate::config::DEFAULT_INDEX.to_string(),
            registry,
            live: LiveDocumentCache::new(),
            source,
            rewriter,
            probe,
            transport: TransportScript::default(),
            css_rewrites: DashMap::new(),
        }
    }

    /// Default document served for directory paths.
    pub fn with_index(mut self, index: impl Into<String>) -> Self {
        self.index = index.into();
        self
    }

    /// Script injected into HTML that has no live document.
    pub fn with_transport(mut self, transport: TransportScript) -> Self {
        self.transport = transport;
        self
    }

    /// Start overriding the document's path with its in-memory text.
    ///
    /// Returns `false` if the document's path lies outside the project root.
    pub fn add(&self, doc: &Arc<dyn LiveDocument>) -> bool {
        match self.resolve(doc.path()) {
            Some(path) => {
                self.live.add_at(path, doc);
                true
            }
            None => {
                crate::log!("live"; "ignoring {}: outside {}", doc.path(), self.root.as_str());
                false
            }
        }
    }

    pub fn remove(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|path| self.live.remove(&path))
    }

    pub fn get(&self, path: &str) -> Option<Arc<dyn LiveDocument>> {
        self.live.get(&self.resolve(path)?)
    }

    /// Resolved project path, with the default document for directories.
    fn resolve(&self, path: &str) -> Option<String> {
        let mut path = self.root.resolve(path)?;
        if is_directory(&path) {
            path.push_str(&self.index);
        }
        Some(path)
    }

    pub fn registry(&self) -> &Arc<HandleRegistry> {
        &self.registry
    }

    pub fn probe(&self) -> &Arc<CapabilityProbe> {
        &self.probe
    }

    /// Wait until the serving strategy is known.
    pub async fn ready_to_serve(&self) -> Result<ServingStrategy, ServeError> {
        self.probe.ready().await
    }

    async fn serve_html(&self, path: &str, body: String, live: bool) -> Result<Served, ServeError> {
        let body = if live {
            body
        } else {
            // No live document yet: at least get the transport in so the
            // preview can talk to the editor.
            let (markup, point) = inject_transport(&body, &self.transport.tag_for(path));
            crate::debug!("serve"; "transport injected at {:?} in {}", point, path);
            markup
        };
        let markup = self
            .rewriter
            .rewrite_html(path, body, &self.registry)
            .await
            .map_err(ServeError::Rewrite)?;

        match self.probe.ready().await? {
            ServingStrategy::HandleUrl => Ok(Served::Handle(self.registry.replace(path, markup, types::HTML))),
            ServingStrategy::InlineMarkup => Ok(Served::Markup(markup)),
        }
    }

    async fn serve_css(&self, path: &str, body: String) -> Result<Served, ServeError> {
        // The same stylesheet is often linked several times; rewrite it once.
        if let Some(handle) = self.registry.handle_of(path) {
            return Ok(Served::Handle(handle));
        }

        let slot = self.css_rewrites.entry(path.to_string()).or_default().value().clone();
        let result = {
            let _guard = slot.lock().await;
            match self.registry.handle_of(path) {
                // Finished while we were waiting for the slot
                Some(handle) => Ok(handle),
                None => self
                    .rewriter
                    .rewrite_css(path, body)
                    .await
                    .map(|css| self.registry.get_or_create(path, css, types::CSS)),
            }
        };
        // Map entry plus ours: nobody else is waiting
        self.css_rewrites
            .remove_if(path, |_, slot| Arc::strong_count(slot) <= 2);

        result.map(Served::Handle).map_err(ServeError::Rewrite)
    }
}

#[async_trait]
impl Server for HtmlServer {
    fn can_serve(&self, path: &str) -> bool {
        if self.root.resolve(path).is_none() {
            return false;
        }
        // Directory paths get their default document later
        if is_directory(path) {
            return true;
        }
        ContentKind::from_path(path) == ContentKind::Html
    }

    fn path_to_url(&self, path: &str) -> String {
        self.registry.url_for(path)
    }

    fn url_to_path(&self, url: &str) -> Option<String> {
        match UrlKind::classify(url)? {
            UrlKind::Handle => self.registry.path_of(url),
            UrlKind::Relative => Some(url.to_string()),
            UrlKind::Remote => None,
        }
    }

    async fn serve_for_path(&self, path: &str) -> Result<Served, ServeError> {
        let path = self
            .resolve(path)
            .ok_or_else(|| ServeError::Unresolvable(path.to_string()))?;

        let kind = ContentKind::from_path(&path);
        if kind == ContentKind::Html {
            // Strategy must be settled before any HTML work starts
            self.probe.ready().await?;
        }

        let (body, live) = match self.live.get(&path) {
            Some(doc) => (doc.body(), true),
            None => {
                let body = self
                    .source
                    .read_to_string(&path)
                    .await
                    .map_err(|e| ServeError::read(path.as_str(), e))?;
                (body, false)
            }
        };

        let result = match kind {
            ContentKind::Html => self.serve_html(&path, body, live).await,
            ContentKind::Css => self.serve_css(&path, body).await,
            _ => Err(ServeError::UnexpectedKind(path.clone())),
        };

        if let Err(e) = &result {
            crate::log!("error"; "failed to serve {}: {}", path, e);
        }
        result
    }
}
