//! Live document tracking.
//!
//! Paths whose content is currently overridden by an open (possibly unsaved)
//! editor document. The editor owns the documents; the cache only holds weak
//! references and reads bodies on demand.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use dashmap::DashMap;
use parking_lot::RwLock;

use crate::content::ContentKind;

/// An open document whose in-memory text overrides what is on disk.
pub trait LiveDocument: Send + Sync {
    /// Project path of the document.
    fn path(&self) -> &str;

    /// Current in-memory text.
    fn body(&self) -> String;

    fn kind(&self) -> ContentKind {
        ContentKind::from_path(self.path())
    }

    /// Turn on live instrumentation. Returns `false` if the document can't be instrumented.
    fn enable_instrumentation(&self) -> bool {
        false
    }
}

/// Live documents keyed by path.
///
/// Last write wins when two documents are added for the same path.
#[derive(Default)]
pub struct LiveDocumentCache {
    docs: DashMap<String, Weak<dyn LiveDocument>>,
}

impl LiveDocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document under its own path, enabling instrumentation for
    /// HTML and CSS.
    pub fn add(&self, doc: &Arc<dyn LiveDocument>) {
        self.add_at(doc.path(), doc);
    }

    /// Register a document under `path` (usually its normalized path).
    pub fn add_at(&self, path: impl Into<String>, doc: &Arc<dyn LiveDocument>) {
        if doc.kind().needs_rewriting() && doc.enable_instrumentation() {
            crate::debug!("live"; "instrumentation enabled for {}", doc.path());
        }
        self.docs.insert(path.into(), Arc::downgrade(doc));
    }

    /// Live document for `path`. Documents dropped by the editor count as removed.
    pub fn get(&self, path: &str) -> Option<Arc<dyn LiveDocument>> {
        let doc = self.docs.get(path)?.upgrade();
        if doc.is_none() {
            self.docs.remove(path);
        }
        doc
    }

    pub fn remove(&self, path: &str) -> bool {
        self.docs.remove(path).is_some()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

/// Plain in-memory editor document.
pub struct EditorDocument {
    path: String,
    body: RwLock<String>,
    instrumented: AtomicBool,
}

impl EditorDocument {
    pub fn new(path: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            body: RwLock::new(body.into()),
            instrumented: AtomicBool::new(false),
        }
    }

    /// Replace the in-memory text (an edit in the editor).
    pub fn set_body(&self, body: impl Into<String>) {
        *self.body.write() = body.into();
    }

    pub fn is_instrumented(&self) -> bool {
        self.instrumented.load(Ordering::SeqCst)
    }
}

impl LiveDocument for EditorDocument {
    fn path(&self) -> &str {
        &self.path
    }

    fn body(&self) -> String {
        self.body.read().clone()
    }

    fn enable_instrumentation(&self) -> bool {
        self.instrumented.store(true, Ordering::SeqCst);
        true
    }
}
