//! Handle registry.
//!
//! Bidirectional mapping between project paths and opaque in-process handles,
//! with the payload each handle resolves to. At most one handle exists per
//! path: [`HandleRegistry::get_or_create`] returns the live handle when there
//! is one instead of allocating a second.
//!
//! Handles look like `blob:<namespace>/<seq>-<fingerprint>`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::content::url::HANDLE_PREFIX;
use crate::utils::hash;

/// Payload a handle resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlePayload {
    pub mime: &'static str,
    pub body: Arc<str>,
}

#[derive(Debug)]
struct Entry {
    handle: Arc<str>,
    payload: HandlePayload,
}

#[derive(Debug, Default)]
struct Tables {
    by_path: FxHashMap<String, Entry>,
    by_handle: FxHashMap<Arc<str>, String>,
}

impl Tables {
    fn remove(&mut self, path: &str) -> bool {
        match self.by_path.remove(path) {
            Some(entry) => {
                self.by_handle.remove(&entry.handle);
                true
            }
            None => false,
        }
    }
}

/// Path <-> handle registry.
///
/// Both directions live behind one lock so creation stays atomic when the
/// registry is shared across threads.
#[derive(Debug)]
pub struct HandleRegistry {
    namespace: String,
    next_seq: AtomicU64,
    tables: Mutex<Tables>,
}

impl HandleRegistry {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            next_seq: AtomicU64::new(1),
            tables: Mutex::new(Tables::default()),
        }
    }

    /// Return the handle for `path`, registering `payload` only if none exists.
    ///
    /// An existing handle is returned unchanged and its payload is kept.
    pub fn get_or_create(&self, path: &str, payload: impl Into<Arc<str>>, mime: &'static str) -> String {
        let mut tables = self.tables.lock();
        if let Some(entry) = tables.by_path.get(path) {
            return entry.handle.to_string();
        }
        self.insert(&mut tables, path, payload.into(), mime)
    }

    /// Register a fresh handle for `path`, dropping any previous one.
    pub fn replace(&self, path: &str, payload: impl Into<Arc<str>>, mime: &'static str) -> String {
        let mut tables = self.tables.lock();
        tables.remove(path);
        self.insert(&mut tables, path, payload.into(), mime)
    }

    fn insert(&self, tables: &mut Tables, path: &str, body: Arc<str>, mime: &'static str) -> String {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let handle: Arc<str> = Arc::from(format!(
            "{HANDLE_PREFIX}{}/{seq:x}-{}",
            self.namespace,
            hash::fingerprint(path)
        ));
        tables.by_handle.insert(Arc::clone(&handle), path.to_string());
        tables.by_path.insert(
            path.to_string(),
            Entry {
                handle: Arc::clone(&handle),
                payload: HandlePayload { mime, body },
            },
        );
        handle.to_string()
    }

    /// Handle registered for `path`, if any.
    pub fn handle_of(&self, path: &str) -> Option<String> {
        self.tables
            .lock()
            .by_path
            .get(path)
            .map(|entry| entry.handle.to_string())
    }

    /// Path a handle was registered for, if it is still live.
    pub fn path_of(&self, handle: &str) -> Option<String> {
        self.tables.lock().by_handle.get(handle).cloned()
    }

    /// Payload a handle resolves to, for the rendering surface.
    pub fn payload_of(&self, handle: &str) -> Option<HandlePayload> {
        let tables = self.tables.lock();
        let path = tables.by_handle.get(handle)?;
        tables.by_path.get(path).map(|entry| entry.payload.clone())
    }

    /// Handle for `path` when one exists, otherwise the path itself.
    pub fn url_for(&self, path: &str) -> String {
        self.handle_of(path).unwrap_or_else(|| path.to_string())
    }

    /// Remove the mapping for `path`. Returns whether one existed.
    pub fn invalidate(&self, path: &str) -> bool {
        self.tables.lock().remove(path)
    }

    pub fn len(&self) -> usize {
        self.tables.lock().by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for HandleRegistry {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_NAMESPACE)
    }
}
