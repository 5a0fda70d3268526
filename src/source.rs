//! Project tree and on-disk content.
//!
//! - [`ProjectRoot`]: which request paths belong to the servable tree
//! - [`ContentSource`]: where file text comes from when no live document exists

use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use crate::utils::path::normalize;

/// The servable part of the virtual path space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRoot {
    /// Always starts and ends with `/`
    prefix: String,
}

impl ProjectRoot {
    pub fn new(root: &str) -> Self {
        let mut prefix = normalize(root).unwrap_or_else(|| "/".to_string());
        if !prefix.ends_with('/') {
            prefix.push('/');
        }
        Self { prefix }
    }

    pub fn as_str(&self) -> &str {
        &self.prefix
    }

    /// Normalize `path` and check it lies inside the root.
    pub fn resolve(&self, path: &str) -> Option<String> {
        let normalized = normalize(path)?;
        let inside = normalized.starts_with(&self.prefix)
            || format!("{normalized}/") == self.prefix;
        inside.then_some(normalized)
    }

    /// Path relative to the root, without the leading separator.
    pub fn relative<'a>(&self, resolved: &'a str) -> &'a str {
        resolved
            .strip_prefix(&self.prefix)
            .or_else(|| resolved.strip_prefix(self.prefix.trim_end_matches('/')))
            .unwrap_or(resolved)
            .trim_start_matches('/')
    }
}

impl Default for ProjectRoot {
    fn default() -> Self {
        Self::new("/")
    }
}

/// Source of file text for paths without a live document.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Read the UTF-8 text of a resolved project path.
    async fn read_to_string(&self, path: &str) -> io::Result<String>;
}

/// Project files backed by a host directory.
#[derive(Debug, Clone)]
pub struct DiskSource {
    root: ProjectRoot,
    dir: PathBuf,
}

impl DiskSource {
    pub fn new(root: ProjectRoot, dir: impl Into<PathBuf>) -> Self {
        Self {
            root,
            dir: dir.into(),
        }
    }

    /// Host path of a project path, `None` outside the root.
    pub fn host_path(&self, path: &str) -> Option<PathBuf> {
        let resolved = self.root.resolve(path)?;
        let relative = self.root.relative(&resolved);
        Some(
            relative
                .split('/')
                .filter(|s| !s.is_empty())
                .fold(self.dir.clone(), |acc, segment| acc.join(segment)),
        )
    }
}

#[async_trait]
impl ContentSource for DiskSource {
    async fn read_to_string(&self, path: &str) -> io::Result<String> {
        let host = self.host_path(path).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{path} is outside {}", self.root.as_str()),
            )
        })?;
        tokio::fs::read_to_string(&host).await
    }
}
