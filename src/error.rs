//! Serving errors.

use std::io;

use thiserror::Error;

/// Failure of a single serve request.
///
/// Every variant is terminal for the request that produced it; callers decide
/// whether to retry.
#[derive(Debug, Error)]
pub enum ServeError {
    #[error("`{0}` is outside the project root")]
    Unresolvable(String),

    #[error("failed to read `{path}`")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Rewrite(anyhow::Error),

    #[error("expected .html or .css live document type: `{0}`")]
    UnexpectedKind(String),

    #[error("capability probe failed")]
    Probe(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("no content registered for `{0}`")]
    UnknownHandle(String),
}

impl ServeError {
    pub fn read(path: impl Into<String>, source: io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Whether the request failed because the file does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }
}
