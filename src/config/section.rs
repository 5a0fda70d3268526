//! `[project]` and `[serve]` sections.
//!
//! # Example
//!
//! ```toml
//! [project]
//! root = "/"                  # Virtual root every request path lives under
//! dir = "."                   # Host directory backing the root
//! index = "index.html"        # Default document for paths ending in `/`
//!
//! [serve]
//! strategy = "auto"           # auto | handle | inline
//! namespace = "live-preview"  # Handle namespace after `blob:`
//! transport = "/__preview/transport.js"  # Omit to inline the transport script
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::{DEFAULT_INDEX, DEFAULT_NAMESPACE};

/// Project tree settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    /// Virtual project root, must start with `/`.
    pub root: String,

    /// Host directory backing the root (relative to the config file).
    pub dir: PathBuf,

    /// Default document for directory paths.
    pub index: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            root: "/".into(),
            dir: PathBuf::from("."),
            index: DEFAULT_INDEX.into(),
        }
    }
}

/// How the serving strategy is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyChoice {
    /// Probe the surface once
    #[default]
    Auto,
    /// Always hand out handles
    Handle,
    /// Always hand out markup
    Inline,
}

/// Preview serving settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub strategy: StrategyChoice,

    /// Namespace used in generated handles.
    pub namespace: String,

    /// External transport script URL. `None` inlines the script.
    pub transport: Option<String>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyChoice::Auto,
            namespace: DEFAULT_NAMESPACE.into(),
            transport: None,
        }
    }
}
