//! Preview configuration from `preview.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                          |
//! |-------------|--------------------------------------------------|
//! | `[project]` | Virtual root, backing directory, default document |
//! | `[serve]`   | Serving strategy, handle namespace, transport     |
//!
//! A missing config file is not an error: every field has a default.

mod error;
mod section;

pub use error::ConfigError;
pub use section::{ProjectConfig, ServeConfig, StrategyChoice};

use crate::{cli::Cli, log};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Default document for directory paths.
pub const DEFAULT_INDEX: &str = "index.html";

/// Default handle namespace.
pub const DEFAULT_NAMESPACE: &str = "live-preview";

/// Root configuration structure representing preview.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Directory relative paths resolve against (internal use only)
    #[serde(skip)]
    pub base: PathBuf,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl PreviewConfig {
    /// Load configuration for the CLI, then apply command-line overrides.
    ///
    /// Searches upward from cwd for the config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.base = path.parent().map(Path::to_path_buf).unwrap_or_else(|| cwd.clone());
                config.config_path = path;
                config
            }
            None => Self {
                base: cwd,
                ..Self::default()
            },
        };

        if let Some(dir) = &cli.dir {
            config.project.dir = dir.clone();
        }
        if let Some(strategy) = cli.strategy() {
            config.serve.strategy = strategy;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Load configuration from file path, warning about unknown fields.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            let display_path = path
                .file_name()
                .map(|n| n.to_string_lossy())
                .unwrap_or_else(|| path.to_string_lossy());
            log!("warning"; "ignoring unknown fields in {}: {}", display_path, ignored.join(", "));
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Check field values that parse fine but can't be served with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.project.root.starts_with('/') {
            return Err(ConfigError::validation(
                "project.root",
                format!("`{}` must start with `/`", self.project.root),
            ));
        }

        let index = &self.project.index;
        if index.is_empty() || index.contains('/') {
            return Err(ConfigError::validation(
                "project.index",
                format!("`{index}` must be a bare file name"),
            ));
        }
        if !crate::content::is_html(crate::content::extension(index).unwrap_or_default()) {
            return Err(ConfigError::validation(
                "project.index",
                format!("`{index}` is not an HTML document"),
            ));
        }

        if self.serve.namespace.is_empty() || self.serve.namespace.contains(char::is_whitespace) {
            return Err(ConfigError::validation(
                "serve.namespace",
                "must be non-empty and contain no whitespace",
            ));
        }
        Ok(())
    }

    /// Host directory backing the project root.
    pub fn host_dir(&self) -> PathBuf {
        self.base.join(&self.project.dir)
    }
}

/// Find config file by searching upward from current directory
///
/// ```text
/// /home/user/site/pages/blog/  ← cwd
/// /home/user/site/preview.toml ← found!
/// ```
fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let cwd = std::env::current_dir().ok()?;
    cwd.ancestors()
        .map(|dir| dir.join(config_name))
        .find(|candidate| candidate.exists())
}

#[cfg(test)]
pub fn test_parse_config(extra: &str) -> PreviewConfig {
    let (parsed, ignored) = PreviewConfig::parse_with_ignored(extra).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}
