//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

use crate::config::StrategyChoice;

/// Live preview content server CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: preview.toml)
    #[arg(short = 'C', long, global = true, default_value = "preview.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Host directory backing the project root (overrides [project] dir)
    #[arg(short, long, global = true, value_hint = clap::ValueHint::DirPath)]
    pub dir: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Report whether paths would be served by the preview server
    #[command(visible_alias = "c")]
    Check {
        /// Project paths (e.g. /index.html, /docs/)
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Serve a project path and print the result
    #[command(visible_alias = "r")]
    Render {
        #[command(flatten)]
        args: RenderArgs,
    },

    /// Show kind and MIME type for file extensions
    #[command(visible_alias = "m")]
    Mime {
        /// Extensions with or without the leading dot
        #[arg(required = true)]
        extensions: Vec<String>,
    },
}

/// Render command arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct RenderArgs {
    /// Project path to serve
    pub path: String,

    /// Serve this file's text as an unsaved live document for PATH
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub live: Option<PathBuf>,

    /// Serving strategy (overrides [serve] strategy)
    #[arg(short, long, value_enum)]
    pub strategy: Option<StrategyChoice>,

    /// Also print the payload behind a returned handle
    #[arg(short, long)]
    pub payload: bool,
}

impl Cli {
    /// Strategy override given on the command line, if any.
    pub fn strategy(&self) -> Option<StrategyChoice> {
        match &self.command {
            Commands::Render { args } => args.strategy,
            _ => None,
        }
    }
}
