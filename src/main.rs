//! live-preview - serves editor buffers and project files to a preview surface.

#![allow(dead_code)]

mod cli;
mod config;
mod content;
mod embed;
mod error;
mod live;
mod logger;
mod probe;
mod registry;
mod rewrite;
mod server;
mod source;
mod utils;

use anyhow::Result;
use clap::{ColorChoice, Parser};
use cli::{Cli, Commands};
use config::PreviewConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    match &cli.command {
        Commands::Mime { extensions } => {
            cli::mime::run_mime(extensions);
            Ok(())
        }
        Commands::Check { paths } => {
            let config = PreviewConfig::load(&cli)?;
            cli::check::run_check(paths, &config)
        }
        Commands::Render { args } => {
            let config = PreviewConfig::load(&cli)?;
            cli::render::run_render(args, &config).await
        }
    }
}
