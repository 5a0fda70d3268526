//! Check command implementation.
//!
//! Reports, per path, whether the server would take it and which URL the
//! preview surface would be pointed at.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::PreviewConfig;
use crate::server::Server;

use super::common::build_server;

/// Execute check command. Fails if any path can't be served.
pub fn run_check(paths: &[String], config: &PreviewConfig) -> Result<()> {
    let server = build_server(config);
    let mut rejected = 0;

    for path in paths {
        if server.can_serve(path) {
            println!("{} {} -> {}", "serve".green(), path, server.path_to_url(path));
        } else {
            println!("{} {}", "skip ".yellow(), path);
            rejected += 1;
        }
    }

    if rejected > 0 {
        anyhow::bail!("{} of {} paths can't be served", rejected, paths.len());
    }
    Ok(())
}
