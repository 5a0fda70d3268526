//! Render command implementation.
//!
//! Serves one project path the way the preview surface would request it and
//! prints what comes back: markup, or a handle (optionally with its payload).

use std::fs;
use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::cli::args::RenderArgs;
use crate::config::PreviewConfig;
use crate::live::{EditorDocument, LiveDocument};
use crate::log;
use crate::server::{HtmlServer, Served, Server};

use super::common::build_server;

/// Execute render command.
pub async fn run_render(args: &RenderArgs, config: &PreviewConfig) -> Result<()> {
    let server = build_server(config);
    let output = render(&server, args).await?;

    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    if !output.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}

async fn render(server: &HtmlServer, args: &RenderArgs) -> Result<String> {
    // Keep the live document alive for the whole request; the cache only
    // holds a weak reference.
    let _live = match &args.live {
        Some(file) => {
            let body = fs::read_to_string(file)
                .with_context(|| format!("Failed to read live document {}", file.display()))?;
            let doc: Arc<dyn LiveDocument> = Arc::new(EditorDocument::new(&args.path, body));
            if !server.add(&doc) {
                anyhow::bail!("{} is outside the project root", args.path);
            }
            log!("live"; "serving {} from {}", args.path, file.display());
            Some(doc)
        }
        None => None,
    };

    // Settle the strategy up front so a probe failure isn't reported as a
    // failure of this path.
    server.ready_to_serve().await?;

    let served = server
        .serve_for_path(&args.path)
        .await
        .with_context(|| format!("Failed to serve {}", args.path))?;

    Ok(match served {
        Served::Markup(markup) => markup,
        Served::Handle(handle) if args.payload => {
            let payload = server
                .registry()
                .payload_of(&handle)
                .with_context(|| format!("Handle {handle} has no payload"))?;
            format!("{handle}\n{}\n\n{}", payload.mime, payload.body)
        }
        Served::Handle(handle) => handle,
    })
}
