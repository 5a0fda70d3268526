//! Mime command implementation.

use crate::content::{ContentKind, mime};

/// One row of `mime` output.
fn describe(ext: &str) -> String {
    let kind = ContentKind::from_extension(ext);
    let mime_type = mime::from_extension(ext);
    let encoding = if mime::is_text(mime_type) { "text" } else { "binary" };
    format!("{ext}\t{kind}\t{mime_type}\t{encoding}")
}

/// Execute mime command.
pub fn run_mime(extensions: &[String]) {
    for ext in extensions {
        println!("{}", describe(ext));
    }
}
