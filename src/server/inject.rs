//! Transport script injection for HTML served without a live document.
//!
//! Best-effort textual heuristic, applied in priority order:
//! 1. before the first `</head>`
//! 2. before the first `</html>`
//! 3. appended to the end
//!
//! Closing tags match with whitespace inside (`< / head >`) and in any case.
//! Malformed markup may get the snippet in an odd place; that is accepted.

use std::sync::LazyLock;

use regex::Regex;

static HEAD_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*/\s*head\s*>").unwrap());
static HTML_CLOSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)<\s*/\s*html\s*>").unwrap());

/// Where the snippet went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectionPoint {
    HeadClose,
    HtmlClose,
    End,
}

/// Insert `snippet` into `html` at exactly one place.
pub fn inject_transport(html: &str, snippet: &str) -> (String, InjectionPoint) {
    let found = HEAD_CLOSE
        .find(html)
        .map(|m| (m.start(), InjectionPoint::HeadClose))
        .or_else(|| {
            HTML_CLOSE
                .find(html)
                .map(|m| (m.start(), InjectionPoint::HtmlClose))
        });

    let mut result = String::with_capacity(html.len() + snippet.len());
    match found {
        Some((pos, point)) => {
            result.push_str(&html[..pos]);
            result.push_str(snippet);
            result.push_str(&html[pos..]);
            (result, point)
        }
        None => {
            result.push_str(html);
            result.push_str(snippet);
            (result, InjectionPoint::End)
        }
    }
}
