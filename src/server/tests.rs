//! Serving engine tests with in-memory collaborators.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Result;
use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Notify;

use super::*;
use crate::live::EditorDocument;
use crate::rewrite::ReferenceRewriter;
use crate::probe::{StrategyState, Surface};

// =============================================================================
// Fakes
// =============================================================================

#[derive(Default)]
struct MemorySource {
    files: FxHashMap<String, String>,
    reads: AtomicUsize,
}

impl MemorySource {
    fn with(files: &[(&str, &str)]) -> Self {
        Self {
            files: files
                .iter()
                .map(|(path, body)| (path.to_string(), body.to_string()))
                .collect(),
            reads: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ContentSource for MemorySource {
    async fn read_to_string(&self, path: &str) -> io::Result<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.to_string()))
    }
}

#[derive(Default)]
struct CountingRewriter {
    html_calls: AtomicUsize,
    css_calls: AtomicUsize,
    fail: bool,
}

#[async_trait]
impl Rewriter for CountingRewriter {
    async fn rewrite_html(&self, path: &str, html: String, _registry: &HandleRegistry) -> Result<String> {
        self.html_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("cannot rewrite {path}");
        }
        Ok(format!("<!-- rewritten -->{html}"))
    }

    async fn rewrite_css(&self, path: &str, css: String) -> Result<String> {
        self.css_calls.fetch_add(1, Ordering::SeqCst);
        // Give concurrent requests for the same stylesheet a chance to run
        tokio::task::yield_now().await;
        if self.fail {
            anyhow::bail!("cannot rewrite {path}");
        }
        Ok(format!("/* rewritten */{css}"))
    }
}

struct GatedSurface {
    gate: Notify,
    answer: bool,
}

#[async_trait]
impl Surface for GatedSurface {
    async fn supports_handle_documents(&self) -> Result<bool> {
        self.gate.notified().await;
        Ok(self.answer)
    }
}

struct BrokenSurface;

#[async_trait]
impl Surface for BrokenSurface {
    async fn supports_handle_documents(&self) -> Result<bool> {
        anyhow::bail!("surface detached")
    }
}

const SNIPPET: &str = "<script src=\"/t.js\" data-preview-path=\"/index.html\"></script>";

struct Fixture {
    server: HtmlServer,
    source: Arc<MemorySource>,
    rewriter: Arc<CountingRewriter>,
}

fn fixture_with(files: &[(&str, &str)], rewriter: CountingRewriter, probe: CapabilityProbe) -> Fixture {
    let source = Arc::new(MemorySource::with(files));
    let rewriter = Arc::new(rewriter);
    let server = HtmlServer::new(
        ProjectRoot::default(),
        Arc::new(HandleRegistry::new("test")),
        source.clone(),
        rewriter.clone(),
        Arc::new(probe),
    )
    .with_transport(TransportScript::External("/t.js".into()));
    Fixture {
        server,
        source,
        rewriter,
    }
}

fn fixture(files: &[(&str, &str)], strategy: ServingStrategy) -> Fixture {
    fixture_with(files, CountingRewriter::default(), CapabilityProbe::fixed(strategy))
}

fn live(server: &HtmlServer, path: &str, body: &str) -> Arc<dyn LiveDocument> {
    let doc: Arc<dyn LiveDocument> = Arc::new(EditorDocument::new(path, body));
    assert!(server.add(&doc));
    doc
}

// =============================================================================
// can_serve / url mapping
// =============================================================================

#[test]
fn test_can_serve() {
    let f = fixture(&[], ServingStrategy::InlineMarkup);
    assert!(f.server.can_serve("/index.html"));
    assert!(f.server.can_serve("/docs/page.HTM"));
    assert!(f.server.can_serve("/assets/"));
    assert!(!f.server.can_serve("/app.js"));
    assert!(!f.server.can_serve("/style.css"));
    assert!(!f.server.can_serve("/../outside.html"));
    assert!(!f.server.can_serve(""));
}

#[test]
fn test_can_serve_respects_root() {
    let server = HtmlServer::new(
        ProjectRoot::new("/project"),
        Arc::new(HandleRegistry::new("test")),
        Arc::new(MemorySource::default()),
        Arc::new(CountingRewriter::default()),
        Arc::new(CapabilityProbe::fixed(ServingStrategy::InlineMarkup)),
    );
    assert!(server.can_serve("/project/index.html"));
    assert!(server.can_serve("/project/sub/"));
    assert!(!server.can_serve("/elsewhere/index.html"));
    assert!(!server.can_serve("/project/../elsewhere/"));
}

#[test]
fn test_url_to_path() {
    let f = fixture(&[], ServingStrategy::InlineMarkup);
    let handle = f.server.registry().get_or_create("/style.css", "", types::CSS);

    assert_eq!(f.server.url_to_path(&handle).as_deref(), Some("/style.css"));
    assert_eq!(f.server.url_to_path("/about.html").as_deref(), Some("/about.html"));
    assert_eq!(f.server.url_to_path("https://example.com/a.html"), None);
    assert_eq!(f.server.url_to_path("data:text/html,hi"), None);
    assert_eq!(f.server.url_to_path("blob:test/ffff-dead"), None);
    assert_eq!(f.server.url_to_path(""), None);
}

#[test]
fn test_path_to_url() {
    let f = fixture(&[], ServingStrategy::InlineMarkup);
    assert_eq!(f.server.path_to_url("/style.css"), "/style.css");

    let handle = f.server.registry().get_or_create("/style.css", "", types::CSS);
    assert_eq!(f.server.path_to_url("/style.css"), handle);
}

// =============================================================================
// HTML serving
// =============================================================================

#[tokio::test]
async fn test_disk_html_is_injected_then_rewritten() {
    let f = fixture(
        &[("/index.html", "<html><head></head><body></body></html>")],
        ServingStrategy::InlineMarkup,
    );

    let served = f.server.serve_for_path("/index.html").await.unwrap();
    let markup = served.as_markup().unwrap();

    assert_eq!(
        markup,
        format!("<!-- rewritten --><html><head>{SNIPPET}</head><body></body></html>")
    );
    assert_eq!(markup.matches(SNIPPET).count(), 1);
    assert_eq!(f.rewriter.html_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_disk_html_references_are_swapped() {
    let source = Arc::new(MemorySource::with(&[
        ("/index.html", "<head><link rel=\"stylesheet\" href=\"style.css\"></head>"),
        ("/style.css", "p {}"),
    ]));
    let transport = TransportScript::External("/t.js".into());
    let server = HtmlServer::new(
        ProjectRoot::default(),
        Arc::new(HandleRegistry::new("test")),
        source,
        Arc::new(ReferenceRewriter::new(transport.clone())),
        Arc::new(CapabilityProbe::fixed(ServingStrategy::InlineMarkup)),
    )
    .with_transport(transport);

    let css = server.serve_for_path("/style.css").await.unwrap();
    let served = server.serve_for_path("/index.html").await.unwrap();
    let markup = served.as_markup().unwrap();

    assert!(markup.contains(&format!("href=\"{}\"", css.as_handle().unwrap())));
    assert_eq!(markup.matches(SNIPPET).count(), 1);
}

#[tokio::test]
async fn test_disk_html_injection_fallbacks() {
    let f = fixture(
        &[
            ("/body.html", "<html><body></body></html>"),
            ("/plain.html", "plain text"),
        ],
        ServingStrategy::InlineMarkup,
    );

    let served = f.server.serve_for_path("/body.html").await.unwrap();
    let expected = format!(
        "<!-- rewritten --><html><body></body>{}</html>",
        SNIPPET.replace("/index.html", "/body.html")
    );
    assert_eq!(served, Served::Markup(expected));

    let served = f.server.serve_for_path("/plain.html").await.unwrap();
    let expected = format!("<!-- rewritten -->plain text{}", SNIPPET.replace("/index.html", "/plain.html"));
    assert_eq!(served, Served::Markup(expected));
}

#[tokio::test]
async fn test_live_html_prefers_document_and_rewrites() {
    let f = fixture(&[("/index.html", "on disk")], ServingStrategy::InlineMarkup);
    let _doc = live(&f.server, "/index.html", "<p>unsaved</p>");

    let served = f.server.serve_for_path("/index.html").await.unwrap();

    assert_eq!(served, Served::Markup("<!-- rewritten --><p>unsaved</p>".into()));
    assert_eq!(f.rewriter.html_calls.load(Ordering::SeqCst), 1);
    assert_eq!(f.source.reads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_live_document_key_is_normalized() {
    let f = fixture(&[("/index.html", "on disk")], ServingStrategy::InlineMarkup);
    let _doc = live(&f.server, "index.html", "<p>unsaved</p>");

    for path in ["index.html", "/index.html", "/", "/./docs/../index.html"] {
        let served = f.server.serve_for_path(path).await.unwrap();
        assert_eq!(served, Served::Markup("<!-- rewritten --><p>unsaved</p>".into()), "{path}");
    }
    assert_eq!(f.source.reads.load(Ordering::SeqCst), 0);

    assert!(f.server.get("/").is_some());
    assert!(f.server.remove("./index.html"));
    assert!(f.server.get("/index.html").is_none());
}

#[test]
fn test_live_document_outside_root_is_rejected() {
    let server = HtmlServer::new(
        ProjectRoot::new("/project"),
        Arc::new(HandleRegistry::new("test")),
        Arc::new(MemorySource::default()),
        Arc::new(CountingRewriter::default()),
        Arc::new(CapabilityProbe::fixed(ServingStrategy::InlineMarkup)),
    );
    let doc: Arc<dyn LiveDocument> = Arc::new(EditorDocument::new("/elsewhere/a.html", ""));

    assert!(!server.add(&doc));
    assert!(server.get("/elsewhere/a.html").is_none());
    assert!(!server.remove("/elsewhere/a.html"));
}

#[tokio::test]
async fn test_removed_live_document_falls_back_to_disk() {
    let f = fixture(&[("/index.html", "on disk")], ServingStrategy::InlineMarkup);
    let _doc = live(&f.server, "/index.html", "<p>unsaved</p>");
    assert!(f.server.remove("/index.html"));

    let served = f.server.serve_for_path("/index.html").await.unwrap();
    assert!(served.as_markup().unwrap().starts_with("<!-- rewritten -->on disk"));
    assert_eq!(f.source.reads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_html_as_handle() {
    let f = fixture(&[("/index.html", "<head></head>")], ServingStrategy::HandleUrl);

    let served = f.server.serve_for_path("/index.html").await.unwrap();
    let handle = served.as_handle().unwrap();
    let payload = f.server.registry().payload_of(handle).unwrap();

    assert_eq!(payload.mime, types::HTML);
    assert_eq!(&*payload.body, format!("<!-- rewritten --><head>{SNIPPET}</head>"));
    assert_eq!(f.server.url_to_path(handle).as_deref(), Some("/index.html"));
}

#[tokio::test]
async fn test_html_reserve_replaces_handle() {
    let f = fixture(&[], ServingStrategy::HandleUrl);
    let editor = Arc::new(EditorDocument::new("/index.html", "v1"));
    let doc: Arc<dyn LiveDocument> = editor.clone();
    f.server.add(&doc);

    let first = f.server.serve_for_path("/index.html").await.unwrap();
    editor.set_body("v2");
    let second = f.server.serve_for_path("/index.html").await.unwrap();

    let registry = f.server.registry();
    assert_ne!(first, second);
    assert_eq!(registry.len(), 1);
    assert!(registry.payload_of(first.as_handle().unwrap()).is_none());
    assert_eq!(
        &*registry.payload_of(second.as_handle().unwrap()).unwrap().body,
        "<!-- rewritten -->v2"
    );
}

#[tokio::test]
async fn test_directory_serves_default_document() {
    let f = fixture(&[("/docs/index.html", "docs")], ServingStrategy::InlineMarkup);

    let served = f.server.serve_for_path("/docs/").await.unwrap();
    assert!(served.as_markup().unwrap().starts_with("<!-- rewritten -->docs"));
}

#[tokio::test]
async fn test_custom_default_document() {
    let source = Arc::new(MemorySource::with(&[("/home.html", "home")]));
    let server = HtmlServer::new(
        ProjectRoot::default(),
        Arc::new(HandleRegistry::new("test")),
        source,
        Arc::new(CountingRewriter::default()),
        Arc::new(CapabilityProbe::fixed(ServingStrategy::InlineMarkup)),
    )
    .with_index("home.html");

    let served = server.serve_for_path("/").await.unwrap();
    assert!(served.as_markup().unwrap().starts_with("<!-- rewritten -->home"));
}

// =============================================================================
// CSS serving
// =============================================================================

#[tokio::test]
async fn test_css_is_rewritten_once() {
    let f = fixture(&[("/style.css", "p {}")], ServingStrategy::InlineMarkup);

    let first = f.server.serve_for_path("/style.css").await.unwrap();
    let second = f.server.serve_for_path("/style.css").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(f.rewriter.css_calls.load(Ordering::SeqCst), 1);

    let payload = f.server.registry().payload_of(first.as_handle().unwrap()).unwrap();
    assert_eq!(payload.mime, types::CSS);
    assert_eq!(&*payload.body, "/* rewritten */p {}");
}

#[tokio::test]
async fn test_concurrent_css_requests_rewrite_once() {
    let f = fixture(&[("/style.css", "p {}")], ServingStrategy::InlineMarkup);

    let (first, second) = tokio::join!(
        f.server.serve_for_path("/style.css"),
        f.server.serve_for_path("/./style.css"),
    );

    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(f.rewriter.css_calls.load(Ordering::SeqCst), 1);
    assert!(f.server.css_rewrites.is_empty());
}

#[tokio::test]
async fn test_css_shared_between_documents() {
    let f = fixture(&[("/style.css", "p {}")], ServingStrategy::InlineMarkup);
    let _a = live(&f.server, "/a.html", "<link href=\"style.css\">");
    let _b = live(&f.server, "/b.html", "<link href=\"/style.css\">");

    // Each document's stylesheet request goes through the engine
    let for_a = f.server.serve_for_path("/a.html").await.unwrap();
    let css_a = f.server.serve_for_path("/style.css").await.unwrap();
    let for_b = f.server.serve_for_path("/b.html").await.unwrap();
    let css_b = f.server.serve_for_path("/./style.css").await.unwrap();

    assert!(for_a.as_markup().is_some() && for_b.as_markup().is_some());
    assert_eq!(css_a, css_b);
    assert_eq!(f.rewriter.css_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_invalidated_css_is_rewritten_again() {
    let f = fixture(&[("/style.css", "p {}")], ServingStrategy::InlineMarkup);

    let first = f.server.serve_for_path("/style.css").await.unwrap();
    assert!(f.server.registry().invalidate("/style.css"));
    let second = f.server.serve_for_path("/style.css").await.unwrap();

    assert_ne!(first, second);
    assert_eq!(f.rewriter.css_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_live_css_uses_document_body() {
    let f = fixture(&[], ServingStrategy::InlineMarkup);
    let _doc = live(&f.server, "/style.css", "a { color: red }");

    let served = f.server.serve_for_path("/style.css").await.unwrap();
    let payload = f.server.registry().payload_of(served.as_handle().unwrap()).unwrap();
    assert_eq!(&*payload.body, "/* rewritten */a { color: red }");
}

// =============================================================================
// Errors
// =============================================================================

#[tokio::test]
async fn test_missing_file_is_read_error() {
    let f = fixture(&[], ServingStrategy::InlineMarkup);

    let err = f.server.serve_for_path("/missing.html").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, ServeError::Read { ref path, .. } if path == "/missing.html"));
}

#[tokio::test]
async fn test_unexpected_kind() {
    let f = fixture(&[("/app.js", "alert(1)")], ServingStrategy::InlineMarkup);

    let err = f.server.serve_for_path("/app.js").await.unwrap_err();
    assert!(matches!(err, ServeError::UnexpectedKind(ref path) if path == "/app.js"));
}

#[tokio::test]
async fn test_rewrite_error_propagates_verbatim() {
    let f = fixture_with(
        &[("/style.css", "p {}")],
        CountingRewriter {
            fail: true,
            ..Default::default()
        },
        CapabilityProbe::fixed(ServingStrategy::HandleUrl),
    );
    let _doc = live(&f.server, "/index.html", "<p></p>");

    let err = f.server.serve_for_path("/index.html").await.unwrap_err();
    assert_eq!(err.to_string(), "cannot rewrite /index.html");

    let err = f.server.serve_for_path("/style.css").await.unwrap_err();
    assert!(matches!(err, ServeError::Rewrite(_)));
    assert!(f.server.registry().is_empty());
}

#[tokio::test]
async fn test_outside_root() {
    let f = fixture(&[], ServingStrategy::InlineMarkup);
    let err = f.server.serve_for_path("/../etc/passwd.html").await.unwrap_err();
    assert!(matches!(err, ServeError::Unresolvable(_)));
}

#[tokio::test]
async fn test_probe_failure_blocks_html_only() {
    let f = fixture_with(
        &[("/index.html", "x"), ("/style.css", "p {}")],
        CountingRewriter::default(),
        CapabilityProbe::new(Arc::new(BrokenSurface)),
    );

    let err = f.server.serve_for_path("/index.html").await.unwrap_err();
    assert!(matches!(err, ServeError::Probe(_)));
    assert_eq!(f.source.reads.load(Ordering::SeqCst), 0);

    assert!(f.server.serve_for_path("/style.css").await.is_ok());
}

// =============================================================================
// serve_for_url
// =============================================================================

#[tokio::test]
async fn test_serve_for_url() {
    let f = fixture(&[("/style.css", "p {}")], ServingStrategy::InlineMarkup);

    let handle = f.server.serve_for_path("/style.css").await.unwrap();
    let again = f
        .server
        .serve_for_url(handle.as_handle().unwrap())
        .await
        .unwrap();
    assert_eq!(handle, again);

    let relative = f.server.serve_for_url("/style.css").await.unwrap();
    assert_eq!(relative, handle);
}

#[tokio::test]
async fn test_serve_for_url_rejects_unknown() {
    let f = fixture(&[], ServingStrategy::InlineMarkup);

    let err = f.server.serve_for_url("https://example.com/").await.unwrap_err();
    assert!(matches!(err, ServeError::UnknownHandle(_)));

    let err = f.server.serve_for_url("blob:test/1-deadbeef").await.unwrap_err();
    assert!(matches!(err, ServeError::UnknownHandle(_)));
}

// =============================================================================
// Readiness ordering
// =============================================================================

#[tokio::test]
async fn test_html_waits_for_probe() {
    let surface = Arc::new(GatedSurface {
        gate: Notify::new(),
        answer: true,
    });
    let f = fixture_with(
        &[("/index.html", "<head></head>"), ("/style.css", "p {}")],
        CountingRewriter::default(),
        CapabilityProbe::new(surface.clone()),
    );
    let server = Arc::new(f.server);

    let pending = tokio::spawn({
        let server = Arc::clone(&server);
        async move { server.serve_for_path("/index.html").await }
    });
    tokio::task::yield_now().await;

    assert!(!pending.is_finished());
    assert_ne!(
        server.probe().state(),
        StrategyState::Ready(ServingStrategy::InlineMarkup)
    );
    assert_eq!(server.probe().strategy(), None);

    // CSS doesn't depend on the strategy
    assert!(server.serve_for_path("/style.css").await.is_ok());

    surface.gate.notify_one();
    let served = pending.await.unwrap().unwrap();

    assert!(served.as_handle().is_some());
    assert_eq!(
        server.probe().state(),
        StrategyState::Ready(ServingStrategy::HandleUrl)
    );
}
