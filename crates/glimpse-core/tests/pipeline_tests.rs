//! End-to-end tests for a build session: detection, routing, injection and
//! delivery.

mod helpers;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use glimpse_core::preview::INLINE_URL;
use glimpse_core::{
    BuildOutcome, BuildSession, DeliveryMode, Error, FileSet, InMemoryBlobStore, Severity,
};
use helpers::{EchoCompiler, FakeDelivery, OfflineFetcher, react_app, test_config};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use tokio::sync::Notify;

fn session(compiler: Arc<EchoCompiler>, files: FileSet) -> BuildSession {
    BuildSession::builder(compiler, Arc::new(OfflineFetcher))
        .config(test_config())
        .files(files)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_main_tsx_becomes_entry() {
    let files = FileSet::from_map([
        ("/src/main.tsx", "import App from './App';"),
        ("/src/App.tsx", "export default () => null;"),
    ]);
    let compiler = Arc::new(EchoCompiler::default());
    let outcome = session(compiler, files).build_now().await.unwrap();

    let BuildOutcome::Published { layout, .. } = outcome else {
        panic!("expected a published preview, got {outcome:?}");
    };
    assert_eq!(layout.prefix, None);
    assert_eq!(layout.entry.as_deref(), Some("/src/main.tsx"));
}

#[tokio::test]
async fn test_inline_preview_carries_injected_document() {
    let compiler = Arc::new(EchoCompiler::default());
    let session = session(compiler.clone(), react_app());

    let outcome = session.build_now().await.unwrap();
    let BuildOutcome::Published { created, report, .. } = outcome else {
        panic!("expected a published preview, got {outcome:?}");
    };
    assert_eq!(created.mode, DeliveryMode::Inline);
    assert_eq!(created.preview.url, INLINE_URL);

    let html = created.preview.srcdoc.as_deref().unwrap();
    assert!(!html.contains(r#"<script type="module" src="/src/main.tsx"></script>"#));
    assert!(!html.contains(r#"href="/src/index.css""#));
    assert!(html.contains("<!-- glimpse: removed"));
    assert!(report.cdn_injected(), "empty CSS still pulls in the runtime");

    // The entry mounts itself, so the bootstrap only imports it.
    let bootstrap = compiler
        .last_files()
        .and_then(|files| files.content(glimpse_core::BOOTSTRAP_PATH).map(str::to_string))
        .unwrap();
    assert_eq!(bootstrap.trim(), r#"import "/src/main.tsx";"#);

    let code = format!("// bundle from {}\n{}", glimpse_core::BOOTSTRAP_PATH, bootstrap);
    assert!(html.contains(&STANDARD.encode(code)));
    assert_eq!(session.current_preview(), Some(created.preview));
}

#[tokio::test]
async fn test_incomplete_project_is_not_an_error() {
    let files = FileSet::from_map([("/README.md", "# todo"), ("/src/utils/math.ts", "")]);
    let compiler = Arc::new(EchoCompiler::default());
    let session = session(compiler.clone(), files);

    assert_eq!(session.build_now().await.unwrap(), BuildOutcome::NoEntry);
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 0);
    assert!(session.current_preview().is_none());
}

#[tokio::test]
async fn test_app_router_pages_get_generated_router() {
    let files = FileSet::from_map([
        ("/package.json", r#"{"dependencies":{"next":"14.0.0","react":"18.2.0"}}"#),
        ("/app/layout.tsx", "export default function Layout({ children }) { return children; }"),
        ("/app/page.tsx", "export default () => <a href=\"/about\">About</a>;"),
        ("/app/about/page.tsx", "export default () => <p>About</p>;"),
    ]);
    let analysis = glimpse_core::analyze_routing(&files, &test_config().router);
    let paths: Vec<_> = analysis.routes.iter().map(|r| r.path.as_str()).collect();
    assert_eq!(paths, ["/", "/about"]);
    assert!(analysis.needs_router);

    let compiler = Arc::new(EchoCompiler::default());
    let outcome = session(compiler.clone(), files).build_now().await.unwrap();
    assert!(matches!(outcome, BuildOutcome::Published { .. }));

    let seen = compiler.last_files().unwrap();
    let router = seen.content("/__glimpse__/router.js").unwrap();
    assert!(router.contains("import Layout from \"/app/layout.tsx\""));
    assert!(router.contains("\"/about\""));
    let bootstrap = seen.content(glimpse_core::BOOTSTRAP_PATH).unwrap();
    assert!(bootstrap.contains("/__glimpse__/router.js"));
}

#[tokio::test]
async fn test_existing_router_is_left_alone() {
    let files = FileSet::from_map([
        (
            "/src/main.tsx",
            "import { BrowserRouter } from 'react-router-dom';\nimport { createRoot } from 'react-dom/client';\ncreateRoot(el).render(<BrowserRouter />);",
        ),
        ("/src/pages/index.tsx", ""),
        ("/src/pages/about.tsx", ""),
    ]);
    let compiler = Arc::new(EchoCompiler::default());
    session(compiler.clone(), files).build_now().await.unwrap();
    assert!(!compiler.last_files().unwrap().contains("/__glimpse__/router.js"));
}

#[tokio::test]
async fn test_failed_build_keeps_last_preview() {
    let compiler = Arc::new(EchoCompiler::default());
    let session = session(compiler.clone(), react_app());
    let mut diagnostics = session.subscribe_diagnostics();

    let first = session.build_now().await.unwrap();
    let published = first.preview().cloned().unwrap();

    *compiler.fail_with.lock() = Some("Unexpected token".to_string());
    let outcome = session.build_now().await.unwrap();
    let BuildOutcome::Failed(errors) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert_eq!(errors[0].message, "Unexpected token");
    assert_eq!(session.current_preview(), Some(published));

    let diagnostic = diagnostics.recv().await.unwrap();
    assert_eq!(diagnostic.severity, Severity::Error);
    assert_eq!(diagnostic.message, "Unexpected token");
}

#[tokio::test]
async fn test_isolated_delivery_publishes_worker_url() {
    let mut config = test_config();
    config.preview.prefer_isolated = true;
    let store = Arc::new(InMemoryBlobStore::new());
    let session = BuildSession::builder(Arc::new(EchoCompiler::default()), Arc::new(OfflineFetcher))
        .config(config)
        .blob_store(store.clone())
        .files(react_app())
        .build()
        .unwrap();
    let delivery = Arc::new(FakeDelivery::default());
    session.attach_delivery(delivery.clone()).await;

    let outcome = session.build_now().await.unwrap();
    let preview = outcome.preview().unwrap();
    assert_eq!(preview.url, "http://127.0.0.1:7878/__glimpse__/preview/?build=1");
    assert!(preview.srcdoc.is_none());
    assert!(preview.ready);

    let writes = delivery.writes.lock();
    assert_eq!(writes.len(), 1);
    assert!(writes[0].1["/index.html"].contains("data-glimpse=\"loader\""));
    drop(writes);

    assert_eq!(store.live_count(), 1);
    session.close();
    assert_eq!(store.live_count(), 0);
    assert!(matches!(session.build_now().await, Err(Error::SessionClosed)));
}

#[tokio::test]
async fn test_rejected_writes_fall_back_then_disable_isolated() {
    let mut config = test_config();
    config.preview.prefer_isolated = true;
    config.preview.max_failures = 2;
    let session = BuildSession::builder(Arc::new(EchoCompiler::default()), Arc::new(OfflineFetcher))
        .config(config)
        .files(react_app())
        .build()
        .unwrap();
    session.attach_delivery(Arc::new(FakeDelivery::rejecting())).await;

    for expected_failures in 1..=2 {
        let outcome = session.build_now().await.unwrap();
        let preview = outcome.preview().unwrap();
        assert_eq!(preview.url, INLINE_URL);
        assert_eq!(session.controller().failure_count(), expected_failures);
    }
    assert!(!session.controller().should_attempt_isolated());

    // Disabled: no further attempts, so no further failures.
    session.build_now().await.unwrap();
    assert_eq!(session.controller().failure_count(), 2);
}

#[tokio::test]
async fn test_superseded_build_is_not_published() {
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let compiler = Arc::new(EchoCompiler::gated(started.clone(), release.clone()));
    let session = session(compiler, react_app());

    let running = tokio::spawn({
        let session = session.clone();
        async move { session.build_now().await }
    });
    started.notified().await;
    session.request_build();
    release.notify_one();

    assert_eq!(running.await.unwrap().unwrap(), BuildOutcome::Superseded);
    assert!(session.current_preview().is_none());
    session.close();
}

#[tokio::test]
async fn test_build_overtaken_during_delivery_is_not_published() {
    let mut config = test_config();
    config.preview.prefer_isolated = true;
    let session = BuildSession::builder(Arc::new(EchoCompiler::default()), Arc::new(OfflineFetcher))
        .config(config)
        .files(react_app())
        .build()
        .unwrap();
    let started = Arc::new(Notify::new());
    let release = Arc::new(Notify::new());
    let delivery = Arc::new(FakeDelivery::holding_first(started.clone(), release.clone()));
    session.attach_delivery(delivery.clone()).await;

    let older = tokio::spawn({
        let session = session.clone();
        async move { session.build_now().await }
    });
    started.notified().await;

    let newer = session.build_now().await.unwrap();
    let newer_url = newer.preview().unwrap().url.clone();
    assert!(newer_url.ends_with("?build=2"));

    release.notify_one();
    assert_eq!(older.await.unwrap().unwrap(), BuildOutcome::Superseded);
    assert_eq!(session.current_preview().unwrap().url, newer_url);
    assert_eq!(session.creator().last_build_id(), 2);
    session.close();
}

#[tokio::test]
async fn test_plain_html_project_skips_compile() {
    let files = FileSet::from_map([
        (
            "/index.html",
            r#"<!DOCTYPE html>
<html>
<head><link rel="stylesheet" href="style.css"></head>
<body><h1>Hello</h1></body>
</html>"#,
        ),
        ("/style.css", "h1 { color: rebeccapurple; }"),
    ]);
    let compiler = Arc::new(EchoCompiler::default());
    let session = session(compiler.clone(), files);

    let outcome = session.build_now().await.unwrap();
    let BuildOutcome::Published { layout, report, .. } = &outcome else {
        panic!("expected a published preview, got {outcome:?}");
    };
    assert_eq!(layout.entry.as_deref(), Some("/index.html"));
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 0);
    assert!(!report.cdn_injected());

    let srcdoc = outcome.preview().unwrap().srcdoc.clone().unwrap();
    assert!(srcdoc.contains("<h1>Hello</h1>"));
    assert!(srcdoc.contains("h1 { color: rebeccapurple; }"));
    assert!(!srcdoc.contains("data-glimpse=\"loader\""));
    assert!(!srcdoc.contains("import \"/index.html\""));
}
