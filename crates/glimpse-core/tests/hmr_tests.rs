//! Hot updates flowing through a build session.

mod helpers;

use glimpse_core::{BuildSession, ChangeType, HmrAction};
use helpers::{EchoCompiler, OfflineFetcher, RecordingChannel, react_app, test_config};
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_style_edit_sends_css_update_without_rebuild() {
    let compiler = Arc::new(EchoCompiler::default());
    let session = BuildSession::builder(compiler.clone(), Arc::new(OfflineFetcher))
        .config(test_config())
        .files(react_app())
        .build()
        .unwrap();
    let channel = Arc::new(RecordingChannel::default());
    session.set_preview_channel(Some(channel.clone()));

    assert_eq!(session.notify_change("src/index.css", "h1{color:blue}"), ChangeType::Style);
    tokio::time::sleep(Duration::from_millis(500)).await;

    let messages = channel.messages.lock();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, "glimpse-hmr");
    assert_eq!(messages[0].action, HmrAction::CssUpdate);
    assert_eq!(messages[0].payload.css.as_deref(), Some("h1{color:blue}"));
    assert_eq!(compiler.calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.files().content("/src/index.css"), Some("h1{color:blue}"));
}

#[tokio::test(start_paused = true)]
async fn test_script_edit_reloads_and_rebuilds_once() {
    let compiler = Arc::new(EchoCompiler::default());
    let session = BuildSession::builder(compiler.clone(), Arc::new(OfflineFetcher))
        .config(test_config())
        .files(react_app())
        .build()
        .unwrap();
    let channel = Arc::new(RecordingChannel::default());
    session.set_preview_channel(Some(channel.clone()));

    session.notify_change("/src/App.tsx", "export default () => <h2/>;");
    for i in 0..10 {
        session.notify_change(&format!("/src/theme{i}.css"), "a{}");
    }
    tokio::time::sleep(Duration::from_millis(1_000)).await;

    let messages = channel.messages.lock();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].action, HmrAction::FullReload);
    drop(messages);

    assert_eq!(compiler.calls.load(Ordering::SeqCst), 1);
    assert!(session.current_preview().is_some());
    session.close();
}

#[tokio::test(start_paused = true)]
async fn test_close_stops_pending_updates() {
    let session = BuildSession::builder(Arc::new(EchoCompiler::default()), Arc::new(OfflineFetcher))
        .config(test_config())
        .files(react_app())
        .build()
        .unwrap();
    let channel = Arc::new(RecordingChannel::default());
    session.set_preview_channel(Some(channel.clone()));

    session.notify_change("/src/index.css", "h1{}");
    session.close();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert!(channel.messages.lock().is_empty());
    assert!(session.hmr().is_destroyed());
}
