//! Shared fakes for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use glimpse_core::{
    CompileError, CompileOutput, Compiler, FetchError, FetchRequest, FetchResponse, Fetcher,
    FileSet, GlimpseConfig, HmrMessage, IsolatedDelivery, ModuleResolver, PreviewChannel,
};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Returns the bootstrap plus every script it can see as the "bundle".
#[derive(Debug, Default)]
pub struct EchoCompiler {
    pub calls: AtomicUsize,
    pub css: Mutex<String>,
    pub fail_with: Mutex<Option<String>>,
    pub seen: Mutex<Vec<FileSet>>,
    /// When set, compile signals `started` and waits for `release`.
    pub gate: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl EchoCompiler {
    pub fn gated(started: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            gate: Some((started, release)),
            ..Self::default()
        }
    }

    pub fn last_files(&self) -> Option<FileSet> {
        self.seen.lock().last().cloned()
    }
}

#[async_trait]
impl Compiler for EchoCompiler {
    async fn compile(
        &self,
        entry: &str,
        files: &FileSet,
        _resolver: &ModuleResolver,
    ) -> glimpse_core::Result<CompileOutput> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().push(files.clone());
        if let Some((started, release)) = &self.gate {
            started.notify_one();
            release.notified().await;
        }

        let failure = self.fail_with.lock().clone();
        if let Some(message) = failure {
            return Ok(CompileOutput {
                errors: vec![CompileError::new(message).in_file(entry)],
                ..CompileOutput::default()
            });
        }
        Ok(CompileOutput {
            code: format!("// bundle from {entry}\n{}", files.content(entry).unwrap_or_default()),
            css: self.css.lock().clone(),
            build_time_ms: 1,
            ..CompileOutput::default()
        })
    }
}

/// Never reaches the network.
#[derive(Debug, Default)]
pub struct OfflineFetcher;

#[async_trait]
impl Fetcher for OfflineFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<FetchResponse, FetchError> {
        Err(FetchError::network(&request.url, "offline"))
    }
}

#[derive(Debug, Default)]
pub struct FakeDelivery {
    pub reject: AtomicBool,
    pub writes: Mutex<Vec<(u64, BTreeMap<String, String>)>>,
    /// When set, the write for build 1 signals `started` and waits for
    /// `release`.
    pub hold_first: Option<(Arc<Notify>, Arc<Notify>)>,
}

impl FakeDelivery {
    pub fn holding_first(started: Arc<Notify>, release: Arc<Notify>) -> Self {
        Self {
            hold_first: Some((started, release)),
            ..Self::default()
        }
    }

    pub fn rejecting() -> Self {
        let delivery = Self::default();
        delivery.reject.store(true, Ordering::SeqCst);
        delivery
    }
}

#[async_trait]
impl IsolatedDelivery for FakeDelivery {
    async fn set_preview_files(&self, files: &BTreeMap<String, String>, build_id: u64) -> bool {
        if let Some((started, release)) = self.hold_first.as_ref().filter(|_| build_id == 1) {
            started.notify_one();
            release.notified().await;
        }
        if self.reject.load(Ordering::SeqCst) {
            return false;
        }
        self.writes.lock().push((build_id, files.clone()));
        true
    }

    fn preview_url(&self) -> String {
        "http://127.0.0.1:7878/__glimpse__/preview/".to_string()
    }
}

#[derive(Debug, Default)]
pub struct RecordingChannel {
    pub messages: Mutex<Vec<HmrMessage>>,
}

impl PreviewChannel for RecordingChannel {
    fn post_message(&self, message: &HmrMessage) {
        self.messages.lock().push(message.clone());
    }
}

/// Defaults, without the verification round-trip.
pub fn test_config() -> GlimpseConfig {
    let mut config = GlimpseConfig::default();
    config.preview.verify = false;
    config
}

pub fn react_app() -> FileSet {
    FileSet::from_map([
        (
            "/index.html",
            r#"<!DOCTYPE html>
<html>
<head>
  <link rel="stylesheet" href="/src/index.css">
</head>
<body>
  <div id="root"></div>
  <script type="module" src="/src/main.tsx"></script>
</body>
</html>"#,
        ),
        (
            "/src/main.tsx",
            "import { createRoot } from 'react-dom/client';\nimport App from './App';\ncreateRoot(document.getElementById('root')).render(<App />);",
        ),
        ("/src/App.tsx", "export default function App() { return <h1>Hi</h1>; }"),
        ("/src/index.css", "h1 { color: red; }"),
    ])
}
