//! The build session: one instance per active preview.
//!
//! A [`BuildSession`] owns every piece of mutable state the pipeline needs
//! (module cache, mode controller, blob ownership, pending HMR changes) so
//! several sessions can run side by side without sharing globals.
//!
//! ```text
//! files ─► detect ─► route ─► bootstrap ─► compile ─► inject ─► publish
//!   ▲                                                            │
//!   └──────────── notify_change (HMR: css-update | rebuild) ◄────┘
//! ```

use async_trait::async_trait;
use glimpse_config::GlimpseConfig;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tokio::sync::{broadcast, watch};

use crate::bootstrap::generate_bootstrap;
use crate::cache::{CacheStats, Fetcher, ModuleResolver};
use crate::error::{Error, Result};
use crate::files::{FileSet, extension, file_name, normalize_path};
use crate::framework::Framework;
use crate::hmr::{ChangeType, HmrManager, PendingChange, PreviewChannel};
use crate::inject::{
    BundleInjector, InjectOptions, InjectOutput, InjectReport, Prerendered, default_template,
};
use crate::preview::{
    BlobStore, CreatedPreview, InMemoryBlobStore, IsolatedDelivery, PreviewCreator,
    PreviewInfo, PreviewModeController, PreviewVerifier,
};
use crate::project::{ProjectLayout, detect_project};
use crate::router::{RouterAnalysis, analyze_routing, generate_router};
use crate::scheduler::{Debouncer, yield_to_event_loop};

/// One error reported by the compiler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: None,
        }
    }

    pub fn in_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// Result of one compile call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompileOutput {
    pub code: String,
    #[serde(default)]
    pub css: String,
    #[serde(default)]
    pub errors: Vec<CompileError>,
    #[serde(default)]
    pub build_time_ms: u64,
    /// The CSS step ran but produced nothing usable.
    #[serde(default)]
    pub css_failed: bool,
    #[serde(default)]
    pub prerendered: Option<Prerendered>,
}

/// The source-to-bundle compiler. Consumed, not implemented, here.
#[async_trait]
pub trait Compiler: Send + Sync + std::fmt::Debug {
    async fn compile(
        &self,
        entry: &str,
        files: &FileSet,
        resolver: &ModuleResolver,
    ) -> Result<CompileOutput>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// A build problem surfaced to the host without blocking the preview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub request: u64,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

/// What a build pass ended with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Published {
        created: CreatedPreview,
        layout: ProjectLayout,
        report: InjectReport,
    },
    /// Nothing to build yet; the project is incomplete.
    NoEntry,
    /// The last published preview stays in place.
    Failed(Vec<CompileError>),
    /// A newer request arrived while this pass ran.
    Superseded,
}

impl BuildOutcome {
    pub fn preview(&self) -> Option<&PreviewInfo> {
        match self {
            BuildOutcome::Published { created, .. } => Some(&created.preview),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct SessionInner {
    config: GlimpseConfig,
    files: RwLock<FileSet>,
    compiler: Arc<dyn Compiler>,
    resolver: ModuleResolver,
    creator: PreviewCreator,
    hmr: HmrManager,
    injector: BundleInjector,
    debouncer: Debouncer,
    requested: AtomicU64,
    preview_tx: watch::Sender<Option<PreviewInfo>>,
    diagnostics_tx: broadcast::Sender<Diagnostic>,
    closed: AtomicBool,
}

/// Assembles a [`BuildSession`].
#[derive(Debug)]
pub struct SessionBuilder {
    config: GlimpseConfig,
    compiler: Arc<dyn Compiler>,
    fetcher: Arc<dyn Fetcher>,
    blob_store: Option<Arc<dyn BlobStore>>,
    files: FileSet,
}

impl SessionBuilder {
    pub fn new(compiler: Arc<dyn Compiler>, fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            config: GlimpseConfig::default(),
            compiler,
            fetcher,
            blob_store: None,
            files: FileSet::new(),
        }
    }

    pub fn config(mut self, config: GlimpseConfig) -> Self {
        self.config = config;
        self
    }

    pub fn blob_store(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob_store = Some(store);
        self
    }

    pub fn files(mut self, files: FileSet) -> Self {
        self.files = files;
        self
    }

    /// Validate the configuration and wire the components together.
    pub fn build(self) -> Result<BuildSession> {
        glimpse_config::validate(&self.config)?;
        let config = self.config;

        let controller = Arc::new(PreviewModeController::new(&config.preview));
        let verifier = config
            .preview
            .verify
            .then(|| PreviewVerifier::new(Arc::clone(&self.fetcher), &config.preview));
        let blob_store = self
            .blob_store
            .unwrap_or_else(|| Arc::new(InMemoryBlobStore::new()));
        let creator = PreviewCreator::new(controller, blob_store, verifier);
        let resolver = ModuleResolver::new(self.fetcher, &config.cache);
        let hmr = HmrManager::from_config(&config.hmr);
        let injector = BundleInjector::new(config.inject.clone()).with_hmr(config.hmr.namespace.clone());
        let debouncer = Debouncer::new(config.build.debounce());
        let (preview_tx, _) = watch::channel(None);
        let (diagnostics_tx, _) = broadcast::channel(64);

        let inner = Arc::new(SessionInner {
            config,
            files: RwLock::new(self.files),
            compiler: self.compiler,
            resolver,
            creator,
            hmr,
            injector,
            debouncer,
            requested: AtomicU64::new(0),
            preview_tx,
            diagnostics_tx,
            closed: AtomicBool::new(false),
        });

        // Weak so the hook does not keep a closed session alive.
        let weak: Weak<SessionInner> = Arc::downgrade(&inner);
        inner.hmr.set_rebuild_hook(Some(Arc::new(move |batch: &[PendingChange]| {
            if let Some(inner) = weak.upgrade() {
                tracing::debug!(changes = batch.len(), "hot update needs a rebuild");
                BuildSession { inner }.request_build();
            }
        })));

        Ok(BuildSession { inner })
    }
}

/// Cheap to clone; clones share one session.
#[derive(Debug, Clone)]
pub struct BuildSession {
    inner: Arc<SessionInner>,
}

impl BuildSession {
    pub fn builder(compiler: Arc<dyn Compiler>, fetcher: Arc<dyn Fetcher>) -> SessionBuilder {
        SessionBuilder::new(compiler, fetcher)
    }

    pub fn config(&self) -> &GlimpseConfig {
        &self.inner.config
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.inner.resolver
    }

    pub fn controller(&self) -> &Arc<PreviewModeController> {
        self.inner.creator.controller()
    }

    pub fn creator(&self) -> &PreviewCreator {
        &self.inner.creator
    }

    pub fn hmr(&self) -> &HmrManager {
        &self.inner.hmr
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.resolver.stats()
    }

    /// Snapshot of the current file set.
    pub fn files(&self) -> FileSet {
        self.inner.files.read().clone()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Swap the whole file set. Outstanding blob URLs are revoked first.
    pub fn set_files(&self, files: FileSet) {
        self.cleanup();
        *self.inner.files.write() = files;
    }

    /// Record an edit and route it through hot updates.
    ///
    /// Style edits reach the live preview directly; script and config
    /// edits end in a debounced rebuild.
    pub fn notify_change(&self, path: &str, content: impl Into<String>) -> ChangeType {
        let path = normalize_path(path);
        let content = content.into();
        self.inner.files.write().upsert(&path, content.clone());
        self.inner.hmr.notify_change(path, content)
    }

    /// Hand hot-update messages to the live preview.
    pub fn set_preview_channel(&self, channel: Option<Arc<dyn PreviewChannel>>) {
        self.inner.hmr.set_channel(channel);
    }

    /// Enable isolated delivery through `delivery`, asking it whether it
    /// is ready to serve.
    pub async fn attach_delivery(&self, delivery: Arc<dyn IsolatedDelivery>) {
        let ready = delivery.ready().await;
        let controller = self.controller();
        controller.set_worker_available(true);
        controller.set_worker_ready(ready);
        self.inner.creator.set_delivery(Some(delivery));
        tracing::debug!(ready, "isolated delivery attached");
    }

    pub fn detach_delivery(&self) {
        self.inner.creator.set_delivery(None);
        let controller = self.controller();
        controller.set_worker_available(false);
        controller.set_worker_ready(false);
    }

    pub fn current_preview(&self) -> Option<PreviewInfo> {
        self.inner.preview_tx.borrow().clone()
    }

    pub fn subscribe_preview(&self) -> watch::Receiver<Option<PreviewInfo>> {
        self.inner.preview_tx.subscribe()
    }

    pub fn subscribe_diagnostics(&self) -> broadcast::Receiver<Diagnostic> {
        self.inner.diagnostics_tx.subscribe()
    }

    /// Ask for a build after the quiet period. Later requests replace
    /// earlier ones that have not started yet.
    ///
    /// Must be called within a tokio runtime.
    pub fn request_build(&self) -> u64 {
        let request = self.inner.requested.fetch_add(1, Ordering::AcqRel) + 1;
        if self.is_closed() {
            return request;
        }
        let session = self.clone();
        self.inner.debouncer.schedule(async move {
            if let Err(err) = session.build_now().await {
                tracing::debug!(error = %err, "scheduled build skipped");
            }
        });
        request
    }

    /// Run one full pass immediately.
    pub async fn build_now(&self) -> Result<BuildOutcome> {
        if self.is_closed() {
            return Err(Error::SessionClosed);
        }
        let inner = &self.inner;
        let request = inner.requested.fetch_add(1, Ordering::AcqRel) + 1;

        yield_to_event_loop().await;

        let mut files = inner.files.read().clone();
        let layout = detect_project(&files);
        let Some(entry) = layout.entry.clone() else {
            tracing::debug!(files = files.len(), "no entry point yet");
            return Ok(BuildOutcome::NoEntry);
        };

        if is_document(&entry) {
            let Some(html) = files.content(&entry) else {
                return Ok(BuildOutcome::NoEntry);
            };
            let injected = inner.injector.inject_document(html, &entry, &files);
            tracing::debug!(entry = %entry, "plain document, skipping compile");
            return Ok(self.publish(request, injected, layout, 0).await);
        }

        let routing = analyze_routing(&files, &inner.config.router);
        let (mount_framework, mount_entry) = self.mount_target(&layout, &entry, &routing, &mut files);
        let bootstrap = generate_bootstrap(mount_framework, &mount_entry, &files);
        files.upsert(&bootstrap.path, bootstrap.code);

        let output = match inner.compiler.compile(&bootstrap.path, &files, &inner.resolver).await {
            Ok(output) => output,
            Err(err) => CompileOutput {
                errors: vec![CompileError::new(err.to_string())],
                ..CompileOutput::default()
            },
        };
        if !output.errors.is_empty() {
            tracing::warn!(request, errors = output.errors.len(), "build failed, keeping last preview");
            for error in &output.errors {
                self.report(request, Severity::Error, error.message.clone(), error.file.clone());
            }
            return Ok(BuildOutcome::Failed(output.errors));
        }

        let template = layout
            .html_template
            .as_deref()
            .and_then(|path| files.content(path))
            .map(str::to_string)
            .unwrap_or_else(|| default_template(layout.framework, &inner.config.inject.placeholder));
        let injected = inner.injector.inject(
            &template,
            &InjectOptions {
                code: &output.code,
                css: &output.css,
                framework: layout.framework,
                custom_theme: has_custom_theme(&files),
                css_failed: output.css_failed,
                prerendered: output.prerendered.as_ref(),
            },
        );

        Ok(self.publish(request, injected, layout, output.build_time_ms).await)
    }

    fn is_superseded(&self, request: u64) -> bool {
        self.inner.requested.load(Ordering::Acquire) != request
    }

    /// Deliver `injected` unless a newer request arrived, before or during
    /// delivery.
    async fn publish(
        &self,
        request: u64,
        injected: InjectOutput,
        layout: ProjectLayout,
        build_time_ms: u64,
    ) -> BuildOutcome {
        let inner = &self.inner;
        yield_to_event_loop().await;

        if self.is_superseded(request) {
            tracing::warn!(request, "build superseded by a newer request, not publishing");
            return BuildOutcome::Superseded;
        }

        let created = inner.creator.create_preview(&injected.html).await;

        // Delivery can take seconds; a newer pass may have published meanwhile.
        if self.is_superseded(request) {
            tracing::warn!(
                request,
                build_id = created.build_id,
                "build superseded during delivery, not publishing"
            );
            return BuildOutcome::Superseded;
        }

        inner.hmr.set_build_id(created.build_id);
        inner.preview_tx.send_replace(Some(created.preview.clone()));
        tracing::info!(
            build_id = created.build_id,
            mode = ?created.mode,
            build_time_ms,
            "preview published"
        );

        BuildOutcome::Published {
            created,
            layout,
            report: injected.report,
        }
    }

    /// Entry the bootstrap should mount, generating a router when the
    /// project has several pages and no router of its own.
    fn mount_target(
        &self,
        layout: &ProjectLayout,
        entry: &str,
        routing: &RouterAnalysis,
        files: &mut FileSet,
    ) -> (Framework, String) {
        let routable = matches!(layout.framework, Framework::React | Framework::Next);
        if !routing.needs_router || !routable || routing.routes.is_empty() {
            return (layout.framework, entry.to_string());
        }

        let root_layout = match layout.framework {
            Framework::Next => find_root_layout(files, layout.prefix.as_deref()),
            _ => None,
        };
        let router = generate_router(
            &routing.routes,
            self.inner.config.router.strategy,
            root_layout.as_deref(),
        );
        tracing::debug!(routes = routing.routes.len(), "mounting generated router");
        let path = router.path.clone();
        files.upsert(&router.path, router.code);
        (Framework::React, path)
    }

    fn report(&self, request: u64, severity: Severity, message: String, file: Option<String>) {
        // No subscribers just means nobody is showing diagnostics.
        let _ = self.inner.diagnostics_tx.send(Diagnostic {
            request,
            severity,
            message,
            file,
        });
    }

    /// Revoke every blob URL this session owns. Call before swapping the
    /// file set out.
    pub fn cleanup(&self) -> usize {
        let revoked = self.inner.creator.cleanup();
        if revoked > 0 {
            tracing::debug!(revoked, "session blobs revoked");
        }
        revoked
    }

    /// Tear the session down: revoke blobs, stop timers, drop listeners.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.inner.debouncer.cancel();
        self.inner.hmr.destroy();
        self.cleanup();
        tracing::debug!("session closed");
    }
}

fn find_root_layout(files: &FileSet, prefix: Option<&str>) -> Option<String> {
    let prefix = prefix.unwrap_or("");
    ["/app", "/src/app"].iter().find_map(|dir| {
        ["tsx", "jsx", "ts", "js"]
            .iter()
            .map(|ext| format!("{prefix}{dir}/layout.{ext}"))
            .find(|path| files.contains(path))
    })
}

fn is_document(path: &str) -> bool {
    extension(path).is_some_and(|ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"))
}

/// A utility-CSS config that declares its own colors.
fn has_custom_theme(files: &FileSet) -> bool {
    files.sources().any(|file| {
        file_name(&file.path).starts_with("tailwind.config.") && file.content.contains("colors")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_custom_theme_needs_colors() {
        let plain = FileSet::from_map([("/tailwind.config.js", "module.exports = {}")]);
        assert!(!has_custom_theme(&plain));

        let themed = FileSet::from_map([(
            "/tailwind.config.ts",
            "export default { theme: { extend: { colors: { brand: '#f00' } } } }",
        )]);
        assert!(has_custom_theme(&themed));
    }

    #[test]
    fn test_document_entries() {
        assert!(is_document("/index.html"));
        assert!(is_document("/site/about.HTM"));
        assert!(!is_document("/src/main.tsx"));
    }

    #[test]
    fn test_root_layout_respects_prefix() {
        let files = FileSet::from_map([
            ("/web/app/layout.tsx", ""),
            ("/web/app/page.tsx", ""),
        ]);
        assert_eq!(
            find_root_layout(&files, Some("/web")).as_deref(),
            Some("/web/app/layout.tsx")
        );
        assert_eq!(find_root_layout(&files, None), None);
    }
}
