#![cfg_attr(docsrs, feature(doc_cfg))]

//! # glimpse-core
//!
//! Build orchestration and preview delivery for in-browser project
//! previews.
//!
//! Given an in-memory file set, a [`BuildSession`] finds the project entry,
//! synthesizes a bootstrap (and a router when the project needs one), hands
//! the result to an external [`Compiler`], injects the bundle into an HTML
//! template and publishes a [`PreviewInfo`], isolated when a delivery
//! mechanism is attached and healthy, inline otherwise. Later edits go
//! through the [`HmrManager`].
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use glimpse_core::{BuildSession, Compiler, CompileOutput, FileSet, HttpFetcher, ModuleResolver};
//!
//! #[derive(Debug)]
//! struct Echo;
//!
//! #[async_trait::async_trait]
//! impl Compiler for Echo {
//!     async fn compile(
//!         &self,
//!         entry: &str,
//!         files: &FileSet,
//!         _resolver: &ModuleResolver,
//!     ) -> glimpse_core::Result<CompileOutput> {
//!         let code = files.content(entry).unwrap_or_default().to_string();
//!         Ok(CompileOutput { code, ..CompileOutput::default() })
//!     }
//! }
//!
//! # async fn run() -> glimpse_core::Result<()> {
//! let session = BuildSession::builder(Arc::new(Echo), Arc::new(HttpFetcher::new()))
//!     .files(FileSet::from_map([("/src/main.tsx", "console.log(1)")]))
//!     .build()?;
//! let outcome = session.build_now().await?;
//! println!("{:?}", outcome.preview());
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod cache;
pub mod error;
pub mod files;
pub mod framework;
pub mod hmr;
pub mod inject;
pub mod preview;
pub mod project;
pub mod router;
pub mod scheduler;
pub mod session;

#[cfg(feature = "logging")]
pub mod logging;

pub use bootstrap::{BOOTSTRAP_PATH, Bootstrap, BootstrapGenerator, generate_bootstrap, generator_for};
pub use cache::{
    CacheKey, CacheStats, FetchError, FetchRequest, FetchResponse, Fetcher, ModuleCache,
    ModuleResolver, cache_key,
};
#[cfg(feature = "http")]
pub use cache::HttpFetcher;
pub use error::{Error, Result};
pub use files::{FileSet, VirtualFile, normalize_path};
pub use framework::Framework;
pub use hmr::{ChangeType, HmrAction, HmrManager, HmrMessage, PreviewChannel, classify};
pub use inject::{BundleInjector, CdnReason, InjectOptions, InjectOutput, InjectReport, Prerendered};
pub use preview::{
    BlobStore, DeliveryMode, InMemoryBlobStore, IsolatedDelivery, PreviewCreator, PreviewInfo,
    PreviewModeController, PreviewVerifier,
};
#[cfg(feature = "http")]
pub use preview::HttpDelivery;
pub use project::{ProjectLayout, detect_entry, detect_project};
pub use router::{RouteDefinition, RouterAnalysis, analyze_routing, generate_router};
pub use session::{
    BuildOutcome, BuildSession, CompileError, CompileOutput, Compiler, Diagnostic, SessionBuilder,
    Severity,
};

// Configuration types used throughout the public API.
pub use glimpse_config::{GlimpseConfig, PreviewMode, RouterStrategy};
