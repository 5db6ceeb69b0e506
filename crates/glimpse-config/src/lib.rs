//! Configuration for the glimpse preview pipeline.
//!
//! [`GlimpseConfig`] groups every tunable of the core: module cache sizing,
//! preview delivery policy, HMR debounce, bundle injection and router
//! generation. Library users build it from a `serde_json::Value`; the CLI
//! discovers `glimpse.toml` (or the `glimpse` field of `package.json`) and
//! layers `GLIMPSE_*` environment variables on top.

pub mod cache;
pub mod config;
pub mod discovery;
pub mod error;
pub mod hmr;
pub mod inject;
pub mod preview;
pub mod router;
pub mod settings;
pub mod validation;

pub use cache::CacheConfig;
pub use config::GlimpseConfig;
pub use discovery::{ConfigDiscovery, discover};
pub use error::{ConfigError, Result};
pub use hmr::{BuildConfig, HmrConfig};
pub use inject::InjectConfig;
pub use preview::{PreviewConfig, PreviewMode};
pub use router::{RouterConfig, RouterStrategy};
pub use settings::GlobalSettings;
pub use validation::validate;
