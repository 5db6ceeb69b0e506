//! Glimpse CLI - inspect projects, inject bundles and serve isolated previews.
//!
//! # Architecture
//!
//! - [`cli`] - clap argument definitions
//! - [`commands`] - `detect`, `inject` and `serve`
//! - [`error`] - error types with actionable hints
//! - [`loader`] - reads a project directory into a [`glimpse_core::FileSet`]
//! - [`logger`] - tracing subscriber setup
//! - [`server`] - HTTP implementation of the isolated-delivery contract
//! - [`ui`] - terminal output helpers
//!
//! # Example
//!
//! ```rust,no_run
//! use glimpse_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false, None);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod loader;
pub mod logger;
pub mod server;
pub mod ui;

pub use error::{CliError, Result, ResultExt};
