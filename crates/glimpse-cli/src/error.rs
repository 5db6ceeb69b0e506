//! Error handling for the glimpse CLI.
//!
//! Each variant carries enough context to act on; most include a hint.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}\n\nHint: Check glimpse.toml or the GLIMPSE_* environment variables")]
    Config(#[from] glimpse_config::ConfigError),

    #[error("Preview pipeline error: {0}")]
    Core(#[from] glimpse_core::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Not a directory: {}\n\nHint: Pass the project root directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("Failed to read project directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Custom(String),
}

pub type Result<T, E = CliError> = std::result::Result<T, E>;

/// Adds context to errors on the way up.
pub trait ResultExt<T> {
    /// Turn a not-found I/O error into [`CliError::FileNotFound`] for `path`.
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T>;

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T>;
}

impl<T, E: Into<CliError>> ResultExt<T> for std::result::Result<T, E> {
    fn with_path(self, path: impl AsRef<std::path::Path>) -> Result<T> {
        self.map_err(|e| match e.into() {
            CliError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound => {
                CliError::FileNotFound(path.as_ref().to_path_buf())
            }
            other => other,
        })
    }

    fn with_hint(self, hint: impl std::fmt::Display) -> Result<T> {
        self.map_err(|e| {
            let err: CliError = e.into();
            CliError::Custom(format!("{err}\n\nHint: {hint}"))
        })
    }
}

/// Convert a `CliError` into a miette report.
pub fn cli_error_to_miette(err: CliError) -> miette::Report {
    match err {
        CliError::Core(glimpse_core::Error::Config(e)) => {
            miette::miette!("Configuration error: {e}")
        }
        CliError::Server(msg) => miette::miette!(
            "Server error: {msg}\n\nHint: Is another process using the port? Try --port 0"
        ),
        _ => miette::miette!("{err}"),
    }
}
