//! HTTP implementation of the isolated-delivery contract.
//!
//! - `PUT  /__glimpse__/files?build=<id>&session=<token>` stores
//!   `{buildId, session, files}`; build ids are ordered per session
//! - `GET  /__glimpse__/preview/{*path}` serves the stored files with the
//!   marker header; unknown extension-less paths fall back to `index.html`
//! - `GET  /__glimpse__/health` reports the current build

mod state;

pub use state::{PreviewStore, SharedStore, WriteRejection};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, put},
};
use glimpse_core::preview::{FILES_ENDPOINT, HEALTH_ENDPOINT, PREVIEW_PREFIX};
use serde::Deserialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use crate::error::{CliError, Result};

/// Value of the marker header on every preview response.
pub const MARKER_VALUE: &str = "glimpse";

#[derive(Debug, Clone)]
struct AppState {
    store: SharedStore,
    marker: HeaderName,
}

#[derive(Debug, Deserialize)]
struct BuildQuery {
    build: Option<u64>,
    session: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilesPayload {
    #[serde(default)]
    build_id: Option<u64>,
    #[serde(default)]
    session: Option<String>,
    files: BTreeMap<String, String>,
}

pub struct PreviewServer {
    state: AppState,
}

impl PreviewServer {
    /// `marker_header` is the header name verification looks for.
    pub fn new(marker_header: &str) -> Result<Self> {
        let marker = HeaderName::from_bytes(marker_header.as_bytes())
            .map_err(|e| CliError::InvalidArgument(format!("marker header '{marker_header}': {e}")))?;
        Ok(Self {
            state: AppState {
                store: Arc::new(PreviewStore::new()),
                marker,
            },
        })
    }

    pub fn store(&self) -> SharedStore {
        Arc::clone(&self.state.store)
    }

    pub fn router(&self) -> Router {
        let preview_root = PREVIEW_PREFIX.trim_end_matches('/');
        Router::new()
            .route(FILES_ENDPOINT, put(handle_put_files))
            .route(HEALTH_ENDPOINT, get(handle_health))
            .route(preview_root, get(handle_preview_index))
            .route(PREVIEW_PREFIX, get(handle_preview_index))
            .route(&format!("{PREVIEW_PREFIX}{{*path}}"), get(handle_preview_file))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(self.state.clone())
    }

    /// Bind `addr` and serve until the process is interrupted.
    pub async fn start(self, addr: SocketAddr) -> Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CliError::Server(format!("Failed to bind to {addr}: {e}")))?;
        let local = listener
            .local_addr()
            .map_err(|e| CliError::Server(e.to_string()))?;
        crate::ui::success(&format!("Preview server running at http://{local}{PREVIEW_PREFIX}"));
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| CliError::Server(format!("Server error: {e}")))
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down preview server");
    }
}

async fn handle_put_files(
    State(state): State<AppState>,
    Query(query): Query<BuildQuery>,
    Json(payload): Json<FilesPayload>,
) -> Response {
    let Some(build_id) = query.build.or(payload.build_id) else {
        return (StatusCode::BAD_REQUEST, "missing build id").into_response();
    };

    // Writers without a token share one anonymous session.
    let session = query.session.or(payload.session).unwrap_or_default();

    match state.store.set_files(&session, payload.files, build_id) {
        Ok(count) => {
            tracing::info!(build_id, session = %session, files = count, "preview files stored");
            Json(json!({ "buildId": build_id, "files": count })).into_response()
        }
        Err(WriteRejection::Stale { current }) => {
            tracing::warn!(build_id, current, session = %session, "rejected stale preview write");
            (
                StatusCode::CONFLICT,
                Json(json!({ "error": "stale build", "current": current })),
            )
                .into_response()
        }
        Err(WriteRejection::Empty) => (StatusCode::BAD_REQUEST, "no files").into_response(),
    }
}

async fn handle_health(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "buildId": state.store.build_id(),
        "files": state.store.file_count(),
    }))
}

async fn handle_preview_index(State(state): State<AppState>) -> Response {
    serve_file(&state, "/index.html")
}

async fn handle_preview_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    let path = glimpse_core::normalize_path(&path);
    if state.store.get(&path).is_some() || glimpse_core::files::extension(&path).is_some() {
        return serve_file(&state, &path);
    }
    // Client-side routes resolve to the document.
    serve_file(&state, "/index.html")
}

fn serve_file(state: &AppState, path: &str) -> Response {
    let Some(content) = state.store.get(path) else {
        return (StatusCode::NOT_FOUND, format!("File not found: {path}")).into_response();
    };
    (
        [
            (header::CONTENT_TYPE, HeaderValue::from_static(content_type(path))),
            (header::CACHE_CONTROL, HeaderValue::from_static("no-cache")),
            (state.marker.clone(), HeaderValue::from_static(MARKER_VALUE)),
        ],
        content,
    )
        .into_response()
}

fn content_type(path: &str) -> &'static str {
    match glimpse_core::files::extension(path) {
        Some("html") => "text/html; charset=utf-8",
        Some("js" | "mjs") => "application/javascript",
        Some("css") => "text/css",
        Some("json" | "map") => "application/json",
        Some("svg") => "image/svg+xml",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}
