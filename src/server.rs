//! Static asset server for the capture page
//!
//! `/` serves `index.html`; any other path has its leading `/` stripped and is
//! served from the asset directory.

use std::net::SocketAddr;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

/// Map a request path onto a file under `root`.
///
/// Returns `None` for paths that would leave `root`.
pub fn resolve_asset_path(root: &Path, request_path: &str) -> Option<PathBuf> {
    if request_path == "/" {
        return Some(root.join("index.html"));
    }

    let relative = Path::new(request_path.strip_prefix('/').unwrap_or(request_path));
    if relative
        .components()
        .any(|component| !matches!(component, Component::Normal(_)))
    {
        return None;
    }
    Some(root.join(relative))
}

/// Router serving everything under `asset_dir`
pub fn router(asset_dir: PathBuf) -> Router {
    Router::new()
        .fallback(serve_asset)
        .with_state(Arc::new(asset_dir))
}

async fn serve_asset(State(root): State<Arc<PathBuf>>, request: Request) -> Response {
    let request_path = request.uri().path().to_string();
    let Some(file) = resolve_asset_path(&root, &request_path) else {
        log::warn!("Rejected asset path {}", request_path);
        return StatusCode::NOT_FOUND.into_response();
    };

    log::debug!("{} {} -> {}", request.method(), request_path, file.display());
    match ServeFile::new(file).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

/// Serve `asset_dir` on all interfaces until the process is stopped
pub async fn serve(asset_dir: PathBuf, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    log::info!("Serving {} on http://{}", asset_dir.display(), addr);
    axum::serve(listener, router(asset_dir))
        .await
        .context("Static server stopped")
}
