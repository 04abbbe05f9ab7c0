//! Static asset serving behind an injectable provider, so the same handler
//! serves the bundled tree in deployments and a local directory during
//! frontend development.

use crate::error::AppError;
use crate::web::AppState;
use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, Method, StatusCode},
    response::Response,
};
use std::borrow::Cow;
use std::path::PathBuf;

pub const CONTENT_TYPE_TEXT_HTML: &str = "text/html; charset=utf-8";

pub struct Asset {
    pub body: Cow<'static, [u8]>,
    pub content_type: &'static str,
}

#[async_trait]
pub trait AssetProvider: Send + Sync {
    /// Look up an asset by its path relative to the public root, e.g.
    /// "index.html". Returns None when the asset does not exist.
    async fn get(&self, path: &str) -> Option<Asset>;
}

/// Assets bundled into the binary at compile time.
pub struct EmbeddedAssets;

static EMBEDDED: &[(&str, &[u8])] = &[
    ("404.html", include_bytes!("../../assets/public/404.html")),
    ("500.html", include_bytes!("../../assets/public/500.html")),
    ("index.html", include_bytes!("../../assets/public/index.html")),
    ("login.html", include_bytes!("../../assets/public/login.html")),
    ("main.css", include_bytes!("../../assets/public/main.css")),
];

#[async_trait]
impl AssetProvider for EmbeddedAssets {
    async fn get(&self, path: &str) -> Option<Asset> {
        EMBEDDED
            .iter()
            .find(|(name, _)| *name == path)
            .map(|(name, bytes)| Asset {
                body: Cow::Borrowed(*bytes),
                content_type: content_type_for(name),
            })
    }
}

/// Assets read from a local directory on every request. Development only.
pub struct DirAssets {
    root: PathBuf,
}

impl DirAssets {
    pub fn new(root: PathBuf) -> Self {
        tracing::warn!(
            "serving static assets from local directory {:?}",
            root
        );
        DirAssets { root }
    }
}

#[async_trait]
impl AssetProvider for DirAssets {
    async fn get(&self, path: &str) -> Option<Asset> {
        let bytes = tokio::fs::read(self.root.join(path)).await.ok()?;
        Some(Asset {
            body: Cow::Owned(bytes),
            content_type: content_type_for(path),
        })
    }
}

pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("html") => CONTENT_TYPE_TEXT_HTML,
        Some("css") => "text/css; charset=utf-8",
        Some("js") => "text/javascript; charset=utf-8",
        Some("json") => "application/json",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("svg") => "image/svg+xml",
        Some("ico") => "image/x-icon",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// Router fallback: serve the request path from the asset provider. Unknown
/// paths raise the shared NotFound signal so 404s render exactly like API
/// 404s.
pub async fn serve_static(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, AppError> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Err(AppError::NotFound);
    }
    let path = normalize_path(req.uri().path()).ok_or(AppError::NotFound)?;
    let asset = state.assets.get(&path).await.ok_or(AppError::NotFound)?;

    let body = if req.method() == Method::HEAD {
        Body::empty()
    } else {
        Body::from(asset.body.into_owned())
    };
    let res = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, asset.content_type)
        .body(body)
        .map_err(AppError::internal)?;
    Ok(res)
}

/// Strip the leading slash and reject traversal. An empty path resolves to
/// the index page.
fn normalize_path(uri_path: &str) -> Option<String> {
    let trimmed = uri_path.trim_start_matches('/');
    if trimmed.split('/').any(|seg| seg == "..") {
        return None;
    }
    if trimmed.is_empty() {
        Some("index.html".to_string())
    } else {
        Some(trimmed.to_string())
    }
}
