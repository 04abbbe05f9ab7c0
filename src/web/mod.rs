//! HTTP server assembly: shared state, the route table, and the middleware
//! stack (request tracing, the recovery boundary, panic capture).

pub mod apiv1;
pub mod assets;
pub mod auth;
pub mod boundary;
pub mod negotiate;
pub mod status;

use crate::config::AppConfig;
use crate::db::Db;
use crate::error::AppError;
use assets::{AssetProvider, DirAssets, EmbeddedAssets};
use axum::{extract::FromRef, middleware, routing::get, Router};
use axum_extra::extract::cookie::Key;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    /// Pooled database handle; None when the server runs without a database.
    pub db: Option<Db>,
    pub config: Arc<AppConfig>,
    pub assets: Arc<dyn AssetProvider>,
    cookie_key: Key,
}

impl AppState {
    /// Wire the shared state. The asset provider is injected here: a local
    /// directory when configured, the bundled tree otherwise.
    pub fn new(config: AppConfig, db: Option<Db>) -> Result<Self, AppError> {
        let cookie_key = config.cookie_key()?;
        let assets: Arc<dyn AssetProvider> = match &config.assets_dir {
            Some(dir) => Arc::new(DirAssets::new(dir.clone())),
            None => Arc::new(EmbeddedAssets),
        };
        Ok(AppState {
            db,
            config: Arc::new(config),
            assets,
            cookie_key,
        })
    }

    /// Database handle, or a 500-class failure when the server was started
    /// without one.
    pub fn db(&self) -> Result<&Db, AppError> {
        self.db
            .as_ref()
            .ok_or_else(|| AppError::Internal("database not configured".to_string()))
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Key {
        state.cookie_key.clone()
    }
}

/// The complete application router. Layer order matters: the trace layer is
/// outermost, the recovery boundary sits inside it, and panic capture sits
/// between the boundary and the routes so panics reach the boundary as
/// classified 500s.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/users", get(apiv1::list_users).put(apiv1::create_user))
        .route(
            "/users/:id",
            get(apiv1::get_user)
                .post(apiv1::update_user)
                .delete(apiv1::delete_user),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_basic_auth,
        ));

    Router::new()
        .route("/hello", get(status::hello))
        .route("/panic", get(status::do_panic))
        .route("/_status", get(status::status))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/login/user", get(auth::logged_in_user))
        .route("/logout", get(auth::logout))
        .nest("/api/v1", api)
        .fallback(assets::serve_static)
        .layer(CatchPanicLayer::custom(boundary::handle_panic))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            boundary::error_boundary,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!("http_request", %method, uri = %uri)
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     _latency: std::time::Duration,
                     _span: &tracing::Span| {
                        let status = res.status();
                        if status.is_server_error() {
                            tracing::error!(%status, "response");
                        } else {
                            tracing::info!(%status, "response");
                        }
                    },
                ),
        )
        .with_state(state)
}
