//! Single recovery boundary for request handling.
//!
//! Every failure a handler signals (and every panic the catch layer converts)
//! ends up here exactly once: the classified cause rides the response as an
//! extension, and this middleware renders the final body in the negotiated
//! format and writes the only log entry for the failure.

use crate::error::ErrorCause;
use crate::web::assets::CONTENT_TYPE_TEXT_HTML;
use crate::web::negotiate::{negotiate, ResponseFormat};
use crate::web::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use bytes::Bytes;
use http_body_util::Full;
use std::any::Any;
use std::backtrace::Backtrace;

pub async fn error_boundary(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    // Decide the representation before the request is consumed; the failure
    // path has no access to the original headers.
    let format = negotiate(req.headers());
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let res = next.run(req).await;

    let Some(cause) = res.extensions().get::<ErrorCause>().cloned() else {
        return res;
    };

    if cause.status.is_server_error() {
        tracing::error!(
            %method,
            %path,
            status = cause.status.as_u16(),
            error = %cause.detail,
            backtrace = %Backtrace::force_capture(),
            "request failed"
        );
    } else {
        tracing::debug!(
            %method,
            %path,
            status = cause.status.as_u16(),
            code = cause.code,
            error = %cause.detail,
            "request rejected"
        );
    }

    render_error(&state, format, &cause).await
}

/// Render the classified failure: 404 and 5xx get the bundled error pages in
/// HTML mode, other statuses a minimal inline page; JSON mode always gets
/// `{"error": ...}`. 5xx messages never carry the cause.
async fn render_error(state: &AppState, format: ResponseFormat, cause: &ErrorCause) -> Response {
    match format {
        ResponseFormat::Json => (
            cause.status,
            Json(serde_json::json!({ "error": cause.message })),
        )
            .into_response(),
        ResponseFormat::Html => {
            let page = if cause.status == StatusCode::NOT_FOUND {
                state.assets.get(&state.config.filename_404).await
            } else if cause.status.is_server_error() {
                state.assets.get(&state.config.filename_500).await
            } else {
                None
            };
            match page {
                Some(asset) => (
                    cause.status,
                    [(header::CONTENT_TYPE, asset.content_type)],
                    asset.body.into_owned(),
                )
                    .into_response(),
                None => (
                    cause.status,
                    [(header::CONTENT_TYPE, CONTENT_TYPE_TEXT_HTML)],
                    inline_error_page(cause),
                )
                    .into_response(),
            }
        }
    }
}

fn inline_error_page(cause: &ErrorCause) -> String {
    let code = cause.status.as_u16();
    let reason = cause.status.canonical_reason().unwrap_or("Error");
    format!(
        "<!doctype html>\n<html>\n<head><title>{code} {reason}</title></head>\n\
         <body><h1>{code} {reason}</h1><p>{}</p></body>\n</html>\n",
        escape_html(&cause.message)
    )
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

/// Hook for `CatchPanicLayer`: coerce an uncaught fault into a bare 500
/// carrying the shared cause marker. The boundary formats and logs it like
/// any other internal error; the panic message never reaches the client.
pub fn handle_panic(err: Box<dyn Any + Send + 'static>) -> axum::http::Response<Full<Bytes>> {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic".to_string()
    };

    let cause = ErrorCause {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal_error",
        message: "internal server error".to_string(),
        detail: format!("panic: {detail}"),
    };

    let mut res = axum::http::Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::from(Bytes::from_static(
            br#"{"error":"internal server error"}"#,
        )))
        .expect("static panic response");
    res.extensions_mut().insert(cause);
    res
}
