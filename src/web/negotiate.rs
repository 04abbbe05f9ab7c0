//! Content negotiation for error responses: HTML page or JSON object.

use axum::http::{header, HeaderMap};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HTML_TYPE_RE: Regex = Regex::new(r"/html\b").unwrap();
    static ref JSON_TYPE_RE: Regex = Regex::new(r"/json\b").unwrap();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Html,
    Json,
}

/// Pick the response representation from the request headers.
///
/// The `Accept` header is scanned left to right: the first `/html` or `/json`
/// token wins. When `Accept` carries neither, the request's own
/// `Content-Type` is consulted for `/json`. HTML is the default.
pub fn negotiate(headers: &HeaderMap) -> ResponseFormat {
    let accept = header_str(headers, header::ACCEPT);
    for part in accept.split(',') {
        if HTML_TYPE_RE.is_match(part) {
            return ResponseFormat::Html;
        }
        if JSON_TYPE_RE.is_match(part) {
            return ResponseFormat::Json;
        }
    }

    if JSON_TYPE_RE.is_match(header_str(headers, header::CONTENT_TYPE)) {
        return ResponseFormat::Json;
    }
    ResponseFormat::Html
}

fn header_str(headers: &HeaderMap, name: header::HeaderName) -> &str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}
