//! Diagnostics: the /_status report, the /hello example route, and the
//! /panic fault-injection route used to exercise the recovery boundary.

use crate::config::BuildInfo;
use crate::error::AppError;
use crate::web::AppState;
use axum::{
    extract::{ConnectInfo, Query, Request, State},
    http::header,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusDto {
    pub status: String,
    pub env: String,
    pub build: BuildInfo,
    pub network: NetworkInfo,
    pub http: HttpInfo,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NetworkInfo {
    pub client_ip: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HttpInfo {
    pub host: String,
    pub method: String,
    pub url: String,
    pub headers: BTreeMap<String, String>,
}

/// GET /_status: build, network, and request echo, assembled per request
/// from the startup config and the incoming headers.
pub async fn status(
    State(state): State<AppState>,
    connect: Option<ConnectInfo<SocketAddr>>,
    req: Request,
) -> Json<StatusDto> {
    let headers: BTreeMap<String, String> = req
        .headers()
        .iter()
        .map(|(k, v)| {
            (
                k.to_string(),
                String::from_utf8_lossy(v.as_bytes()).to_string(),
            )
        })
        .collect();

    let client_ip = req
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|s| s.trim().to_string())
        .or_else(|| connect.map(|ConnectInfo(addr)| addr.ip().to_string()));

    let host = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();

    Json(StatusDto {
        status: "ok".to_string(),
        env: state.config.environment.clone(),
        build: state.config.build.clone(),
        network: NetworkInfo { client_ip },
        http: HttpInfo {
            host,
            method: req.method().to_string(),
            url: req.uri().to_string(),
            headers,
        },
    })
}

#[derive(Debug, Deserialize)]
pub struct HelloParams {
    #[serde(default)]
    pub name: Option<String>,
}

/// GET /hello
pub async fn hello(Query(params): Query<HelloParams>) -> Json<serde_json::Value> {
    let name = params
        .name
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| "World".to_string());
    Json(serde_json::json!({ "greetings": format!("Hello, {name}!") }))
}

#[derive(Debug, Deserialize)]
pub struct PanicParams {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub status: Option<u16>,
}

/// GET /panic: with `?status=` raises a classified failure carrying the
/// message; without it, a genuine panic for the catch layer to recover.
pub async fn do_panic(Query(params): Query<PanicParams>) -> Result<(), AppError> {
    let message = params.message.unwrap_or_else(|| "panic".to_string());
    if let Some(status) = params.status {
        return Err(AppError::from_status(status, message));
    }
    panic!("{message}");
}
