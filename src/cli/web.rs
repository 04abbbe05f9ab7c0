//! `webapp web`: start the HTTP server.

use crate::config::{AppConfig, ENV_DATABASE_URL};
use crate::db::Db;
use crate::web::{build_router, AppState};
use axum_server::tls_rustls::RustlsConfig;
use clap::Args;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct WebArgs {
    /// Address to listen on
    #[arg(long, default_value = "0.0.0.0:8080")]
    pub addr: SocketAddr,
    /// Override the deployment environment name from ENV
    #[arg(long)]
    pub env: Option<String>,
    /// Terminate TLS, provisioning a self-signed certificate when none exists
    #[arg(long)]
    pub tls: bool,
    /// Directory holding (or receiving) cert.pem and key.pem
    #[arg(long, default_value = "tls")]
    pub tls_dir: PathBuf,
}

pub async fn run(args: WebArgs) -> anyhow::Result<()> {
    let mut config = AppConfig::from_env()?;
    if let Some(env) = args.env {
        config.environment = env;
    }

    let db = match &config.database_url {
        Some(url) => Some(Db::connect(url).await?),
        None => {
            tracing::info!("skipping database, set {ENV_DATABASE_URL:?} to connect");
            None
        }
    };

    tracing::info!("starting web server in {:?} mode", config.environment);
    let state = AppState::new(config, db)?;
    let app = build_router(state);

    if args.tls {
        let (cert, key) = ensure_self_signed(&args.tls_dir)?;
        let rustls = RustlsConfig::from_pem_file(cert, key).await?;
        tracing::info!("listening on https://{}", args.addr);
        axum_server::bind_rustls(args.addr, rustls)
            .serve(app.into_make_service_with_connect_info::<SocketAddr>())
            .await?;
    } else {
        let listener = tokio::net::TcpListener::bind(args.addr).await?;
        tracing::info!("listening on http://{}", listener.local_addr()?);
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
    }
    Ok(())
}

/// Reuse cert.pem/key.pem from the TLS directory when both exist; otherwise
/// generate a self-signed pair for localhost and write it there.
fn ensure_self_signed(dir: &Path) -> anyhow::Result<(PathBuf, PathBuf)> {
    let cert_path = dir.join("cert.pem");
    let key_path = dir.join("key.pem");
    if cert_path.exists() && key_path.exists() {
        return Ok((cert_path, key_path));
    }

    std::fs::create_dir_all(dir)?;
    let certified = rcgen::generate_simple_self_signed(vec!["localhost".to_string()])?;
    std::fs::write(&cert_path, certified.cert.pem())?;
    std::fs::write(&key_path, certified.key_pair.serialize_pem())?;
    tracing::warn!("provisioned self-signed TLS certificate at {:?}", cert_path);
    Ok((cert_path, key_path))
}
