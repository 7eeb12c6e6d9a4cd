use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::{
    handlers::{debug_info, generate_developer_key, get_client_key, health, index},
    policy::{Clock, PolicyConfig},
    AppState,
};

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: Option<PathBuf>,
    /// IPs allowed to mint developer keys.
    pub allowlist: Vec<String>,
    pub cors_origins: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("KEYGATE_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("KEYGATE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            data_dir: std::env::var("KEYGATE_DATA_DIR").ok().map(PathBuf::from),
            allowlist: std::env::var("KEYGATE_ALLOWLIST")
                .map(|v| parse_allowlist(&v))
                .unwrap_or_else(|_| PolicyConfig::default().allowlist),
            cors_origins: std::env::var("KEYGATE_CORS_ORIGINS").ok(),
        }
    }
}

/// Split a comma-separated allowlist, dropping blanks.
pub fn parse_allowlist(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Use `dir` if given (creating it), else the platform data directory.
pub fn resolve_data_dir(dir: Option<&PathBuf>) -> Result<PathBuf> {
    match dir {
        Some(d) => {
            std::fs::create_dir_all(d)
                .with_context(|| format!("create data dir {}", d.display()))?;
            Ok(d.clone())
        }
        None => crate::dirs::data_dir(),
    }
}

pub async fn run(cfg: ServerConfig) -> Result<()> {
    let data_dir = resolve_data_dir(cfg.data_dir.as_ref())?;
    info!(data_dir = %data_dir.display(), "using data directory");
    info!(allowlist = ?cfg.allowlist, "developer allowlist");

    let state = AppState::open(
        &data_dir,
        PolicyConfig::with_allowlist(cfg.allowlist),
        Clock::System,
    )?;

    let app = build_router(state)
        .layer(build_cors(cfg.cors_origins.as_deref()))
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", cfg.host, cfg.port)
        .parse()
        .context("invalid host/port")?;

    info!(%addr, "keygate server listening");
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("bind listener")?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")
}

/// All routes, without transport layers.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/debug-info", get(debug_info))
        .route("/api/get-client-key", get(get_client_key))
        .route("/api/generate-developer-key", get(generate_developer_key))
        .with_state(state)
}

fn build_cors(origins: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::HEAD,
            http::Method::OPTIONS,
        ])
        .allow_headers(Any);

    match origins {
        Some(o) => {
            let origins: Vec<_> = o
                .split(',')
                .filter_map(|s| s.trim().parse().ok())
                .collect();
            cors.allow_origin(origins)
        }
        None => cors.allow_origin(Any),
    }
}
