//! Serve command - run the recovery HTTP API

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::server::{self, AppState};

pub async fn run(
    config: Config,
    host: Option<&str>,
    port: Option<u16>,
    repo: Option<PathBuf>,
) -> Result<()> {
    let host = host.unwrap_or(&config.server.host);
    let port = port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let repo_path = repo.unwrap_or_else(|| config.recovery.repo_path.clone());
    if !repo_path.is_dir() {
        warn!("Repository {} does not exist yet; requests will fail until it does", repo_path.display());
    }

    // Model state is built once and shared by every request
    let engine = Arc::new(super::build_engine(&config)?);
    let history = super::open_history(&config);
    if history.is_some() {
        info!("Recording queries to {}", config.history_path()?.display());
    }

    server::serve(AppState::new(engine, repo_path, history), addr).await
}
