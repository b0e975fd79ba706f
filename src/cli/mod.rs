//! CLI command implementations

pub mod history;
pub mod info;
pub mod recover;
pub mod serve;

use anyhow::Result;
use tracing::{debug, warn};

use crate::config::Config;
use crate::embedding;
use crate::history::QueryLog;
use crate::recovery::RecoveryEngine;

/// Build the embedding backend and selector described by the config
pub fn build_engine(config: &Config) -> Result<RecoveryEngine> {
    let embedder = embedding::from_config(&config.embedding)?;
    debug!("Embedding backend: {}", embedder.model_id());
    Ok(RecoveryEngine::new(embedder, config.recovery.extension.clone()))
}

/// Open the query log when enabled; a log that cannot be opened is skipped
pub fn open_history(config: &Config) -> Option<QueryLog> {
    if !config.history.enabled {
        return None;
    }

    match config.history_path().and_then(|path| QueryLog::open(&path)) {
        Ok(log) => Some(log),
        Err(e) => {
            warn!("Query log disabled: {:#}", e);
            None
        }
    }
}
