//! Configuration management for Code Sanctuary

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub recovery: RecoveryConfig,
    pub server: ServerConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// "ollama" or "hashing"
    pub backend: String,
    pub model: String,
    pub endpoint: String,
    pub max_tokens: usize,
    /// Only used by the hashing backend
    pub dimensions: usize,
    pub timeout_secs: u64,
    /// Memoize embeddings by content hash
    pub cache: bool,
    /// Maximum memoized embeddings
    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_cache_size() -> usize {
    1024
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    pub repo_path: PathBuf,
    pub extension: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    pub enabled: bool,
    pub db_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding: EmbeddingConfig {
                backend: "ollama".to_string(),
                model: "nomic-embed-text".to_string(),
                endpoint: "http://localhost:11434".to_string(),
                max_tokens: 512,
                dimensions: 384,
                timeout_secs: 120,
                cache: false,
                cache_size: default_cache_size(),
            },
            recovery: RecoveryConfig {
                repo_path: PathBuf::from("data/sample"),
                extension: "py".to_string(),
            },
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 8000,
            },
            history: HistoryConfig {
                enabled: true,
                db_path: None,
            },
        }
    }
}

impl Config {
    /// Apply environment overrides on top of the file values
    pub fn apply_env(&mut self) {
        if let Ok(host) = std::env::var("OLLAMA_HOST") {
            self.embedding.endpoint = host;
        }
        if let Ok(model) = std::env::var("OLLAMA_EMBED_MODEL") {
            self.embedding.model = model;
        }
    }

    /// Resolved location of the query log database
    pub fn history_path(&self) -> Result<PathBuf> {
        if let Some(ref path) = self.history.db_path {
            return Ok(path.clone());
        }
        Ok(project_dirs()?.data_dir().join("history.db"))
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "sanctuary", "code-sanctuary")
        .context("Failed to determine project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Load configuration from file or use defaults
pub fn load_config(custom_path: Option<&str>) -> Result<Config> {
    let path = if let Some(p) = custom_path {
        PathBuf::from(p)
    } else {
        config_path()?
    };

    let mut config = if path.exists() {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))?
    } else {
        Config::default()
    };

    config.apply_env();
    Ok(config)
}

/// Initialize configuration file with defaults
pub fn init_config(custom_path: Option<&str>) -> Result<()> {
    let path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => config_path()?,
    };

    if path.exists() {
        println!("Configuration file already exists at {:?}", path);
        return Ok(());
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory {:?}", parent))?;
    }

    let content = toml::to_string_pretty(&Config::default())
        .context("Failed to serialize default config")?;

    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write config to {:?}", path))?;

    println!("Configuration initialized at {:?}", path);
    Ok(())
}

/// Show current configuration
pub fn show_config(config: &Config) -> Result<()> {
    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    println!("{}", content);
    Ok(())
}
