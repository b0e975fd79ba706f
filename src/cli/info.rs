//! Info command - show system information

use anyhow::Result;

use crate::config::{self, Config};
use crate::embedding::OllamaEmbedder;

pub async fn run(config: Config) -> Result<()> {
    println!("Code Sanctuary v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("System Information:");
    println!("  OS: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    println!();
    println!("Configuration:");
    println!("  Config file: {}", display(config::config_path()));
    println!("  Query log:   {}", display(config.history_path()));
    println!("  Repository:  {}", config.recovery.repo_path.display());
    println!("  Extension:   .{}", config.recovery.extension);

    println!();
    println!("Embedding backend:");
    println!("  Backend: {}", config.embedding.backend);
    if config.embedding.backend == "ollama" {
        let client = OllamaEmbedder::from_config(&config.embedding)?;
        let status = if client.is_available().await {
            "reachable"
        } else {
            "not reachable"
        };
        println!("  Model:    {}", client.model());
        println!("  Endpoint: {} ({})", config.embedding.endpoint, status);
        if let Ok(models) = client.list_models().await {
            let installed = models
                .iter()
                .any(|m| m.name == client.model() || m.name.starts_with(&format!("{}:", client.model())));
            println!(
                "  Installed: {}",
                if installed { "yes" } else { "no (run `ollama pull`)" }
            );
        }
    } else {
        println!("  Dimensions: {}", config.embedding.dimensions);
    }

    Ok(())
}

fn display(path: Result<std::path::PathBuf>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}
