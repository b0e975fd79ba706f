//! Recover command - suggest the original file for a broken snippet
//!
//! Runs the selector in-process, or asks a remote `sanctuary serve`.

use anyhow::{bail, Context, Result};
use console::Term;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::client::RecoveryClient;
use crate::config::Config;
use crate::history::QueryRecord;
use crate::recovery::RecoveryResult;

// ANSI color codes
mod colors {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const PRIMARY: &str = "\x1b[38;2;100;181;246m";      // #64B5F6
    pub const SUCCESS: &str = "\x1b[38;2;165;214;167m";      // #A5D6A7
    pub const ACCENT: &str = "\x1b[38;2;255;202;40m";        // #FFCA28
    pub const MUTED: &str = "\x1b[38;2;84;110;122m";         // #546E7A
}

mod symbols {
    pub const RECOVER: &str = "󰁯";
    pub const SUCCESS: &str = "󰄂";
}

/// Where the broken code comes from
pub enum Input<'a> {
    File(&'a Path),
    Inline(&'a str),
    Stdin,
}

/// Options for a single recover run
pub struct RecoverOptions<'a> {
    pub input: Input<'a>,
    pub repo: Option<PathBuf>,
    pub remote: Option<&'a str>,
    pub json: bool,
}

pub async fn run(config: Config, options: RecoverOptions<'_>) -> Result<()> {
    let broken = read_input(&options.input)?;
    let repo = options
        .repo
        .clone()
        .unwrap_or_else(|| config.recovery.repo_path.clone());

    let interactive = !options.json && Term::stdout().is_term();
    let spinner = interactive.then(create_spinner);

    let outcome = match options.remote {
        Some(url) => recover_remote(url, &broken).await,
        None => recover_local(&config, &broken, &repo).await,
    };

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let result = outcome?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_result(&result, options.remote.unwrap_or(&repo.display().to_string()));
    }

    Ok(())
}

fn read_input(input: &Input<'_>) -> Result<String> {
    let code = match input {
        Input::File(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        Input::Inline(code) => code.to_string(),
        Input::Stdin => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read broken code from stdin")?;
            buf
        }
    };

    if code.trim().is_empty() {
        bail!("No broken code given");
    }
    Ok(code)
}

async fn recover_local(config: &Config, broken: &str, repo: &Path) -> Result<RecoveryResult> {
    let engine = super::build_engine(config)?;
    let history = super::open_history(config);

    let outcome = engine.suggest_recovery(broken, repo).await;

    if let Some(log) = history {
        let record = match &outcome {
            Ok(result) => QueryRecord::success(broken, result),
            Err(e) => QueryRecord::failure(broken, &e.to_string()),
        };
        if let Err(e) = log.record(&record) {
            tracing::warn!("Failed to record query: {:#}", e);
        }
    }

    Ok(outcome?)
}

async fn recover_remote(url: &str, broken: &str) -> Result<RecoveryResult> {
    let client = RecoveryClient::with_url(url)?;
    let health = client.health_check().await?;
    if health.status != "ok" {
        anyhow::bail!("Recovery service reports status {}", health.status);
    }
    tracing::debug!(
        "Remote service v{} at {} using {}",
        health.version,
        client.base_url(),
        health.model
    );
    client.recover(broken).await
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .template("{spinner:.cyan} {msg:.dim}")
    {
        pb.set_style(style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]));
    }
    pb.set_message("Analyzing...");
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

fn print_result(result: &RecoveryResult, source: &str) {
    println!();
    println!(
        "{}{}  {} Semantic Recovery{}",
        colors::PRIMARY, colors::BOLD, symbols::RECOVER, colors::RESET
    );
    println!("{}  │ Repository: {}{}", colors::MUTED, source, colors::RESET);
    println!("{}  ╰{}{}", colors::MUTED, "─".repeat(50), colors::RESET);
    println!();
    println!(
        "{}  {} Suggested recovery source: {}{}{}",
        colors::SUCCESS, symbols::SUCCESS, colors::BOLD, result.suggested_file, colors::RESET
    );
    println!(
        "{}  Semantic similarity: {}{:.3}{}",
        colors::MUTED, colors::ACCENT, result.similarity_score, colors::RESET
    );
    println!();
}
