//! History command - list past recovery requests

use anyhow::{bail, Result};
use console::style;

use crate::config::Config;
use crate::history::QueryLog;

pub fn run(config: Config, limit: usize) -> Result<()> {
    if !config.history.enabled {
        bail!("Query log is disabled in the configuration");
    }

    let path = config.history_path()?;
    if !path.exists() {
        println!("No queries recorded yet.");
        return Ok(());
    }

    let log = QueryLog::open(&path)?;
    let records = log.recent(limit)?;
    if records.is_empty() {
        println!("No queries recorded yet.");
        return Ok(());
    }

    for record in &records {
        let when = record.created_at.format("%Y-%m-%d %H:%M:%S");
        let snippet = first_line(&record.broken_code, 48);

        match (&record.suggested_file, record.similarity_score) {
            (Some(file), Some(score)) => println!(
                "{}  {} {} {}",
                style(when).dim(),
                style(file).green().bold(),
                style(format!("{:.3}", score)).yellow(),
                style(snippet).dim()
            ),
            _ => println!(
                "{}  {} {}",
                style(when).dim(),
                style(record.error.as_deref().unwrap_or("failed")).red(),
                style(snippet).dim()
            ),
        }
    }

    println!();
    println!("{} of {} queries shown", records.len(), log.count()?);
    Ok(())
}

fn first_line(code: &str, max_chars: usize) -> String {
    let line = code.lines().find(|l| !l.trim().is_empty()).unwrap_or("").trim();
    if line.chars().count() > max_chars {
        format!("{}...", line.chars().take(max_chars).collect::<String>())
    } else {
        line.to_string()
    }
}
