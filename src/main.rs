//! Code Sanctuary - AI-assisted code recovery prototype
//!
//! Paste a broken snippet, get back the file from a reference repository
//! it most likely came from, ranked by embedding similarity.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{debug, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;
mod client;
mod config;
mod embedding;
mod error;
mod history;
mod recovery;
mod server;

use cli::recover::{Input, RecoverOptions};

/// Code Sanctuary - find where broken code came from
#[derive(Parser)]
#[command(name = "sanctuary")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AI-assisted code recovery prototype", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the recovery HTTP API
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Reference repository holding the candidate files
        #[arg(short, long)]
        repo: Option<PathBuf>,
    },

    /// Suggest the original file for a broken snippet
    Recover {
        /// File containing the broken code (reads stdin when omitted)
        file: Option<PathBuf>,

        /// Broken code passed inline
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,

        /// Reference repository holding the candidate files
        #[arg(short, long)]
        repo: Option<PathBuf>,

        /// Ask a running `sanctuary serve` instead of recovering in-process
        #[arg(long, env = "SANCTUARY_URL")]
        remote: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show past recovery requests
    History {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Show configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Initialize configuration file
        #[arg(long)]
        init: bool,
    },

    /// Show version and backend status
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Load configuration
    let config = config::load_config(cli.config.as_deref())?;

    debug!("Code Sanctuary v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Serve { host, port, repo } => {
            cli::serve::run(config, host.as_deref(), port, repo).await?;
        }
        Commands::Recover { file, code, repo, remote, json } => {
            let input = match (&file, &code) {
                (Some(path), _) => Input::File(path),
                (None, Some(code)) => Input::Inline(code),
                (None, None) => Input::Stdin,
            };
            let options = RecoverOptions {
                input,
                repo,
                remote: remote.as_deref(),
                json,
            };
            cli::recover::run(config, options).await?;
        }
        Commands::History { limit } => {
            cli::history::run(config, limit)?;
        }
        Commands::Config { show, init } => {
            if init {
                config::init_config(cli.config.as_deref())?;
            } else if show {
                config::show_config(&config)?;
            }
        }
        Commands::Info => {
            cli::info::run(config).await?;
        }
    }

    Ok(())
}
