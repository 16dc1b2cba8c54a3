//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod attendance;
mod events;
mod extract;
mod helpers;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use rollcall::config::Config;

use helpers::MetadataArgs;

#[derive(Parser)]
#[command(name = "rollcall")]
#[command(about = "Attendance sheet OCR and roster matching")]
#[command(version)]
pub struct Cli {
    /// Config file (skips discovery)
    #[arg(long, global = true, env = "ROLLCALL_CONFIG")]
    config: Option<PathBuf>,

    /// Validation event database (overrides config)
    #[arg(long, global = true, env = "ROLLCALL_DB")]
    db: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Extract text and quality signals from document images
    Extract {
        /// Image files to extract
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// Parse an attendance sheet and match it against a roster
    Attendance {
        /// Photographed or scanned attendance sheet
        file: PathBuf,
        /// Roster JSON file: [{"id", "registrationNumber", "name"}]
        #[arg(short, long)]
        roster: PathBuf,
        /// Skip the language model and use the regex parser only
        #[arg(long)]
        no_ai: bool,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
        #[command(flatten)]
        metadata: MetadataArgs,
    },

    /// List recent validation events
    Events {
        /// Number of events to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

async fn load_config(path: Option<PathBuf>, db: Option<PathBuf>) -> anyhow::Result<Config> {
    let mut config = match path {
        Some(path) => Config::load_from_path(&path)
            .await
            .map_err(|e| anyhow::anyhow!("{}: {}", path.display(), e))?,
        None => Config::load().await,
    };
    if let Some(db) = db {
        config.events.database = Some(db);
    }
    if let Some(source) = &config.source_path {
        tracing::info!("Loaded config from {}", source.display());
    }
    Ok(config)
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(cli.config, cli.db).await?;

    match cli.command {
        Commands::Extract {
            files,
            json,
            metadata,
        } => extract::cmd_extract(&config, &files, &metadata, json).await,
        Commands::Attendance {
            file,
            roster,
            no_ai,
            json,
            metadata,
        } => attendance::cmd_attendance(&config, &file, &roster, &metadata, no_ai, json).await,
        Commands::Events { limit, json } => events::cmd_events(&config, limit, json).await,
    }
}
