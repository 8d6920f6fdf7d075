//! tailsync CLI - keeps Tailwind @source directives in sync across a monorepo.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod config;

use config::Workspace;

#[derive(Parser)]
#[command(name = "tailsync")]
#[command(about = "Sync Tailwind @source directives with workspace dependencies")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root
    #[arg(short, long, default_value = ".")]
    root: PathBuf,

    /// Path to tailsync.toml, relative to the workspace root
    #[arg(short, long, default_value = "tailsync.toml")]
    config: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Update @source directives in application stylesheets
    Sync {
        /// Only sync this application (apps/<name>)
        #[arg(short, long)]
        project: Option<String>,

        /// Report changes without writing them
        #[arg(long)]
        dry_run: bool,
    },

    /// Fail if any application stylesheet is out of sync
    Check,

    /// Sync, then re-sync whenever manifests or packages change
    Watch,

    /// Create a tailsync.toml with default settings
    Init {
        /// Overwrite an existing config file
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt().with_env_filter(filter).with_target(false).init();

    match cli.command {
        Commands::Sync { project, dry_run } => {
            let workspace = Workspace::load(&cli.root, &cli.config)?;
            commands::sync::run(&workspace, project, dry_run).await?;
        }
        Commands::Check => {
            let workspace = Workspace::load(&cli.root, &cli.config)?;
            commands::check::run(&workspace).await?;
        }
        Commands::Watch => {
            let workspace = Workspace::load(&cli.root, &cli.config)?;
            commands::watch::run(&workspace).await?;
        }
        Commands::Init { yes } => {
            commands::init::run(&cli.root, &cli.config, yes).await?;
        }
    }

    Ok(())
}
