//! micloud command-line entry point.

mod commands;
mod config;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "micloud")]
#[command(about = "Upload, download and browse files on the Mi Cloud drive")]
#[command(version)]
struct Cli {
    /// Configuration file (defaults to the per-user location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Upload a local file
    Upload {
        path: PathBuf,
        /// Destination folder id
        #[arg(long)]
        parent: Option<String>,
    },
    /// Download a file's content
    Download {
        id: String,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the public download link of a file
    Url { id: String },
    /// List a folder (the root by default)
    Ls { folder: Option<String> },
    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so downloads can be piped.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let path = cli.config.unwrap_or_else(config::default_path);
    let mut config = config::Config::load(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;
    config.apply_env();
    tracing::debug!(path = %path.display(), "configuration loaded");

    if let Command::Config = cli.command {
        print!("{}", commands::describe_config(&path, &config));
        return Ok(());
    }

    let client = commands::connect(&config)?;
    match cli.command {
        Command::Upload { path, parent } => {
            let parent = parent.unwrap_or_else(|| config.default_parent_id.clone());
            commands::upload(&client, &path, &parent).await
        }
        Command::Download { id, output } => commands::download(&client, &id, output.as_deref()).await,
        Command::Url { id } => commands::url(&client, &id).await,
        Command::Ls { folder } => {
            let folder = folder.unwrap_or_else(|| micloud_drive::ROOT_FOLDER_ID.to_string());
            commands::list(&client, &folder).await
        }
        Command::Config => Ok(()),
    }
}
